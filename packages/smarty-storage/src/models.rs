use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Note {
	pub note_id: Uuid,
	pub owner_id: String,
	pub title: String,
	pub content: Option<String>,
	pub category_id: Option<Uuid>,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}

/// A note joined with its category name. The name is `None` for uncategorized notes and for
/// notes whose category has since been deleted.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct NoteWithCategory {
	#[sqlx(flatten)]
	pub note: Note,
	pub category_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Category {
	pub category_id: Uuid,
	pub name: String,
	pub created_at: OffsetDateTime,
}

/// Fields a caller may change on an existing note.
#[derive(Debug, Clone)]
pub struct NoteChanges {
	pub title: String,
	pub content: Option<String>,
	pub category_id: Option<Uuid>,
	pub updated_at: OffsetDateTime,
}
