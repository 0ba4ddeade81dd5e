use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::{
	Result,
	db::Db,
	models::{Category, Note, NoteChanges, NoteWithCategory},
};

const NOTE_COLUMNS: &str =
	"note_id, owner_id, title, content, category_id, created_at, updated_at";

pub async fn insert_note(db: &Db, note: &Note) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO notes (
	note_id,
	owner_id,
	title,
	content,
	category_id,
	created_at,
	updated_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7)",
	)
	.bind(note.note_id)
	.bind(note.owner_id.as_str())
	.bind(note.title.as_str())
	.bind(note.content.as_deref())
	.bind(note.category_id)
	.bind(note.created_at)
	.bind(note.updated_at)
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn fetch_note(db: &Db, note_id: Uuid) -> Result<Option<Note>> {
	let sql = format!("SELECT {NOTE_COLUMNS} FROM notes WHERE note_id = $1");
	let note = sqlx::query_as::<_, Note>(&sql).bind(note_id).fetch_optional(&db.pool).await?;

	Ok(note)
}

pub async fn fetch_notes(db: &Db, note_ids: &[Uuid]) -> Result<Vec<Note>> {
	let sql = format!("SELECT {NOTE_COLUMNS} FROM notes WHERE note_id = ANY($1)");
	let notes = sqlx::query_as::<_, Note>(&sql).bind(note_ids).fetch_all(&db.pool).await?;

	Ok(notes)
}

/// Applies `changes` and returns the stored row, or `None` when the note no longer exists.
pub async fn update_note(db: &Db, note_id: Uuid, changes: &NoteChanges) -> Result<Option<Note>> {
	let sql = format!(
		"\
UPDATE notes
SET
	title = $1,
	content = $2,
	category_id = $3,
	updated_at = $4
WHERE note_id = $5
RETURNING {NOTE_COLUMNS}"
	);
	let note = sqlx::query_as::<_, Note>(&sql)
		.bind(changes.title.as_str())
		.bind(changes.content.as_deref())
		.bind(changes.category_id)
		.bind(changes.updated_at)
		.bind(note_id)
		.fetch_optional(&db.pool)
		.await?;

	Ok(note)
}

/// Deletes a note inside `tx`. Returns whether a row was removed.
pub async fn delete_note_tx(tx: &mut Transaction<'_, Postgres>, note_id: Uuid) -> Result<bool> {
	let result =
		sqlx::query("DELETE FROM notes WHERE note_id = $1").bind(note_id).execute(&mut **tx).await?;

	Ok(result.rows_affected() > 0)
}

pub async fn list_notes_by_owner(db: &Db, owner_id: &str) -> Result<Vec<NoteWithCategory>> {
	let notes = sqlx::query_as::<_, NoteWithCategory>(
		"\
SELECT
	n.note_id,
	n.owner_id,
	n.title,
	n.content,
	n.category_id,
	n.created_at,
	n.updated_at,
	c.name AS category_name
FROM notes n
LEFT JOIN categories c ON c.category_id = n.category_id
WHERE n.owner_id = $1
ORDER BY n.created_at ASC, n.note_id ASC",
	)
	.bind(owner_id)
	.fetch_all(&db.pool)
	.await?;

	Ok(notes)
}

pub async fn insert_category(db: &Db, category: &Category) -> Result<()> {
	sqlx::query("INSERT INTO categories (category_id, name, created_at) VALUES ($1, $2, $3)")
		.bind(category.category_id)
		.bind(category.name.as_str())
		.bind(category.created_at)
		.execute(&db.pool)
		.await?;

	Ok(())
}

pub async fn list_categories(db: &Db) -> Result<Vec<Category>> {
	let categories = sqlx::query_as::<_, Category>(
		"SELECT category_id, name, created_at FROM categories ORDER BY name ASC, category_id ASC",
	)
	.fetch_all(&db.pool)
	.await?;

	Ok(categories)
}

pub async fn fetch_category(db: &Db, category_id: Uuid) -> Result<Option<Category>> {
	let category = sqlx::query_as::<_, Category>(
		"SELECT category_id, name, created_at FROM categories WHERE category_id = $1",
	)
	.bind(category_id)
	.fetch_optional(&db.pool)
	.await?;

	Ok(category)
}

/// Deletes a category without touching notes that reference it.
pub async fn delete_category(db: &Db, category_id: Uuid) -> Result<bool> {
	let result = sqlx::query("DELETE FROM categories WHERE category_id = $1")
		.bind(category_id)
		.execute(&db.pool)
		.await?;

	Ok(result.rows_affected() > 0)
}
