use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, Result, SmartyService, time_serde};
use smarty_domain::writegate::{self, NoteInput};
use smarty_storage::models::{Note, NoteChanges, NoteWithCategory};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateNoteRequest {
	pub owner_id: String,
	pub title: String,
	pub content: Option<String>,
	pub category_id: Option<Uuid>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpdateNoteRequest {
	pub note_id: Uuid,
	pub owner_id: String,
	pub title: String,
	pub content: Option<String>,
	pub category_id: Option<Uuid>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeleteNoteRequest {
	pub note_id: Uuid,
	pub owner_id: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NoteView {
	pub note_id: Uuid,
	pub owner_id: String,
	pub title: String,
	pub content: Option<String>,
	pub category_id: Option<Uuid>,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
}
impl From<Note> for NoteView {
	fn from(note: Note) -> Self {
		Self {
			note_id: note.note_id,
			owner_id: note.owner_id,
			title: note.title,
			content: note.content,
			category_id: note.category_id,
			created_at: note.created_at,
			updated_at: note.updated_at,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NoteListItem {
	#[serde(flatten)]
	pub note: NoteView,
	pub category_name: Option<String>,
}
impl From<NoteWithCategory> for NoteListItem {
	fn from(row: NoteWithCategory) -> Self {
		Self { note: row.note.into(), category_name: row.category_name }
	}
}

impl SmartyService {
	/// Persists a note and returns it before its embedding exists.
	pub async fn create_note(&self, req: CreateNoteRequest) -> Result<NoteView> {
		writegate::note(&NoteInput { owner_id: &req.owner_id, title: &req.title })?;

		let now = time_serde::now();
		let note = Note {
			note_id: Uuid::new_v4(),
			owner_id: req.owner_id.trim().to_string(),
			title: req.title.trim().to_string(),
			content: normalize_content(req.content),
			category_id: req.category_id,
			created_at: now,
			updated_at: now,
		};
		let note = self.backends.store.create(&note).await?;

		tracing::info!(note_id = %note.note_id, owner_id = %note.owner_id, "Note created.");

		self.spawn_enrichment(&note);

		Ok(note.into())
	}

	pub async fn update_note(&self, req: UpdateNoteRequest) -> Result<NoteView> {
		writegate::note(&NoteInput { owner_id: &req.owner_id, title: &req.title })?;

		self.owned_note(req.note_id, &req.owner_id).await?;

		let changes = NoteChanges {
			title: req.title.trim().to_string(),
			content: normalize_content(req.content),
			category_id: req.category_id,
			updated_at: time_serde::now(),
		};
		let note = self
			.backends
			.store
			.update(req.note_id, &changes)
			.await?
			.ok_or_else(note_not_found)?;

		tracing::info!(note_id = %note.note_id, "Note updated.");

		self.spawn_enrichment(&note);

		Ok(note.into())
	}

	/// Removes the row and its vector together. The row survives when the vector delete fails.
	pub async fn delete_note(&self, req: DeleteNoteRequest) -> Result<()> {
		self.owned_note(req.note_id, &req.owner_id).await?;

		let index = self.backends.index.as_ref();

		self.backends.store.delete_with(req.note_id, index.delete_one(req.note_id)).await?;

		tracing::info!(note_id = %req.note_id, "Note deleted.");

		Ok(())
	}

	pub async fn get_note(&self, note_id: Uuid, owner_id: &str) -> Result<NoteView> {
		Ok(self.owned_note(note_id, owner_id).await?.into())
	}

	pub async fn list_notes(&self, owner_id: &str) -> Result<Vec<NoteListItem>> {
		let owner_id = writegate::owner(owner_id)?;
		let rows = self.backends.store.list_by_owner(owner_id).await?;

		Ok(rows.into_iter().map(NoteListItem::from).collect())
	}

	/// Loads a note and checks that `owner_id` owns it. Missing notes win over ownership.
	async fn owned_note(&self, note_id: Uuid, owner_id: &str) -> Result<Note> {
		let owner_id = writegate::owner(owner_id)?;
		let note = self.backends.store.find_by_id(note_id).await?.ok_or_else(note_not_found)?;

		if note.owner_id != owner_id {
			return Err(Error::Unauthorized {
				message: "Note belongs to another owner.".to_string(),
			});
		}

		Ok(note)
	}
}

fn note_not_found() -> Error {
	Error::NotFound { message: "Note not found.".to_string() }
}

fn normalize_content(content: Option<String>) -> Option<String> {
	content.map(|text| text.trim().to_string()).filter(|text| !text.is_empty())
}
