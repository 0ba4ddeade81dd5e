//! Production collaborators: Postgres for notes, Qdrant for vectors, HTTP for embeddings.

use reqwest::Client;
use uuid::Uuid;

use crate::{BoxFuture, EmbeddingProvider, Error, NoteStore, Result, VectorIndex};
use smarty_config::EmbeddingProviderConfig;
use smarty_providers::embedding;
use smarty_storage::{
	db::Db,
	models::{Category, Note, NoteChanges, NoteWithCategory},
	qdrant::{QdrantStore, VectorMatch},
	queries,
};

#[derive(Default)]
pub struct DefaultEmbedding {
	client: Client,
}

impl NoteStore for Db {
	fn create<'a>(&'a self, note: &'a Note) -> BoxFuture<'a, Result<Note>> {
		Box::pin(async move {
			queries::insert_note(self, note).await?;

			Ok(note.clone())
		})
	}

	fn find_by_id<'a>(&'a self, note_id: Uuid) -> BoxFuture<'a, Result<Option<Note>>> {
		Box::pin(async move { Ok(queries::fetch_note(self, note_id).await?) })
	}

	fn find_many<'a>(&'a self, note_ids: &'a [Uuid]) -> BoxFuture<'a, Result<Vec<Note>>> {
		Box::pin(async move { Ok(queries::fetch_notes(self, note_ids).await?) })
	}

	fn update<'a>(
		&'a self,
		note_id: Uuid,
		changes: &'a NoteChanges,
	) -> BoxFuture<'a, Result<Option<Note>>> {
		Box::pin(async move { Ok(queries::update_note(self, note_id, changes).await?) })
	}

	fn delete_with<'a>(
		&'a self,
		note_id: Uuid,
		before_commit: BoxFuture<'a, Result<()>>,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut tx = self.pool.begin().await?;

			if !queries::delete_note_tx(&mut tx, note_id).await? {
				return Err(Error::NotFound { message: "Note not found.".to_string() });
			}
			if let Err(err) = before_commit.await {
				if let Err(rollback_err) = tx.rollback().await {
					tracing::error!(
						note_id = %note_id,
						error = %rollback_err,
						"Failed to roll back note delete."
					);
				}

				tracing::warn!(note_id = %note_id, error = %err, "Note delete rolled back.");

				return Err(err);
			}
			// The vector is already gone here; a failed commit leaves the row without its vector.
			if let Err(err) = tx.commit().await {
				tracing::error!(
					note_id = %note_id,
					error = %err,
					"Note delete commit failed after its vector was removed."
				);

				return Err(err.into());
			}

			Ok(())
		})
	}

	fn list_by_owner<'a>(
		&'a self,
		owner_id: &'a str,
	) -> BoxFuture<'a, Result<Vec<NoteWithCategory>>> {
		Box::pin(async move { Ok(queries::list_notes_by_owner(self, owner_id).await?) })
	}

	fn create_category<'a>(&'a self, category: &'a Category) -> BoxFuture<'a, Result<Category>> {
		Box::pin(async move {
			queries::insert_category(self, category).await?;

			Ok(category.clone())
		})
	}

	fn list_categories<'a>(&'a self) -> BoxFuture<'a, Result<Vec<Category>>> {
		Box::pin(async move { Ok(queries::list_categories(self).await?) })
	}

	fn find_category<'a>(
		&'a self,
		category_id: Uuid,
	) -> BoxFuture<'a, Result<Option<Category>>> {
		Box::pin(async move { Ok(queries::fetch_category(self, category_id).await?) })
	}

	fn delete_category<'a>(&'a self, category_id: Uuid) -> BoxFuture<'a, Result<bool>> {
		Box::pin(async move { Ok(queries::delete_category(self, category_id).await?) })
	}
}

impl VectorIndex for QdrantStore {
	fn upsert<'a>(
		&'a self,
		note_id: Uuid,
		vector: Vec<f32>,
		owner_id: &'a str,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			self.upsert_note(note_id, vector, owner_id).await.map_err(vector_index_error)
		})
	}

	fn delete_one<'a>(&'a self, note_id: Uuid) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move { self.delete_note(note_id).await.map_err(vector_index_error) })
	}

	fn query<'a>(
		&'a self,
		vector: Vec<f32>,
		top_k: u32,
		owner_id: &'a str,
	) -> BoxFuture<'a, Result<Vec<VectorMatch>>> {
		Box::pin(async move {
			self.query_notes(vector, top_k, owner_id).await.map_err(vector_index_error)
		})
	}
}

impl EmbeddingProvider for DefaultEmbedding {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		text: &'a str,
	) -> BoxFuture<'a, Result<Vec<f32>>> {
		Box::pin(async move { Ok(embedding::embed_one(&self.client, cfg, text).await?) })
	}
}

// Every failure inside the index client, including argument checks, is an index failure to callers.
fn vector_index_error(err: smarty_storage::Error) -> Error {
	Error::VectorIndex { message: err.to_string() }
}
