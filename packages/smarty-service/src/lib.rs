pub mod cache;
pub mod categories;
pub mod enrichment;
pub mod notes;
pub mod search;
pub mod time_serde;

mod backends;
mod error;

pub use backends::DefaultEmbedding;
pub use categories::{CategoryView, CreateCategoryRequest, DeleteCategoryRequest};
pub use error::{Error, Result};
pub use notes::{CreateNoteRequest, DeleteNoteRequest, NoteListItem, NoteView, UpdateNoteRequest};
pub use search::{SearchHit, SearchRequest};

use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use uuid::Uuid;

use smarty_config::{Config, EmbeddingProviderConfig};
use smarty_storage::{
	db::Db,
	models::{Category, Note, NoteChanges, NoteWithCategory},
	qdrant::{QdrantStore, VectorMatch},
};

use crate::cache::TtlCache;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Relational persistence for notes and categories.
pub trait NoteStore
where
	Self: Send + Sync,
{
	fn create<'a>(&'a self, note: &'a Note) -> BoxFuture<'a, Result<Note>>;

	fn find_by_id<'a>(&'a self, note_id: Uuid) -> BoxFuture<'a, Result<Option<Note>>>;

	fn find_many<'a>(&'a self, note_ids: &'a [Uuid]) -> BoxFuture<'a, Result<Vec<Note>>>;

	/// Returns `None` when the note no longer exists.
	fn update<'a>(
		&'a self,
		note_id: Uuid,
		changes: &'a NoteChanges,
	) -> BoxFuture<'a, Result<Option<Note>>>;

	/// Deletes the row and awaits `before_commit` inside the same transaction. The transaction
	/// commits only when `before_commit` succeeds; otherwise it rolls back and the error is
	/// returned unchanged. A missing row fails with `NotFound` without running `before_commit`.
	fn delete_with<'a>(
		&'a self,
		note_id: Uuid,
		before_commit: BoxFuture<'a, Result<()>>,
	) -> BoxFuture<'a, Result<()>>;

	/// Notes of one owner ordered by creation time, oldest first.
	fn list_by_owner<'a>(
		&'a self,
		owner_id: &'a str,
	) -> BoxFuture<'a, Result<Vec<NoteWithCategory>>>;

	fn create_category<'a>(&'a self, category: &'a Category) -> BoxFuture<'a, Result<Category>>;

	fn list_categories<'a>(&'a self) -> BoxFuture<'a, Result<Vec<Category>>>;

	fn find_category<'a>(
		&'a self,
		category_id: Uuid,
	) -> BoxFuture<'a, Result<Option<Category>>>;

	/// Returns `false` when no category had that id.
	fn delete_category<'a>(&'a self, category_id: Uuid) -> BoxFuture<'a, Result<bool>>;
}

/// Similarity index holding one vector per note, tagged with the note owner.
pub trait VectorIndex
where
	Self: Send + Sync,
{
	fn upsert<'a>(
		&'a self,
		note_id: Uuid,
		vector: Vec<f32>,
		owner_id: &'a str,
	) -> BoxFuture<'a, Result<()>>;

	/// Deleting a point that does not exist succeeds.
	fn delete_one<'a>(&'a self, note_id: Uuid) -> BoxFuture<'a, Result<()>>;

	/// Nearest points owned by `owner_id`, best match first.
	fn query<'a>(
		&'a self,
		vector: Vec<f32>,
		top_k: u32,
		owner_id: &'a str,
	) -> BoxFuture<'a, Result<Vec<VectorMatch>>>;
}

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		text: &'a str,
	) -> BoxFuture<'a, Result<Vec<f32>>>;
}

#[derive(Clone)]
pub struct Backends {
	pub store: Arc<dyn NoteStore>,
	pub index: Arc<dyn VectorIndex>,
	pub embedding: Arc<dyn EmbeddingProvider>,
}
impl Backends {
	pub fn new(
		store: Arc<dyn NoteStore>,
		index: Arc<dyn VectorIndex>,
		embedding: Arc<dyn EmbeddingProvider>,
	) -> Self {
		Self { store, index, embedding }
	}
}

pub struct SmartyService {
	pub cfg: Arc<Config>,
	pub backends: Backends,
	categories: TtlCache<Vec<Category>>,
}
impl SmartyService {
	pub fn new(cfg: Config, db: Db, qdrant: QdrantStore) -> Self {
		let backends =
			Backends::new(Arc::new(db), Arc::new(qdrant), Arc::new(DefaultEmbedding::default()));

		Self::with_backends(cfg, backends)
	}

	pub fn with_backends(cfg: Config, backends: Backends) -> Self {
		let categories = TtlCache::new(Duration::from_secs(cfg.categories.cache_ttl_secs));

		Self { cfg: Arc::new(cfg), backends, categories }
	}
}
