//! In-process stand-ins for Postgres and Qdrant.

use std::{
	collections::HashMap,
	sync::{
		Mutex, MutexGuard,
		atomic::{AtomicBool, AtomicUsize, Ordering},
	},
};

use uuid::Uuid;

use smarty_service::{BoxFuture, Error, NoteStore, Result, VectorIndex};
use smarty_storage::{
	models::{Category, Note, NoteChanges, NoteWithCategory},
	qdrant::VectorMatch,
};

#[derive(Default)]
struct StoreState {
	notes: HashMap<Uuid, Note>,
	categories: HashMap<Uuid, Category>,
}

/// Note store with the same transactional delete contract as the Postgres one.
#[derive(Default)]
pub struct MemoryNoteStore {
	state: Mutex<StoreState>,
	fail_commit: AtomicBool,
	category_lists: AtomicUsize,
}
impl MemoryNoteStore {
	pub fn note(&self, note_id: Uuid) -> Option<Note> {
		self.state().notes.get(&note_id).cloned()
	}

	pub fn note_count(&self) -> usize {
		self.state().notes.len()
	}

	/// Makes the next delete fail at commit, after `before_commit` has already succeeded.
	pub fn fail_next_commit(&self) {
		self.fail_commit.store(true, Ordering::SeqCst);
	}

	/// How many times the category list was read from the store.
	pub fn category_list_calls(&self) -> usize {
		self.category_lists.load(Ordering::SeqCst)
	}

	fn state(&self) -> MutexGuard<'_, StoreState> {
		self.state.lock().unwrap_or_else(|err| err.into_inner())
	}
}
impl NoteStore for MemoryNoteStore {
	fn create<'a>(&'a self, note: &'a Note) -> BoxFuture<'a, Result<Note>> {
		Box::pin(async move {
			self.state().notes.insert(note.note_id, note.clone());

			Ok(note.clone())
		})
	}

	fn find_by_id<'a>(&'a self, note_id: Uuid) -> BoxFuture<'a, Result<Option<Note>>> {
		Box::pin(async move { Ok(self.note(note_id)) })
	}

	fn find_many<'a>(&'a self, note_ids: &'a [Uuid]) -> BoxFuture<'a, Result<Vec<Note>>> {
		Box::pin(async move {
			let state = self.state();

			Ok(note_ids.iter().filter_map(|id| state.notes.get(id).cloned()).collect())
		})
	}

	fn update<'a>(
		&'a self,
		note_id: Uuid,
		changes: &'a NoteChanges,
	) -> BoxFuture<'a, Result<Option<Note>>> {
		Box::pin(async move {
			let mut state = self.state();
			let Some(note) = state.notes.get_mut(&note_id) else {
				return Ok(None);
			};

			note.title = changes.title.clone();
			note.content = changes.content.clone();
			note.category_id = changes.category_id;
			note.updated_at = changes.updated_at;

			Ok(Some(note.clone()))
		})
	}

	fn delete_with<'a>(
		&'a self,
		note_id: Uuid,
		before_commit: BoxFuture<'a, Result<()>>,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			if !self.state().notes.contains_key(&note_id) {
				return Err(Error::NotFound { message: "Note not found.".to_string() });
			}

			// Nothing is removed until the callback succeeds, which is what a rollback leaves.
			before_commit.await?;

			if self.fail_commit.swap(false, Ordering::SeqCst) {
				return Err(Error::Storage { message: "Commit failed.".to_string() });
			}

			self.state().notes.remove(&note_id);

			Ok(())
		})
	}

	fn list_by_owner<'a>(
		&'a self,
		owner_id: &'a str,
	) -> BoxFuture<'a, Result<Vec<NoteWithCategory>>> {
		Box::pin(async move {
			let state = self.state();
			let mut rows = state
				.notes
				.values()
				.filter(|note| note.owner_id == owner_id)
				.map(|note| NoteWithCategory {
					note: note.clone(),
					category_name: note
						.category_id
						.and_then(|id| state.categories.get(&id))
						.map(|category| category.name.clone()),
				})
				.collect::<Vec<_>>();

			rows.sort_by(|a, b| {
				a.note.created_at.cmp(&b.note.created_at).then(a.note.note_id.cmp(&b.note.note_id))
			});

			Ok(rows)
		})
	}

	fn create_category<'a>(&'a self, category: &'a Category) -> BoxFuture<'a, Result<Category>> {
		Box::pin(async move {
			self.state().categories.insert(category.category_id, category.clone());

			Ok(category.clone())
		})
	}

	fn list_categories<'a>(&'a self) -> BoxFuture<'a, Result<Vec<Category>>> {
		Box::pin(async move {
			self.category_lists.fetch_add(1, Ordering::SeqCst);

			let mut categories = self.state().categories.values().cloned().collect::<Vec<_>>();

			categories.sort_by(|a, b| a.name.cmp(&b.name));

			Ok(categories)
		})
	}

	fn find_category<'a>(
		&'a self,
		category_id: Uuid,
	) -> BoxFuture<'a, Result<Option<Category>>> {
		Box::pin(async move { Ok(self.state().categories.get(&category_id).cloned()) })
	}

	fn delete_category<'a>(&'a self, category_id: Uuid) -> BoxFuture<'a, Result<bool>> {
		Box::pin(async move { Ok(self.state().categories.remove(&category_id).is_some()) })
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct StoredPoint {
	pub vector: Vec<f32>,
	pub owner_id: String,
}

/// Exact cosine search over a hash map, with switches to make writes fail.
#[derive(Default)]
pub struct MemoryVectorIndex {
	points: Mutex<HashMap<Uuid, StoredPoint>>,
	fail_upserts: AtomicBool,
	fail_deletes: AtomicBool,
	upserts: AtomicUsize,
}
impl MemoryVectorIndex {
	pub fn point(&self, note_id: Uuid) -> Option<StoredPoint> {
		self.points().get(&note_id).cloned()
	}

	pub fn len(&self) -> usize {
		self.points().len()
	}

	pub fn is_empty(&self) -> bool {
		self.points().is_empty()
	}

	pub fn upsert_calls(&self) -> usize {
		self.upserts.load(Ordering::SeqCst)
	}

	pub fn set_fail_upserts(&self, fail: bool) {
		self.fail_upserts.store(fail, Ordering::SeqCst);
	}

	pub fn set_fail_deletes(&self, fail: bool) {
		self.fail_deletes.store(fail, Ordering::SeqCst);
	}

	fn points(&self) -> MutexGuard<'_, HashMap<Uuid, StoredPoint>> {
		self.points.lock().unwrap_or_else(|err| err.into_inner())
	}
}
impl VectorIndex for MemoryVectorIndex {
	fn upsert<'a>(
		&'a self,
		note_id: Uuid,
		vector: Vec<f32>,
		owner_id: &'a str,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			self.upserts.fetch_add(1, Ordering::SeqCst);

			if self.fail_upserts.load(Ordering::SeqCst) {
				return Err(Error::VectorIndex { message: "Upsert rejected.".to_string() });
			}

			self.points().insert(note_id, StoredPoint { vector, owner_id: owner_id.to_string() });

			Ok(())
		})
	}

	fn delete_one<'a>(&'a self, note_id: Uuid) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			if self.fail_deletes.load(Ordering::SeqCst) {
				return Err(Error::VectorIndex { message: "Delete rejected.".to_string() });
			}

			self.points().remove(&note_id);

			Ok(())
		})
	}

	fn query<'a>(
		&'a self,
		vector: Vec<f32>,
		top_k: u32,
		owner_id: &'a str,
	) -> BoxFuture<'a, Result<Vec<VectorMatch>>> {
		Box::pin(async move {
			let mut matches = self
				.points()
				.iter()
				.filter(|(_, point)| point.owner_id == owner_id)
				.map(|(note_id, point)| VectorMatch {
					note_id: *note_id,
					score: cosine(&vector, &point.vector),
					owner_id: Some(point.owner_id.clone()),
				})
				.collect::<Vec<_>>();

			matches.sort_by(|a, b| b.score.total_cmp(&a.score));
			matches.truncate(top_k as usize);

			Ok(matches)
		})
	}
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
	let dot = a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>();
	let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
	let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

	if norm_a == 0.0 || norm_b == 0.0 { 0.0 } else { dot / (norm_a * norm_b) }
}
