use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, NoteView, Result, SmartyService, enrichment};
use smarty_domain::writegate;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchRequest {
	pub owner_id: String,
	pub query: String,
	pub top_k: Option<u32>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchHit {
	pub note: NoteView,
	pub score: f32,
}

impl SmartyService {
	/// Semantic search over the caller's notes.
	///
	/// Runs synchronously, so an unreachable embedding provider surfaces as
	/// [`Error::EmbeddingUnavailable`]. Hits whose note is gone or belongs to someone else are
	/// dropped.
	pub async fn search_notes(&self, req: SearchRequest) -> Result<Vec<SearchHit>> {
		let owner_id = writegate::owner(&req.owner_id)?;
		let query = writegate::query(&req.query)?;
		let top_k =
			clamp_top_k(req.top_k, self.cfg.search.default_top_k, self.cfg.search.max_top_k);
		let vector = enrichment::embed_checked(&self.cfg, &self.backends, query).await.map_err(
			|err| match err {
				Error::EmbeddingUnavailable { .. } => err,
				other => Error::EmbeddingUnavailable { message: other.to_string() },
			},
		)?;
		let matches = self.backends.index.query(vector, top_k, owner_id).await?;
		let ids = matches.iter().map(|m| m.note_id).collect::<Vec<_>>();
		let mut notes = self
			.backends
			.store
			.find_many(&ids)
			.await?
			.into_iter()
			.map(|note| (note.note_id, note))
			.collect::<HashMap<Uuid, _>>();
		let hits = matches
			.into_iter()
			.filter_map(|m| {
				let note = notes.remove(&m.note_id)?;

				(note.owner_id == owner_id).then(|| SearchHit { note: note.into(), score: m.score })
			})
			.collect::<Vec<_>>();

		tracing::debug!(owner_id, top_k, hits = hits.len(), "Note search finished.");

		Ok(hits)
	}
}

fn clamp_top_k(requested: Option<u32>, default_top_k: u32, max_top_k: u32) -> u32 {
	requested.unwrap_or(default_top_k).clamp(1, max_top_k.max(1))
}
