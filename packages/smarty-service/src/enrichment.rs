//! Best-effort background enrichment.
//!
//! Each note write spawns one detached task that embeds the note text and upserts the vector.
//! Tasks are never joined, cancelled, retried, or deduplicated; the last upsert to finish wins.
//! Failures are logged and dropped.

use uuid::Uuid;

use crate::{Backends, Error, Result, SmartyService};
use smarty_config::Config;
use smarty_domain::embedding_text;
use smarty_storage::models::Note;

/// Everything a background task needs, detached from the request that produced it.
#[derive(Clone, Debug)]
pub struct EnrichmentJob {
	pub note_id: Uuid,
	pub owner_id: String,
	pub text: String,
}
impl EnrichmentJob {
	pub fn for_note(note: &Note) -> Self {
		Self {
			note_id: note.note_id,
			owner_id: note.owner_id.clone(),
			text: embedding_text::note_embedding_text(&note.title, note.content.as_deref()),
		}
	}
}

impl SmartyService {
	pub(crate) fn spawn_enrichment(&self, note: &Note) {
		let job = EnrichmentJob::for_note(note);
		let cfg = self.cfg.clone();
		let backends = self.backends.clone();

		tokio::spawn(async move {
			if let Err(err) = enrich(&cfg, &backends, &job).await {
				tracing::warn!(
					note_id = %job.note_id,
					error = %err,
					"Background enrichment failed."
				);
			}
		});
	}
}

/// Embeds the job text and writes it to the vector index.
pub async fn enrich(cfg: &Config, backends: &Backends, job: &EnrichmentJob) -> Result<()> {
	let vector = embed_checked(cfg, backends, &job.text).await?;

	backends.index.upsert(job.note_id, vector, &job.owner_id).await?;

	tracing::debug!(note_id = %job.note_id, "Note embedding upserted.");

	Ok(())
}

/// Embeds `text` and rejects vectors whose length differs from the index dimension.
pub(crate) async fn embed_checked(
	cfg: &Config,
	backends: &Backends,
	text: &str,
) -> Result<Vec<f32>> {
	let vector = backends.embedding.embed(&cfg.providers.embedding, text).await?;
	let expected = cfg.storage.qdrant.vector_dim as usize;

	if vector.len() != expected {
		return Err(Error::EmbeddingUnavailable {
			message: format!(
				"Embedding has {} dimensions; the index expects {expected}.",
				vector.len()
			),
		});
	}

	Ok(vector)
}
