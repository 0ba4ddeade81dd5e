use std::hash::{DefaultHasher, Hash, Hasher};

use smarty_config::EmbeddingProviderConfig;
use smarty_service::{BoxFuture, EmbeddingProvider, Error, Result};

/// Deterministic bag-of-words embedding. Equal texts embed to equal vectors.
pub struct HashEmbedding {
	dim: usize,
}
impl HashEmbedding {
	pub fn new(dim: usize) -> Self {
		Self { dim: dim.max(1) }
	}

	pub fn vector_for(&self, text: &str) -> Vec<f32> {
		let mut vector = vec![0.0; self.dim];

		for token in text.split_whitespace() {
			let mut hasher = DefaultHasher::new();

			token.to_lowercase().hash(&mut hasher);

			vector[(hasher.finish() % self.dim as u64) as usize] += 1.0;
		}

		vector
	}
}
impl EmbeddingProvider for HashEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		text: &'a str,
	) -> BoxFuture<'a, Result<Vec<f32>>> {
		let vector = self.vector_for(text);

		Box::pin(async move { Ok(vector) })
	}
}

/// An embedding provider that is always down.
pub struct FailingEmbedding;
impl EmbeddingProvider for FailingEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		_text: &'a str,
	) -> BoxFuture<'a, Result<Vec<f32>>> {
		Box::pin(async move {
			Err(Error::EmbeddingUnavailable { message: "Embedding provider is down.".to_string() })
		})
	}
}
