//! No-op embedding provider.
//!
//! Returns zero vectors of the configured dimension. Useful for wiring tests
//! and for running the engine keyword-only without a model backend.

use futures::future::BoxFuture;

use crate::embed::EmbeddingProvider;
use crate::errors::SearchError;

/// Provider that emits zero vectors.
pub struct NoopEmbedder {
    dim: usize,
}

impl NoopEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl EmbeddingProvider for NoopEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed<'a>(&'a self, _text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, SearchError>> {
        Box::pin(async move { Ok(vec![0.0; self.dim]) })
    }
}
