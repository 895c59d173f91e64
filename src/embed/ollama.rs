//! Ollama embedding provider.
//!
//! Calls a locally-resident Ollama server's `/api/embeddings` endpoint with
//! one request per text. The response dimension is verified against the
//! configured collection dimension on every call.

use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::config::EmbeddingConfig;
use crate::embed::EmbeddingProvider;
use crate::errors::SearchError;

#[derive(Debug, Serialize)]
struct OllamaEmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct OllamaEmbedResponse {
    embedding: Vec<f32>,
}

/// Ollama embedding backend.
pub struct OllamaEmbedder {
    client: reqwest::Client,
    url: String,
    model: String,
    dim: usize,
}

impl OllamaEmbedder {
    /// Construct a new embedder from configuration.
    ///
    /// # Errors
    /// Returns `SearchError::Embedding` if the HTTP client cannot be built.
    pub fn new(cfg: &EmbeddingConfig) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|e| SearchError::Embedding(format!("http client build: {e}")))?;

        Ok(Self {
            client,
            url: format!("{}/api/embeddings", cfg.endpoint.trim_end_matches('/')),
            model: cfg.model.clone(),
            dim: cfg.dim,
        })
    }
}

impl EmbeddingProvider for OllamaEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, SearchError>> {
        Box::pin(async move {
            let req = OllamaEmbedRequest {
                model: &self.model,
                prompt: text,
            };

            let resp = self
                .client
                .post(&self.url)
                .json(&req)
                .send()
                .await
                .map_err(|e| SearchError::Embedding(format!("POST {}: {e}", self.url)))?;

            if resp.status() != StatusCode::OK {
                let code = resp.status();
                let body = resp
                    .text()
                    .await
                    .unwrap_or_else(|_| "<failed to read body>".into());
                return Err(SearchError::Embedding(format!(
                    "ollama embeddings non-200: {code}; body: {body}"
                )));
            }

            let parsed: OllamaEmbedResponse = resp
                .json()
                .await
                .map_err(|e| SearchError::Embedding(format!("parse embeddings json: {e}")))?;

            if parsed.embedding.len() != self.dim {
                return Err(SearchError::DimensionMismatch {
                    got: parsed.embedding.len(),
                    want: self.dim,
                });
            }

            Ok(parsed.embedding)
        })
    }
}
