//! OpenAI-compatible embedding provider (hosted inference API).
//!
//! POST `{endpoint}/v1/embeddings` with bearer authentication. Unlike the
//! Ollama backend this endpoint embeds whole batches in one round trip, so
//! [`EmbeddingProvider::embed_batch`] is overridden.

use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::header;
use serde::{Deserialize, Serialize};

use crate::config::EmbeddingConfig;
use crate::embed::EmbeddingProvider;
use crate::errors::SearchError;

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingsItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsItem {
    index: usize,
    embedding: Vec<f32>,
}

/// Hosted OpenAI-compatible embedding backend.
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    url: String,
    model: String,
    dim: usize,
}

impl OpenAiEmbedder {
    /// Construct a new embedder from configuration.
    ///
    /// # Errors
    /// - `SearchError::InvalidConfig` if no API key is configured
    /// - `SearchError::Embedding` if the HTTP client cannot be built
    pub fn new(cfg: &EmbeddingConfig) -> Result<Self, SearchError> {
        let key = cfg.api_key.as_deref().ok_or_else(|| {
            SearchError::InvalidConfig("EMBEDDING_API_KEY is required for the openai provider".into())
        })?;

        let mut headers = header::HeaderMap::new();
        let mut auth = header::HeaderValue::from_str(&format!("Bearer {key}"))
            .map_err(|e| SearchError::InvalidConfig(format!("invalid api key: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|e| SearchError::Embedding(format!("http client build: {e}")))?;

        Ok(Self {
            client,
            url: format!("{}/v1/embeddings", cfg.endpoint.trim_end_matches('/')),
            model: cfg.model.clone(),
            dim: cfg.dim,
        })
    }

    async fn request(&self, input: &[String]) -> Result<Vec<Vec<f32>>, SearchError> {
        let body = EmbeddingsRequest {
            model: &self.model,
            input,
        };

        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| SearchError::Embedding(format!("POST {}: {e}", self.url)))?;

        if !resp.status().is_success() {
            let code = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(SearchError::Embedding(format!(
                "embeddings endpoint non-success: {code}; body: {text}"
            )));
        }

        let out: EmbeddingsResponse = resp
            .json()
            .await
            .map_err(|e| SearchError::Embedding(format!("parse embeddings json: {e}")))?;

        if out.data.len() != input.len() {
            return Err(SearchError::Embedding(format!(
                "embeddings response has {} items for {} inputs",
                out.data.len(),
                input.len()
            )));
        }

        // The API may return items out of order; `index` is authoritative.
        let mut items = out.data;
        items.sort_by_key(|item| item.index);

        let mut vectors = Vec::with_capacity(items.len());
        for item in items {
            if item.embedding.len() != self.dim {
                return Err(SearchError::DimensionMismatch {
                    got: item.embedding.len(),
                    want: self.dim,
                });
            }
            vectors.push(item.embedding);
        }
        Ok(vectors)
    }
}

impl EmbeddingProvider for OpenAiEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, SearchError>> {
        Box::pin(async move {
            let input = [text.to_string()];
            let mut vectors = self.request(&input).await?;
            vectors
                .pop()
                .ok_or_else(|| SearchError::Embedding("empty embeddings response".into()))
        })
    }

    fn embed_batch<'a>(
        &'a self,
        texts: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<Vec<f32>>, SearchError>> {
        Box::pin(async move {
            if texts.is_empty() {
                return Ok(Vec::new());
            }
            self.request(texts).await
        })
    }
}
