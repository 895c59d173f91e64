//! Embedding provider abstraction.
//!
//! Async is required because real providers (Ollama, OpenAI-compatible
//! endpoints) perform HTTP requests. The provider handle is constructed once
//! at startup and shared (`Arc<dyn EmbeddingProvider>`) by the indexer and
//! the query pipeline; there is no process-wide singleton.

use std::time::Duration;

use futures::future::BoxFuture;
use tracing::warn;

use crate::errors::SearchError;

/// Provider interface for embedding generation.
///
/// Implement this trait to plug in your own model backend. All backends
/// report a fixed output dimension at initialization; callers must tolerate
/// provider-side floating-point nondeterminism.
pub trait EmbeddingProvider: Send + Sync {
    /// Fixed output dimensionality of this backend.
    fn dim(&self) -> usize;

    /// Embed a single text.
    fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, SearchError>>;

    /// Embed a batch of texts. The default maps [`EmbeddingProvider::embed`]
    /// over the slice; backends with a native batch endpoint should override.
    fn embed_batch<'a>(
        &'a self,
        texts: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<Vec<f32>>, SearchError>> {
        Box::pin(async move {
            let mut out = Vec::with_capacity(texts.len());
            for text in texts {
                out.push(self.embed(text).await?);
            }
            Ok(out)
        })
    }
}

/// Bounded retry budget for provider calls.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts before giving up.
    pub attempts: u32,
    /// Per-attempt timeout.
    pub timeout: Duration,
    /// Initial backoff delay, doubled after each failed attempt.
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            timeout: Duration::from_secs(30),
            backoff_base: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    pub fn new(attempts: u32, timeout: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            timeout,
            ..Self::default()
        }
    }
}

/// Embed with per-attempt timeout and exponential backoff.
///
/// Exhausting the budget maps to [`SearchError::EmbeddingUnavailable`]. A
/// dimension mismatch is a configuration error and aborts immediately.
///
/// # Errors
/// Returns `EmbeddingUnavailable` after the last failed attempt, or
/// `DimensionMismatch` without retrying.
pub async fn embed_with_retry(
    provider: &dyn EmbeddingProvider,
    text: &str,
    policy: RetryPolicy,
) -> Result<Vec<f32>, SearchError> {
    let mut delay = policy.backoff_base;
    let mut last_failure = String::new();

    for attempt in 1..=policy.attempts {
        match tokio::time::timeout(policy.timeout, provider.embed(text)).await {
            Ok(Ok(vector)) => return Ok(vector),
            Ok(Err(e @ SearchError::DimensionMismatch { .. })) => return Err(e),
            Ok(Err(e)) => {
                warn!(
                    target: "registry_search::embed",
                    attempt,
                    error = %e,
                    "embedding attempt failed"
                );
                last_failure = e.to_string();
            }
            Err(_) => {
                warn!(
                    target: "registry_search::embed",
                    attempt,
                    timeout_ms = policy.timeout.as_millis() as u64,
                    "embedding attempt timed out"
                );
                last_failure = format!("timed out after {:?}", policy.timeout);
            }
        }

        if attempt < policy.attempts {
            tokio::time::sleep(delay).await;
            delay = delay.saturating_mul(2);
        }
    }

    Err(SearchError::EmbeddingUnavailable(format!(
        "{} attempts exhausted: {last_failure}",
        policy.attempts
    )))
}

pub mod noop;
pub mod ollama;
pub mod openai;
