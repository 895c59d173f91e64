//! Unified error type for the registry-search crate.

use thiserror::Error;

/// Errors produced by the search engine.
#[derive(Debug, Error)]
pub enum SearchError {
    // ── Configuration / environment ──────────────────────────────────────────
    /// Required environment variable is missing.
    #[error("missing env variable: {key}")]
    EnvMissing { key: String },

    /// Failed to parse an environment variable into the expected type.
    #[error("failed to parse env variable: {key} = '{value}'")]
    EnvParse { key: String, value: String },

    /// Configuration combination is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Indexing ────────────────────────────────────────────────────────────
    /// Entity record is missing required fields; skipped, never indexed.
    #[error("malformed entity '{path}': {reason}")]
    MalformedEntity { path: String, reason: String },

    /// Vector length does not match the collection's configured dimension.
    /// Fatal at indexing time, never retried.
    #[error("embedding dimension mismatch: got {got}, want {want}")]
    DimensionMismatch { got: usize, want: usize },

    // ── Embedding provider ──────────────────────────────────────────────────
    /// Provider exhausted its retry budget (timeouts, transport failures).
    /// Queries degrade to keyword-only scoring on this error.
    #[error("embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// Provider failed to produce an embedding (bad response, decode error).
    #[error("embedding error: {0}")]
    Embedding(String),

    // ── Vector store ────────────────────────────────────────────────────────
    /// Transport / server error from the vector store. Retryable; fails the
    /// whole query since both passes need the collection.
    #[error("vector backend error: {0}")]
    Backend(String),

    // ── JSON / serialization ────────────────────────────────────────────────
    /// JSON (de)serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
