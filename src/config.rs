//! Configuration layer: reads runtime settings from environment variables
//! and exposes strongly typed configs for embeddings, Qdrant, and querying.

use serde::{Deserialize, Serialize};

use crate::errors::SearchError;

/// Vector search backend selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Exact cosine scan over the in-process collection. O(n) per query,
    /// intended for development / self-hosted scale.
    Memory,
    /// Qdrant collection with an HNSW graph index.
    Qdrant,
}

impl BackendKind {
    /// Parse from env string (case-insensitive). Defaults to Memory.
    pub fn from_env(s: Option<String>) -> Self {
        match s.unwrap_or_else(|| "memory".to_string()).to_lowercase().as_str() {
            "qdrant" => BackendKind::Qdrant,
            _ => BackendKind::Memory,
        }
    }
}

/// Embedding model backend selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Locally-resident model server (Ollama `/api/embeddings`).
    Ollama,
    /// Hosted OpenAI-compatible inference API (`/v1/embeddings`).
    OpenAi,
}

impl ProviderKind {
    /// Parse from env string (case-insensitive). Defaults to Ollama.
    pub fn from_env(s: Option<String>) -> Self {
        match s.unwrap_or_else(|| "ollama".to_string()).to_lowercase().as_str() {
            "openai" => ProviderKind::OpenAi,
            _ => ProviderKind::Ollama,
        }
    }
}

/// Embedding configuration (backend, model, dimension, retry budget).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Which model backend produces vectors.
    pub provider: ProviderKind,
    /// Embedding model identifier (e.g., "bge-m3").
    pub model: String,
    /// Embedding vector dimensionality (e.g., 1024 for bge-m3).
    pub dim: usize,
    /// Base URL of the provider endpoint.
    pub endpoint: String,
    /// API key for hosted providers.
    pub api_key: Option<String>,
    /// Per-attempt timeout for provider calls, in seconds.
    pub timeout_secs: u64,
    /// Total attempts before a call is declared unavailable.
    pub max_retries: u32,
    /// Max concurrent embedding workers during bulk reindexing.
    pub concurrency: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Ollama,
            model: "bge-m3".to_string(),
            dim: 1024,
            endpoint: "http://localhost:11434".to_string(),
            api_key: None,
            timeout_secs: 30,
            max_retries: 3,
            concurrency: 4,
        }
    }
}

/// Qdrant connectivity and collection parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QdrantConfig {
    /// gRPC URL for Qdrant (e.g., "http://localhost:6334").
    pub url: String,
    /// Optional API key for Qdrant Cloud.
    pub api_key: Option<String>,
    /// Target collection name.
    pub collection: String,
    /// HNSW graph degree.
    pub hnsw_m: u64,
    /// HNSW construction candidate list size.
    pub hnsw_ef_construct: u64,
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6334".to_string(),
            api_key: None,
            collection: "registry_entities".to_string(),
            hnsw_m: 16,
            hnsw_ef_construct: 128,
        }
    }
}

/// Query behavior knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Default result cap per entity type.
    pub max_results: usize,
    /// The vector pass fetches `max_results * candidate_multiplier`
    /// candidates (floor 10) so keyword boosts can reorder beyond the
    /// final cut.
    pub candidate_multiplier: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_results: 3,
            candidate_multiplier: 5,
        }
    }
}

/// Top-level runtime configuration for the search engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Which vector backend serves the semantic pass.
    pub backend: BackendKind,
    /// Embedding backend configuration.
    pub embedding: EmbeddingConfig,
    /// Qdrant connectivity & collection settings (used when `backend` is Qdrant).
    pub qdrant: QdrantConfig,
    /// Query behavior settings.
    pub query: QueryConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Memory,
            embedding: EmbeddingConfig::default(),
            qdrant: QdrantConfig::default(),
            query: QueryConfig::default(),
        }
    }
}

impl SearchConfig {
    /// Build configuration from environment variables.
    ///
    /// Environment variables used:
    /// - `SEARCH_BACKEND` (values: "memory" | "qdrant"; default: "memory")
    /// - `EMBEDDING_PROVIDER` (values: "ollama" | "openai"; default: "ollama")
    /// - `EMBEDDING_MODEL` (default: "bge-m3")
    /// - `EMBEDDING_DIM` (default: 1024)
    /// - `EMBEDDING_ENDPOINT` (default: "http://localhost:11434")
    /// - `EMBEDDING_API_KEY` (optional)
    /// - `EMBEDDING_TIMEOUT_SECS` (default: 30)
    /// - `EMBEDDING_MAX_RETRIES` (default: 3)
    /// - `EMBEDDING_CONCURRENCY` (default: 4)
    /// - `QDRANT_URL` (default: "http://localhost:6334")
    /// - `QDRANT_API_KEY` (optional)
    /// - `QDRANT_COLLECTION` (default: "registry_entities")
    /// - `SEARCH_MAX_RESULTS` (default: 3)
    /// - `SEARCH_CANDIDATE_MULTIPLIER` (default: 5)
    pub fn from_env() -> Result<Self, SearchError> {
        let backend = BackendKind::from_env(std::env::var("SEARCH_BACKEND").ok());

        let embedding = EmbeddingConfig {
            provider: ProviderKind::from_env(std::env::var("EMBEDDING_PROVIDER").ok()),
            model: std::env::var("EMBEDDING_MODEL").unwrap_or_else(|_| "bge-m3".into()),
            dim: read_usize_env("EMBEDDING_DIM").unwrap_or(1024),
            endpoint: std::env::var("EMBEDDING_ENDPOINT")
                .unwrap_or_else(|_| "http://localhost:11434".into()),
            api_key: std::env::var("EMBEDDING_API_KEY").ok(),
            timeout_secs: read_u64_env("EMBEDDING_TIMEOUT_SECS").unwrap_or(30),
            max_retries: read_u64_env("EMBEDDING_MAX_RETRIES").unwrap_or(3) as u32,
            concurrency: read_usize_env("EMBEDDING_CONCURRENCY").unwrap_or(4),
        };

        let qdrant = QdrantConfig {
            url: std::env::var("QDRANT_URL").unwrap_or_else(|_| "http://localhost:6334".into()),
            api_key: std::env::var("QDRANT_API_KEY").ok(),
            collection: std::env::var("QDRANT_COLLECTION")
                .unwrap_or_else(|_| "registry_entities".into()),
            hnsw_m: 16,
            hnsw_ef_construct: 128,
        };

        let query = QueryConfig {
            max_results: read_usize_env("SEARCH_MAX_RESULTS").unwrap_or(3),
            candidate_multiplier: read_usize_env("SEARCH_CANDIDATE_MULTIPLIER").unwrap_or(5),
        };

        let cfg = Self {
            backend,
            embedding,
            qdrant,
            query,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.embedding.dim == 0 {
            return Err(SearchError::InvalidConfig(
                "EMBEDDING_DIM must be > 0".into(),
            ));
        }
        if self.embedding.max_retries == 0 {
            return Err(SearchError::InvalidConfig(
                "EMBEDDING_MAX_RETRIES must be > 0".into(),
            ));
        }
        if self.query.max_results == 0 {
            return Err(SearchError::InvalidConfig(
                "SEARCH_MAX_RESULTS must be > 0".into(),
            ));
        }
        if self.backend == BackendKind::Qdrant {
            if self.qdrant.url.trim().is_empty() {
                return Err(SearchError::InvalidConfig("QDRANT_URL is empty".into()));
            }
            if self.qdrant.collection.trim().is_empty() {
                return Err(SearchError::InvalidConfig(
                    "QDRANT_COLLECTION is empty".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Read a `usize` from env, with error mapped to `SearchError`.
fn read_usize_env(key: &str) -> Result<usize, SearchError> {
    match std::env::var(key) {
        Ok(v) => v.parse::<usize>().map_err(|_| SearchError::EnvParse {
            key: key.into(),
            value: v,
        }),
        Err(_) => Err(SearchError::EnvMissing { key: key.into() }),
    }
}

/// Read a `u64` from env, with error mapped to `SearchError`.
fn read_u64_env(key: &str) -> Result<u64, SearchError> {
    match std::env::var(key) {
        Ok(v) => v.parse::<u64>().map_err(|_| SearchError::EnvParse {
            key: key.into(),
            value: v,
        }),
        Err(_) => Err(SearchError::EnvMissing { key: key.into() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let cfg = SearchConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.query.max_results, 3);
        assert_eq!(cfg.qdrant.hnsw_m, 16);
        assert_eq!(cfg.qdrant.hnsw_ef_construct, 128);
    }

    #[test]
    fn zero_dim_rejected() {
        let mut cfg = SearchConfig::default();
        cfg.embedding.dim = 0;
        assert!(matches!(
            cfg.validate(),
            Err(SearchError::InvalidConfig(_))
        ));
    }

    #[test]
    fn backend_kind_parses_case_insensitive() {
        assert_eq!(
            BackendKind::from_env(Some("Qdrant".into())),
            BackendKind::Qdrant
        );
        assert_eq!(BackendKind::from_env(None), BackendKind::Memory);
        assert_eq!(
            ProviderKind::from_env(Some("OPENAI".into())),
            ProviderKind::OpenAi
        );
    }
}
