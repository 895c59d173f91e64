//! Hybrid search and indexing over a capability registry.
//!
//! Clients find registered servers, their exposed tools, and autonomous
//! agents with natural-language queries. A semantic (embedding-vector) pass
//! and a lexical (keyword) pass run against the same collection and are
//! fused into a single ranked, grouped result set.
//!
//! This crate provides a clean API to:
//! - Index registry entities (`upsert_entity` / `delete_entity` / `reindex_all`)
//! - Answer queries (`search`) with per-type ranked groups
//!
//! The design is flat (no deep nesting) and splits responsibilities into
//! focused modules. The routing, auth, and persistence layers around the
//! registry are external collaborators: they hand entity records in and
//! receive shaped responses out.

mod backend;
mod config;
mod embed;
mod errors;
mod indexer;
mod keyword;
mod model;
mod response;
mod search;
mod store;

pub use backend::{BruteForceBackend, QdrantBackend, VectorBackend, VectorHit, rank_hits};
pub use config::{BackendKind, EmbeddingConfig, ProviderKind, QdrantConfig, QueryConfig, SearchConfig};
pub use embed::noop::NoopEmbedder;
pub use embed::ollama::OllamaEmbedder;
pub use embed::openai::OpenAiEmbedder;
pub use embed::{EmbeddingProvider, RetryPolicy, embed_with_retry};
pub use errors::SearchError;
pub use indexer::IndexStats;
pub use keyword::{KeywordMatch, match_document, tokenize};
pub use model::{
    AgentRecord, DocDetail, EntityKind, EntityRecord, IndexedDocument, ServerRecord, SkillDef,
    ToolDef, embeddable_text,
};
pub use response::{
    AgentResult, MatchingTool, SearchRequest, SearchResponse, ServerResult, ToolResult,
};
pub use search::{TEXT_BOOST_WEIGHT, combine_scores};
pub use store::DocumentStore;

use std::sync::Arc;

use tracing::trace;

/// High-level facade that wires the store, the vector backend, and the
/// shared embedding provider.
///
/// This is the single entry point recommended for application code. The
/// provider handle is passed in at construction — shared, reference-counted,
/// never ambient global state.
pub struct SearchService {
    cfg: SearchConfig,
    store: Arc<DocumentStore>,
    backend: Arc<dyn VectorBackend>,
    provider: Arc<dyn EmbeddingProvider>,
    locks: indexer::PathLocks,
}

impl SearchService {
    /// Constructs a service from configuration, selecting the vector
    /// backend by `cfg.backend`.
    ///
    /// # Errors
    /// Returns `SearchError::InvalidConfig` on bad configuration, a
    /// `DimensionMismatch` if the provider's dimension disagrees with the
    /// configured collection, or `SearchError::Backend` if the Qdrant
    /// client cannot be constructed.
    pub fn new(
        cfg: SearchConfig,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self, SearchError> {
        cfg.validate()?;
        if provider.dim() != cfg.embedding.dim {
            return Err(SearchError::DimensionMismatch {
                got: provider.dim(),
                want: cfg.embedding.dim,
            });
        }

        let store = Arc::new(DocumentStore::new());
        let backend: Arc<dyn VectorBackend> = match cfg.backend {
            BackendKind::Memory => Arc::new(BruteForceBackend::new(store.clone())),
            BackendKind::Qdrant => Arc::new(QdrantBackend::new(&cfg.qdrant)?),
        };

        Ok(Self {
            cfg,
            store,
            backend,
            provider,
            locks: indexer::PathLocks::default(),
        })
    }

    /// Constructs a service around an explicit backend implementation.
    pub fn with_backend(
        cfg: SearchConfig,
        provider: Arc<dyn EmbeddingProvider>,
        store: Arc<DocumentStore>,
        backend: Arc<dyn VectorBackend>,
    ) -> Result<Self, SearchError> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            store,
            backend,
            provider,
            locks: indexer::PathLocks::default(),
        })
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.cfg.embedding.max_retries,
            std::time::Duration::from_secs(self.cfg.embedding.timeout_secs),
        )
    }

    /// Index or re-index one registry entity. Called by the management
    /// layer whenever an entity's record changes.
    ///
    /// # Errors
    /// See [`SearchError`]: malformed records are skipped with a warning,
    /// dimension mismatches are fatal configuration errors, and an
    /// exhausted embedding retry budget is reported as unavailable.
    pub async fn upsert_entity(&self, record: &EntityRecord) -> Result<(), SearchError> {
        trace!(target: "registry_search", path = record.path(), "upsert_entity");
        indexer::upsert_entity(
            &self.store,
            self.backend.as_ref(),
            self.provider.as_ref(),
            &self.locks,
            self.retry_policy(),
            record,
        )
        .await
    }

    /// Remove one entity from the index. Absent paths are a no-op.
    ///
    /// # Errors
    /// Returns `SearchError::Backend` on vector store failures.
    pub async fn delete_entity(&self, path: &str) -> Result<(), SearchError> {
        trace!(target: "registry_search", path, "delete_entity");
        indexer::delete_entity(&self.store, self.backend.as_ref(), &self.locks, path).await
    }

    /// Re-index a batch of entities with bounded concurrency, e.g. after an
    /// embedding model change.
    ///
    /// # Errors
    /// Aborts on configuration and store errors; malformed or unembeddable
    /// records are only counted in the returned stats.
    pub async fn reindex_all(&self, records: &[EntityRecord]) -> Result<IndexStats, SearchError> {
        indexer::reindex_all(
            &self.store,
            self.backend.as_ref(),
            self.provider.as_ref(),
            &self.locks,
            self.retry_policy(),
            self.cfg.embedding.concurrency,
            records,
        )
        .await
    }

    /// Execute one query and return the ranked, grouped response.
    ///
    /// Queries are independent read-only operations and may run fully in
    /// parallel. If the embedding provider is unavailable the response is
    /// keyword-ranked and flagged `degraded` instead of failing.
    ///
    /// # Errors
    /// Returns `SearchError::Backend` when the vector store is unreachable.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SearchError> {
        trace!(target: "registry_search", query = %request.query, "search");
        search::run_query(
            &self.cfg.query,
            self.retry_policy(),
            &self.store,
            self.backend.as_ref(),
            self.provider.as_ref(),
            request,
        )
        .await
    }

    /// Number of documents currently indexed.
    pub async fn document_count(&self) -> usize {
        self.store.len().await
    }
}
