//! Indexing pipeline: build embeddable text, embed, verify, store.
//!
//! This is the only place embeddings are computed; query time never
//! re-embeds documents. Upserts for the same `path` are serialized through a
//! per-path lock while different paths proceed concurrently — no global
//! index lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::backend::VectorBackend;
use crate::embed::{EmbeddingProvider, RetryPolicy, embed_with_retry};
use crate::errors::SearchError;
use crate::model::{EntityRecord, IndexedDocument, embeddable_text};
use crate::store::DocumentStore;

/// Outcome of a bulk reindex.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexStats {
    /// Entities written to the collection.
    pub indexed: usize,
    /// Entities skipped (malformed or embedding unavailable).
    pub skipped: usize,
}

/// Per-path write serialization.
///
/// The outer mutex only guards the lock registry; actual upserts hold the
/// inner per-path lock across the embed + write sequence.
#[derive(Default)]
pub(crate) struct PathLocks {
    inner: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl PathLocks {
    pub(crate) fn lock_for(&self, path: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        map.entry(path.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}

/// Index or re-index one registry entity.
///
/// Builds the embeddable text, computes the vector through the shared
/// provider, verifies its dimension against the collection, then writes the
/// vector and the full document. Idempotent: re-upserting an unchanged
/// entity produces an identical stored document modulo provider
/// nondeterminism.
///
/// # Errors
/// - [`SearchError::MalformedEntity`] for records missing required fields
///   (logged and skipped, the indexer keeps running)
/// - [`SearchError::DimensionMismatch`] when the provider output does not
///   match the collection dimension (fatal configuration error)
/// - [`SearchError::EmbeddingUnavailable`] when the retry budget is spent
/// - [`SearchError::Backend`] on vector store failures
pub(crate) async fn upsert_entity(
    store: &DocumentStore,
    backend: &dyn VectorBackend,
    provider: &dyn EmbeddingProvider,
    locks: &PathLocks,
    policy: RetryPolicy,
    record: &EntityRecord,
) -> Result<(), SearchError> {
    if let Err(e) = record.validate() {
        warn!(
            target: "registry_search::index",
            path = record.path(),
            error = %e,
            "skipping malformed entity"
        );
        return Err(e);
    }

    let text = embeddable_text(record);
    let dim = provider.dim();

    let path_lock = locks.lock_for(record.path());
    let _guard = path_lock.lock().await;

    let vector = embed_with_retry(provider, &text, policy).await?;
    if vector.len() != dim {
        return Err(SearchError::DimensionMismatch {
            got: vector.len(),
            want: dim,
        });
    }

    backend.ensure_ready(dim).await?;
    backend.upsert(record.path(), vector.clone()).await?;
    store
        .insert(IndexedDocument::from_record(record, vector))
        .await;

    debug!(
        target: "registry_search::index",
        path = record.path(),
        "entity indexed"
    );
    Ok(())
}

/// Remove one entity from the collection.
///
/// Removing an absent path is a no-op; subsequent queries never return the
/// entity and other entities' scores are unaffected.
pub(crate) async fn delete_entity(
    store: &DocumentStore,
    backend: &dyn VectorBackend,
    locks: &PathLocks,
    path: &str,
) -> Result<(), SearchError> {
    let path_lock = locks.lock_for(path);
    let _guard = path_lock.lock().await;

    backend.delete(path).await?;
    let removed = store.remove(path).await;

    debug!(
        target: "registry_search::index",
        path,
        removed,
        "entity deleted"
    );
    Ok(())
}

/// Re-index a batch of entities with bounded concurrency.
///
/// Malformed records and records whose embedding stayed unavailable are
/// counted as skipped; configuration and store errors abort the run.
pub(crate) async fn reindex_all(
    store: &DocumentStore,
    backend: &dyn VectorBackend,
    provider: &dyn EmbeddingProvider,
    locks: &PathLocks,
    policy: RetryPolicy,
    concurrency: usize,
    records: &[EntityRecord],
) -> Result<IndexStats, SearchError> {
    info!(
        target: "registry_search::index",
        total = records.len(),
        concurrency,
        "reindex started"
    );

    let results: Vec<Result<(), SearchError>> = stream::iter(records.iter())
        .map(|record| upsert_entity(store, backend, provider, locks, policy, record))
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut stats = IndexStats::default();
    for result in results {
        match result {
            Ok(()) => stats.indexed += 1,
            Err(SearchError::MalformedEntity { .. })
            | Err(SearchError::EmbeddingUnavailable(_)) => stats.skipped += 1,
            Err(e) => return Err(e),
        }
    }

    info!(
        target: "registry_search::index",
        indexed = stats.indexed,
        skipped = stats.skipped,
        "reindex finished"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BruteForceBackend;
    use crate::embed::noop::NoopEmbedder;
    use crate::model::ServerRecord;
    use std::collections::BTreeSet;

    fn record(path: &str) -> EntityRecord {
        EntityRecord::Server(ServerRecord {
            path: path.into(),
            name: path.trim_start_matches('/').into(),
            description: "test entity".into(),
            tags: BTreeSet::new(),
            enabled: true,
            tools: Vec::new(),
        })
    }

    fn policy() -> RetryPolicy {
        RetryPolicy {
            attempts: 1,
            timeout: std::time::Duration::from_secs(1),
            backoff_base: std::time::Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn upsert_is_idempotent() {
        let store = Arc::new(DocumentStore::new());
        let backend = BruteForceBackend::new(store.clone());
        let provider = NoopEmbedder::new(4);
        let locks = PathLocks::default();

        let rec = record("/svc");
        upsert_entity(&store, &backend, &provider, &locks, policy(), &rec)
            .await
            .expect("first upsert");
        let first = store.get("/svc").await.expect("present");

        upsert_entity(&store, &backend, &provider, &locks, policy(), &rec)
            .await
            .expect("second upsert");
        let second = store.get("/svc").await.expect("present");

        assert_eq!(*first, *second);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn malformed_entity_is_skipped_not_stored() {
        let store = Arc::new(DocumentStore::new());
        let backend = BruteForceBackend::new(store.clone());
        let provider = NoopEmbedder::new(4);
        let locks = PathLocks::default();

        let rec = EntityRecord::Server(ServerRecord {
            path: "/broken".into(),
            name: "".into(),
            description: String::new(),
            tags: BTreeSet::new(),
            enabled: true,
            tools: Vec::new(),
        });

        let err = upsert_entity(&store, &backend, &provider, &locks, policy(), &rec)
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::MalformedEntity { .. }));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn delete_removes_document() {
        let store = Arc::new(DocumentStore::new());
        let backend = BruteForceBackend::new(store.clone());
        let provider = NoopEmbedder::new(4);
        let locks = PathLocks::default();

        upsert_entity(&store, &backend, &provider, &locks, policy(), &record("/a"))
            .await
            .expect("upsert");
        delete_entity(&store, &backend, &locks, "/a")
            .await
            .expect("delete");
        assert!(store.get("/a").await.is_none());

        // Deleting again is a no-op.
        delete_entity(&store, &backend, &locks, "/a")
            .await
            .expect("repeat delete");
    }

    #[tokio::test]
    async fn reindex_counts_indexed_and_skipped() {
        let store = Arc::new(DocumentStore::new());
        let backend = BruteForceBackend::new(store.clone());
        let provider = NoopEmbedder::new(4);
        let locks = PathLocks::default();

        let records = vec![
            record("/a"),
            record("/b"),
            EntityRecord::Server(ServerRecord {
                path: String::new(),
                name: "nameless".into(),
                description: String::new(),
                tags: BTreeSet::new(),
                enabled: true,
                tools: Vec::new(),
            }),
        ];

        let stats = reindex_all(&store, &backend, &provider, &locks, policy(), 2, &records)
            .await
            .expect("reindex");
        assert_eq!(stats.indexed, 2);
        assert_eq!(stats.skipped, 1);
        assert_eq!(store.len().await, 2);
    }
}
