//! Brute-force backend: exact cosine similarity over the in-process store.
//!
//! Loads the whole collection snapshot and scores every embedded document
//! against the query vector. Exact but O(n) per query; acceptable for
//! development and self-hosted scale. Vectors live on the documents
//! themselves, so upsert/delete are satisfied by the store writes.

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::backend::{VectorBackend, VectorHit, rank_hits};
use crate::errors::SearchError;
use crate::store::DocumentStore;

/// Exact in-process nearest-neighbor scan.
pub struct BruteForceBackend {
    store: Arc<DocumentStore>,
}

impl BruteForceBackend {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }
}

impl VectorBackend for BruteForceBackend {
    fn ensure_ready<'a>(&'a self, _dim: usize) -> BoxFuture<'a, Result<(), SearchError>> {
        Box::pin(async move { Ok(()) })
    }

    fn upsert<'a>(
        &'a self,
        _path: &'a str,
        _vector: Vec<f32>,
    ) -> BoxFuture<'a, Result<(), SearchError>> {
        // The store write performed by the indexer is the upsert.
        Box::pin(async move { Ok(()) })
    }

    fn delete<'a>(&'a self, _path: &'a str) -> BoxFuture<'a, Result<(), SearchError>> {
        Box::pin(async move { Ok(()) })
    }

    fn search<'a>(
        &'a self,
        vector: &'a [f32],
        k: usize,
    ) -> BoxFuture<'a, Result<Vec<VectorHit>, SearchError>> {
        Box::pin(async move {
            let snapshot = self.store.snapshot().await;

            let hits: Vec<VectorHit> = snapshot
                .iter()
                .filter(|doc| doc.embedding.len() == vector.len())
                .map(|doc| VectorHit {
                    path: doc.path.clone(),
                    score: cosine_similarity(&doc.embedding, vector),
                })
                .collect();

            Ok(rank_hits(hits, k))
        })
    }
}

/// Cosine similarity in `[-1, 1]`; zero-magnitude vectors score 0.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(&x, &y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|y| y * y).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DocDetail, IndexedDocument};
    use std::collections::BTreeSet;

    fn doc(path: &str, embedding: Vec<f32>) -> IndexedDocument {
        IndexedDocument {
            path: path.into(),
            name: path.trim_start_matches('/').into(),
            description: String::new(),
            tags: BTreeSet::new(),
            enabled: true,
            embedding,
            detail: DocDetail::Server { tools: Vec::new() },
        }
    }

    #[test]
    fn cosine_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn search_returns_exact_descending_order() {
        let store = Arc::new(DocumentStore::new());
        store.insert(doc("/x", vec![1.0, 0.0, 0.0])).await;
        store.insert(doc("/y", vec![0.0, 1.0, 0.0])).await;
        store.insert(doc("/z", vec![0.9, 0.1, 0.0])).await;

        let backend = BruteForceBackend::new(store);
        let hits = backend.search(&[1.0, 0.0, 0.0], 2).await.expect("search");

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].path, "/x");
        assert_eq!(hits[1].path, "/z");
        assert!(hits[0].score >= hits[1].score);
    }

    #[tokio::test]
    async fn mismatched_dimensions_are_skipped() {
        let store = Arc::new(DocumentStore::new());
        store.insert(doc("/ok", vec![1.0, 0.0])).await;
        store.insert(doc("/bad", vec![1.0, 0.0, 0.0])).await;

        let backend = BruteForceBackend::new(store);
        let hits = backend.search(&[1.0, 0.0], 10).await.expect("search");

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].path, "/ok");
    }

    #[tokio::test]
    async fn empty_collection_yields_no_hits() {
        let backend = BruteForceBackend::new(Arc::new(DocumentStore::new()));
        let hits = backend.search(&[1.0, 0.0], 5).await.expect("search");
        assert!(hits.is_empty());
    }
}
