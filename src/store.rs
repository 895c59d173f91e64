//! In-process document collection keyed by `path`.
//!
//! The store is the canonical collection both query passes read: the keyword
//! pass scans a snapshot of it, the brute-force backend computes similarity
//! over the same snapshot, and the Qdrant backend hydrates its hits from it.
//! Documents are replaced wholesale under the write lock, so a concurrent
//! reader observes either the old or the new version of a document, never a
//! torn one.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::model::IndexedDocument;

/// Shared collection of indexed documents.
#[derive(Default)]
pub struct DocumentStore {
    docs: RwLock<HashMap<String, Arc<IndexedDocument>>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a document by `path`.
    pub async fn get(&self, path: &str) -> Option<Arc<IndexedDocument>> {
        self.docs.read().await.get(path).cloned()
    }

    /// Insert or replace the document stored under its `path`.
    ///
    /// Completes only after the new version is visible, so a query issued
    /// after an upsert returns observes the new document.
    pub async fn insert(&self, doc: IndexedDocument) {
        let mut docs = self.docs.write().await;
        docs.insert(doc.path.clone(), Arc::new(doc));
    }

    /// Remove a document. Returns whether it was present.
    pub async fn remove(&self, path: &str) -> bool {
        self.docs.write().await.remove(path).is_some()
    }

    /// Clone out the current set of documents for a lock-free scan.
    pub async fn snapshot(&self) -> Vec<Arc<IndexedDocument>> {
        self.docs.read().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.docs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.docs.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DocDetail;
    use std::collections::BTreeSet;

    fn doc(path: &str) -> IndexedDocument {
        IndexedDocument {
            path: path.into(),
            name: path.trim_start_matches('/').into(),
            description: String::new(),
            tags: BTreeSet::new(),
            enabled: true,
            embedding: vec![0.0; 4],
            detail: DocDetail::Server { tools: Vec::new() },
        }
    }

    #[tokio::test]
    async fn insert_then_get_observes_new_version() {
        let store = DocumentStore::new();
        store.insert(doc("/a")).await;
        assert!(store.get("/a").await.is_some());

        let mut updated = doc("/a");
        updated.description = "v2".into();
        store.insert(updated).await;

        let got = store.get("/a").await.expect("document present");
        assert_eq!(got.description, "v2");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let store = DocumentStore::new();
        store.insert(doc("/a")).await;
        assert!(store.remove("/a").await);
        assert!(!store.remove("/a").await);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn snapshot_is_detached_from_later_writes() {
        let store = DocumentStore::new();
        store.insert(doc("/a")).await;
        let snap = store.snapshot().await;
        store.insert(doc("/b")).await;
        assert_eq!(snap.len(), 1);
        assert_eq!(store.len().await, 2);
    }
}
