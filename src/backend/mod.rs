//! Vector search backends behind one contract.
//!
//! Two implementations share the trait: a Qdrant collection with an HNSW
//! graph (approximate, fast on large collections) and an exact in-process
//! cosine scan (O(n), development scale). Both route their raw hits through
//! [`rank_hits`], so the ordering contract — descending similarity, ties
//! broken by ascending `path` — holds identically regardless of backend.

use futures::future::BoxFuture;

use crate::errors::SearchError;

mod memory;
mod qdrant;

pub use memory::BruteForceBackend;
pub use qdrant::QdrantBackend;

/// One nearest-neighbor candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorHit {
    pub path: String,
    /// Cosine similarity of the document vector against the query vector.
    pub score: f32,
}

/// Nearest-neighbor retrieval over the indexed collection.
///
/// Selected once at startup by configuration; callers are backend-agnostic.
pub trait VectorBackend: Send + Sync {
    /// Prepare the backing collection for vectors of the given dimension.
    fn ensure_ready<'a>(&'a self, dim: usize) -> BoxFuture<'a, Result<(), SearchError>>;

    /// Write the vector stored under `path`, replacing any previous one.
    fn upsert<'a>(
        &'a self,
        path: &'a str,
        vector: Vec<f32>,
    ) -> BoxFuture<'a, Result<(), SearchError>>;

    /// Remove the vector stored under `path`. Absent paths are a no-op.
    fn delete<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<(), SearchError>>;

    /// Top-`k` candidates by cosine similarity, descending, ties broken by
    /// ascending `path`.
    fn search<'a>(
        &'a self,
        vector: &'a [f32],
        k: usize,
    ) -> BoxFuture<'a, Result<Vec<VectorHit>, SearchError>>;
}

/// Apply the shared ordering contract and truncate to `k`.
pub fn rank_hits(mut hits: Vec<VectorHit>, k: usize) -> Vec<VectorHit> {
    hits.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.path.cmp(&b.path))
    });
    hits.truncate(k);
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(path: &str, score: f32) -> VectorHit {
        VectorHit {
            path: path.into(),
            score,
        }
    }

    #[test]
    fn rank_orders_descending() {
        let ranked = rank_hits(vec![hit("/a", 0.2), hit("/b", 0.9), hit("/c", 0.5)], 10);
        let paths: Vec<&str> = ranked.iter().map(|h| h.path.as_str()).collect();
        assert_eq!(paths, ["/b", "/c", "/a"]);
    }

    #[test]
    fn ties_break_by_ascending_path() {
        let ranked = rank_hits(vec![hit("/z", 0.5), hit("/a", 0.5), hit("/m", 0.5)], 10);
        let paths: Vec<&str> = ranked.iter().map(|h| h.path.as_str()).collect();
        assert_eq!(paths, ["/a", "/m", "/z"]);
    }

    #[test]
    fn truncation_keeps_the_tie_break_winner() {
        // Two documents tied at the boundary: the lexicographically smaller
        // path keeps the slot.
        let ranked = rank_hits(vec![hit("/b", 0.5), hit("/a", 0.5), hit("/c", 0.9)], 2);
        let paths: Vec<&str> = ranked.iter().map(|h| h.path.as_str()).collect();
        assert_eq!(paths, ["/c", "/a"]);
    }
}
