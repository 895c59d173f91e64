//! Cross-backend agreement.
//!
//! Both vector backends implement one ordering contract: descending cosine
//! similarity, ties broken by ascending path. The exact scan is checked
//! against hand-computed rankings here; the Qdrant HNSW variant is checked
//! against the exact scan when a live store is available
//! (`QDRANT_TEST_URL`), since an approximate index cannot run in-process.

use std::collections::BTreeSet;
use std::sync::Arc;

use registry_search::{
    BruteForceBackend, DocDetail, DocumentStore, IndexedDocument, QdrantBackend, QdrantConfig,
    VectorBackend,
};

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

/// Unit vector in the XY plane.
fn unit(angle_rad: f32) -> Vec<f32> {
    vec![angle_rad.cos(), angle_rad.sin(), 0.0, 0.0]
}

async fn seeded_store() -> Arc<DocumentStore> {
    let store = Arc::new(DocumentStore::new());
    // Angular distance from the +X axis fixes the expected ranking.
    store.insert(doc("/near", unit(0.05))).await;
    store.insert(doc("/close", unit(0.30))).await;
    store.insert(doc("/far", unit(1.00))).await;
    store.insert(doc("/opposite", unit(3.00))).await;
    store
}

#[tokio::test]
async fn brute_force_ranking_is_exact() {
    let store = seeded_store().await;
    let backend = BruteForceBackend::new(store);

    let hits = backend.search(&unit(0.0), 3).await.expect("search");
    let paths: Vec<&str> = hits.iter().map(|h| h.path.as_str()).collect();
    assert_eq!(paths, ["/near", "/close", "/far"]);

    for pair in hits.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[tokio::test]
async fn brute_force_ties_break_by_path() {
    let store = Arc::new(DocumentStore::new());
    // Identical vectors, so every similarity ties.
    for path in ["/c", "/a", "/b"] {
        store.insert(doc(path, unit(0.2))).await;
    }
    let backend = BruteForceBackend::new(store);

    let hits = backend.search(&unit(0.0), 2).await.expect("search");
    let paths: Vec<&str> = hits.iter().map(|h| h.path.as_str()).collect();
    assert_eq!(paths, ["/a", "/b"]);
}

/// Installs the same documents into both variants and compares the top-k
/// *sets*. Needs a live Qdrant (`QDRANT_TEST_URL`, e.g.
/// `http://localhost:6334`); skipped otherwise.
#[tokio::test]
async fn backends_return_the_same_top_k_set() {
    let Ok(url) = std::env::var("QDRANT_TEST_URL") else {
        eprintln!("QDRANT_TEST_URL not set; skipping live-store parity test");
        return;
    };

    let store = seeded_store().await;
    let brute = BruteForceBackend::new(store.clone());

    let cfg = QdrantConfig {
        url,
        collection: format!("registry_parity_{}", std::process::id()),
        ..QdrantConfig::default()
    };
    let qdrant = QdrantBackend::new(&cfg).expect("qdrant client");
    qdrant.ensure_ready(4).await.expect("collection");

    for d in store.snapshot().await {
        qdrant
            .upsert(&d.path, d.embedding.clone())
            .await
            .expect("qdrant upsert");
    }

    let k = 3;
    let query = unit(0.0);
    let exact = brute.search(&query, k).await.expect("exact search");
    let approx = qdrant.search(&query, k).await.expect("ann search");

    let exact_set: BTreeSet<&str> = exact.iter().map(|h| h.path.as_str()).collect();
    let approx_set: BTreeSet<&str> = approx.iter().map(|h| h.path.as_str()).collect();
    assert_eq!(
        exact_set, approx_set,
        "exact and HNSW backends disagree on the top-{k} set"
    );

    // Ordering contract holds on both sides.
    let exact_paths: Vec<&str> = exact.iter().map(|h| h.path.as_str()).collect();
    let approx_paths: Vec<&str> = approx.iter().map(|h| h.path.as_str()).collect();
    assert_eq!(exact_paths, approx_paths);
}
