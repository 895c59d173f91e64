//! Native-index backend: a Qdrant collection with an HNSW graph.
//!
//! Concentrates all Qdrant interactions behind the [`VectorBackend`]
//! contract, hiding the verbose builder API from the rest of the engine.
//! Point ids are deterministic UUIDv5 values derived from the entity `path`,
//! which is also kept in the payload so hits can be mapped back.

use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, DeletePointsBuilder, Distance, HnswConfigDiffBuilder, PointStruct,
    PointsIdsList, SearchPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder,
};
use qdrant_client::Payload;

use futures::future::BoxFuture;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::backend::{VectorBackend, VectorHit, rank_hits};
use crate::config::QdrantConfig;
use crate::errors::SearchError;

/// Approximate nearest-neighbor search over a Qdrant collection.
pub struct QdrantBackend {
    client: Qdrant,
    collection: String,
    hnsw_m: u64,
    hnsw_ef_construct: u64,
    ready: OnceCell<()>,
}

impl QdrantBackend {
    /// Creates a new backend from the given configuration.
    ///
    /// # Errors
    /// Returns `SearchError::Backend` if the client cannot be constructed.
    pub fn new(cfg: &QdrantConfig) -> Result<Self, SearchError> {
        let mut builder = Qdrant::from_url(&cfg.url);
        if let Some(key) = &cfg.api_key {
            builder = builder.api_key(key.clone());
        }
        let client = builder
            .build()
            .map_err(|e| SearchError::Backend(format!("client build: {e}")))?;

        Ok(Self {
            client,
            collection: cfg.collection.clone(),
            hnsw_m: cfg.hnsw_m,
            hnsw_ef_construct: cfg.hnsw_ef_construct,
            ready: OnceCell::new(),
        })
    }

    /// Create the collection if it does not exist yet.
    async fn ensure_collection(&self, dim: usize) -> Result<(), SearchError> {
        match self.client.collection_info(&self.collection).await {
            Ok(_) => {
                debug!(
                    target: "registry_search::backend",
                    collection = %self.collection,
                    "collection already exists"
                );
                return Ok(());
            }
            Err(err) => {
                warn!(
                    target: "registry_search::backend",
                    collection = %self.collection,
                    error = %err,
                    "collection not found, will be created"
                );
            }
        }

        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection)
                    .vectors_config(VectorParamsBuilder::new(dim as u64, Distance::Cosine))
                    .hnsw_config(
                        HnswConfigDiffBuilder::default()
                            .m(self.hnsw_m)
                            .ef_construct(self.hnsw_ef_construct),
                    ),
            )
            .await
            .map_err(|e| SearchError::Backend(format!("create_collection: {e}")))?;

        info!(
            target: "registry_search::backend",
            collection = %self.collection,
            dim,
            m = self.hnsw_m,
            ef_construct = self.hnsw_ef_construct,
            "collection created"
        );
        Ok(())
    }
}

impl VectorBackend for QdrantBackend {
    fn ensure_ready<'a>(&'a self, dim: usize) -> BoxFuture<'a, Result<(), SearchError>> {
        Box::pin(async move {
            self.ready
                .get_or_try_init(|| self.ensure_collection(dim))
                .await?;
            Ok(())
        })
    }

    fn upsert<'a>(
        &'a self,
        path: &'a str,
        vector: Vec<f32>,
    ) -> BoxFuture<'a, Result<(), SearchError>> {
        Box::pin(async move {
            let payload: Payload = serde_json::json!({ "path": path })
                .try_into()
                .map_err(|e| SearchError::Backend(format!("payload convert: {e}")))?;

            let point = PointStruct::new(stable_point_id(path), vector, payload);

            self.client
                .upsert_points(UpsertPointsBuilder::new(&self.collection, vec![point]).wait(true))
                .await
                .map_err(|e| SearchError::Backend(format!("upsert_points: {e}")))?;

            Ok(())
        })
    }

    fn delete<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<(), SearchError>> {
        Box::pin(async move {
            self.client
                .delete_points(
                    DeletePointsBuilder::new(&self.collection)
                        .points(PointsIdsList {
                            ids: vec![stable_point_id(path).into()],
                        })
                        .wait(true),
                )
                .await
                .map_err(|e| SearchError::Backend(format!("delete_points: {e}")))?;
            Ok(())
        })
    }

    fn search<'a>(
        &'a self,
        vector: &'a [f32],
        k: usize,
    ) -> BoxFuture<'a, Result<Vec<VectorHit>, SearchError>> {
        Box::pin(async move {
            let resp = self
                .client
                .search_points(
                    SearchPointsBuilder::new(&self.collection, vector.to_vec(), k as u64)
                        .with_payload(true),
                )
                .await
                .map_err(|e| SearchError::Backend(format!("search_points: {e}")))?;

            let hits: Vec<VectorHit> = resp
                .result
                .into_iter()
                .filter_map(|sp| {
                    let path = sp
                        .payload
                        .get("path")
                        .and_then(|v| v.clone().into_json().as_str().map(str::to_owned))?;
                    Some(VectorHit {
                        path,
                        score: sp.score,
                    })
                })
                .collect();

            // Re-rank locally so the tie-break contract matches the
            // brute-force variant bit for bit.
            Ok(rank_hits(hits, k))
        })
    }
}

/// Deterministic UUIDv5 point id from an entity path.
fn stable_point_id(path: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, path.as_bytes()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_ids_are_stable_and_distinct() {
        assert_eq!(stable_point_id("/weather-api"), stable_point_id("/weather-api"));
        assert_ne!(stable_point_id("/weather-api"), stable_point_id("/context7"));
    }
}
