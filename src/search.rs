//! Query pipeline: parallel vector + keyword passes, score fusion,
//! aggregation.
//!
//! The backing store cannot union a vector search and a lexical scan in one
//! server-side query, so the two passes run as independent tasks joined
//! before fusion and are merged by `path` in application code. Keyword
//! matches can only nudge the ranking (`boost * 0.1`), never dominate a
//! strong semantic mismatch, while an exact name/path match still surfaces
//! near the top.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::backend::{VectorBackend, VectorHit};
use crate::config::QueryConfig;
use crate::embed::{EmbeddingProvider, RetryPolicy, embed_with_retry};
use crate::errors::SearchError;
use crate::keyword::{KeywordMatch, match_document, tokenize};
use crate::model::{DocDetail, EntityKind, IndexedDocument};
use crate::response::{
    AgentResult, MatchingTool, SearchRequest, SearchResponse, ServerResult, ToolResult,
};
use crate::store::DocumentStore;

/// Weight applied to the lexical boost when fusing with vector similarity.
pub const TEXT_BOOST_WEIGHT: f32 = 0.1;

/// Fuse the two signals into one relevance score.
///
/// Monotonically non-decreasing in both inputs.
pub fn combine_scores(vector_score: f32, text_boost: f32) -> f32 {
    vector_score + text_boost * TEXT_BOOST_WEIGHT
}

/// One document with both signals merged.
struct ScoredDoc {
    doc: Arc<IndexedDocument>,
    relevance: f32,
    matched_items: Vec<String>,
}

/// Execute one query against the collection.
///
/// Cancellation-safe: dropping the returned future aborts the outstanding
/// embedding call; the keyword pass is local and abandoned for free.
pub(crate) async fn run_query(
    query_cfg: &QueryConfig,
    policy: RetryPolicy,
    store: &DocumentStore,
    backend: &dyn VectorBackend,
    provider: &dyn EmbeddingProvider,
    request: &SearchRequest,
) -> Result<SearchResponse, SearchError> {
    let max_results = request.max_results.unwrap_or(query_cfg.max_results).max(1);
    let candidate_k = (max_results * query_cfg.candidate_multiplier.max(1)).max(10);

    let snapshot = store.snapshot().await;

    // Pass A: embed the query, then ask the backend for candidates. An
    // unavailable provider degrades the query instead of failing it.
    let vector_pass = async {
        match embed_with_retry(provider, &request.query, policy).await {
            Ok(vector) => {
                let hits = backend.search(&vector, candidate_k).await?;
                Ok::<Option<Vec<VectorHit>>, SearchError>(Some(hits))
            }
            Err(SearchError::EmbeddingUnavailable(reason)) => {
                warn!(
                    target: "registry_search::query",
                    reason = %reason,
                    "embedding unavailable, degrading to keyword-only scoring"
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    };

    // Pass B: lexical scan over the same snapshot.
    let keyword_pass = async {
        let tokens = tokenize(&request.query);
        snapshot
            .iter()
            .map(|doc| (doc.clone(), match_document(&tokens, doc)))
            .collect::<Vec<(Arc<IndexedDocument>, KeywordMatch)>>()
    };

    let (vector_result, keyword_matches) = tokio::join!(vector_pass, keyword_pass);
    let vector_hits = vector_result?;
    let degraded = vector_hits.is_none();

    // Merge the two passes by path. Documents matched only lexically enter
    // with vector score 0.
    let mut vector_scores: HashMap<&str, f32> = HashMap::new();
    if let Some(hits) = &vector_hits {
        for hit in hits {
            vector_scores.insert(hit.path.as_str(), hit.score);
        }
    }

    let mut scored: Vec<ScoredDoc> = Vec::new();
    for (doc, keyword) in keyword_matches {
        let vector_score = vector_scores.get(doc.path.as_str()).copied();
        if vector_score.is_none() && keyword.boost == 0.0 {
            continue;
        }
        let vector_score = vector_score.unwrap_or(0.0);
        trace!(
            target: "registry_search::query",
            path = %doc.path,
            vector_score,
            text_boost = keyword.boost,
            "candidate scored"
        );
        scored.push(ScoredDoc {
            relevance: combine_scores(vector_score, keyword.boost),
            matched_items: keyword.matched_items,
            doc,
        });
    }

    debug!(
        target: "registry_search::query",
        candidates = scored.len(),
        degraded,
        "passes merged"
    );

    Ok(aggregate(request, max_results, degraded, scored))
}

/// Group by entity kind, sort, truncate, and shape the response.
fn aggregate(
    request: &SearchRequest,
    max_results: usize,
    degraded: bool,
    mut scored: Vec<ScoredDoc>,
) -> SearchResponse {
    // One comparator for grouping, sorting, and the truncation boundary:
    // descending relevance, ties by ascending path.
    scored.sort_by(|a, b| {
        b.relevance
            .total_cmp(&a.relevance)
            .then_with(|| a.doc.path.cmp(&b.doc.path))
    });

    let mut servers: Vec<ServerResult> = Vec::new();
    let mut agents: Vec<AgentResult> = Vec::new();
    let mut tools: Vec<ToolResult> = Vec::new();
    let mut total_servers = 0;
    let mut total_agents = 0;

    for entry in &scored {
        match &entry.doc.detail {
            DocDetail::Server { tools: defs } => {
                total_servers += 1;
                if request.wants(EntityKind::Tool) {
                    collect_tools(&mut tools, entry, defs);
                }
                if request.wants(EntityKind::Server) && servers.len() < max_results {
                    servers.push(shape_server(entry, defs));
                }
            }
            DocDetail::Agent { skills, .. } => {
                total_agents += 1;
                if request.wants(EntityKind::Agent) && agents.len() < max_results {
                    agents.push(AgentResult {
                        path: entry.doc.path.clone(),
                        name: entry.doc.name.clone(),
                        description: entry.doc.description.clone(),
                        tags: entry.doc.tags.iter().cloned().collect(),
                        skills: skills.clone(),
                        enabled: entry.doc.enabled,
                        relevance_score: entry.relevance,
                    });
                }
            }
        }
    }

    if !request.wants(EntityKind::Server) {
        total_servers = 0;
    }
    if !request.wants(EntityKind::Agent) {
        total_agents = 0;
    }

    // Tool entries inherited their parents' order; truncate as a group of
    // its own.
    let total_tools = tools.len();
    tools.truncate(max_results);

    SearchResponse {
        query: request.query.clone(),
        servers,
        tools,
        agents,
        total_servers,
        total_tools,
        total_agents,
        degraded,
    }
}

fn shape_server(entry: &ScoredDoc, defs: &[crate::model::ToolDef]) -> ServerResult {
    let matching_tools = entry
        .matched_items
        .iter()
        .filter_map(|name| defs.iter().find(|t| &t.name == name))
        .map(|tool| MatchingTool {
            name: tool.name.clone(),
            description: tool.description.clone(),
            relevance_score: entry.relevance,
        })
        .collect();

    ServerResult {
        path: entry.doc.path.clone(),
        name: entry.doc.name.clone(),
        description: entry.doc.description.clone(),
        tags: entry.doc.tags.iter().cloned().collect(),
        num_tools: defs.len(),
        enabled: entry.doc.enabled,
        relevance_score: entry.relevance,
        matching_tools,
    }
}

/// Full records (with schema) for the tools that matched, deduplicated by
/// `(server_path, tool_name)`. Matched tool names are unique per server, so
/// parent iteration order already guarantees the dedup key.
fn collect_tools(out: &mut Vec<ToolResult>, entry: &ScoredDoc, defs: &[crate::model::ToolDef]) {
    for name in &entry.matched_items {
        if let Some(tool) = defs.iter().find(|t| &t.name == name) {
            out.push(ToolResult {
                server_path: entry.doc.path.clone(),
                server_name: entry.doc.name.clone(),
                tool_name: tool.name.clone(),
                description: tool.description.clone(),
                input_schema: tool.input_schema.clone(),
                relevance_score: entry.relevance,
            });
        }
    }
}
