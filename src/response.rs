//! Wire-level request/response types for the query interface.
//!
//! The transport is owned by the surrounding platform; these types only fix
//! the shape of what crosses it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{EntityKind, SkillDef};

/// A search request as received from the router.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    /// Which result groups to produce. Empty means all.
    #[serde(default)]
    pub entity_types: Vec<EntityKind>,
    /// Result cap per entity type; the engine's configured default applies
    /// when omitted.
    #[serde(default)]
    pub max_results: Option<usize>,
}

impl SearchRequest {
    /// Request over all entity types with the engine's default result cap.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            entity_types: Vec::new(),
            max_results: None,
        }
    }

    pub(crate) fn wants(&self, kind: EntityKind) -> bool {
        self.entity_types.is_empty() || self.entity_types.contains(&kind)
    }
}

/// A matched tool inside a server result (no schema).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingTool {
    pub name: String,
    pub description: String,
    pub relevance_score: f32,
}

/// One ranked server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerResult {
    pub path: String,
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub num_tools: usize,
    pub enabled: bool,
    pub relevance_score: f32,
    pub matching_tools: Vec<MatchingTool>,
}

/// One ranked tool, with its full record including the input schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub server_path: String,
    pub server_name: String,
    pub tool_name: String,
    pub description: String,
    pub input_schema: Value,
    pub relevance_score: f32,
}

/// One ranked agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResult {
    pub path: String,
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub skills: Vec<SkillDef>,
    pub enabled: bool,
    pub relevance_score: f32,
}

/// Grouped, ranked, truncated result set for one query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub servers: Vec<ServerResult>,
    pub tools: Vec<ToolResult>,
    pub agents: Vec<AgentResult>,
    /// Match counts per group before per-type truncation.
    pub total_servers: usize,
    pub total_tools: usize,
    pub total_agents: usize,
    /// True when the embedding provider was unavailable and the ranking
    /// fell back to keyword-only scoring.
    #[serde(default)]
    pub degraded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_defaults() {
        let req: SearchRequest = serde_json::from_str(r#"{"query": "weather"}"#)
            .expect("minimal request parses");
        assert_eq!(req.max_results, None);
        assert!(req.entity_types.is_empty());
        assert!(req.wants(EntityKind::Server));
        assert!(req.wants(EntityKind::Agent));
    }

    #[test]
    fn entity_type_filter() {
        let req: SearchRequest =
            serde_json::from_str(r#"{"query": "q", "entity_types": ["tool"], "max_results": 5}"#)
                .expect("request parses");
        assert!(req.wants(EntityKind::Tool));
        assert!(!req.wants(EntityKind::Server));
        assert_eq!(req.max_results, Some(5));
    }
}
