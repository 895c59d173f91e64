//! Core data models: registry records, indexed documents, embeddable text.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::SearchError;

/// Entity kinds addressable in a search request.
///
/// `Tool` is a result grouping only: tools are never indexed as standalone
/// documents and are always reachable via their parent server's `path`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Server,
    Tool,
    Agent,
}

/// Tool exposed by a server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDef {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// JSON schema of the tool's input. Stored for display, never embedded.
    #[serde(default)]
    pub input_schema: Value,
}

/// Skill advertised by an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillDef {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Registry record for a server entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerRecord {
    /// Unique, stable identifier; the sole upsert/delete key.
    pub path: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub tools: Vec<ToolDef>,
}

/// Registry record for an agent entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRecord {
    /// Unique, stable identifier; the sole upsert/delete key.
    pub path: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub capabilities: BTreeSet<String>,
    #[serde(default)]
    pub skills: Vec<SkillDef>,
}

fn default_enabled() -> bool {
    true
}

/// Registry record handed to the indexer by the management layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EntityRecord {
    Server(ServerRecord),
    Agent(AgentRecord),
}

impl EntityRecord {
    /// Stable identifier of the underlying entity.
    pub fn path(&self) -> &str {
        match self {
            EntityRecord::Server(s) => &s.path,
            EntityRecord::Agent(a) => &a.path,
        }
    }

    /// Check required fields. A failing record is skipped at index time.
    pub fn validate(&self) -> Result<(), SearchError> {
        let (path, name) = match self {
            EntityRecord::Server(s) => (&s.path, &s.name),
            EntityRecord::Agent(a) => (&a.path, &a.name),
        };
        if path.trim().is_empty() {
            return Err(SearchError::MalformedEntity {
                path: path.clone(),
                reason: "empty path".into(),
            });
        }
        if name.trim().is_empty() {
            return Err(SearchError::MalformedEntity {
                path: path.clone(),
                reason: "empty name".into(),
            });
        }
        Ok(())
    }
}

/// Entity-type-specific payload of an indexed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DocDetail {
    Server {
        tools: Vec<ToolDef>,
    },
    Agent {
        capabilities: BTreeSet<String>,
        skills: Vec<SkillDef>,
    },
}

/// One indexed document per registry entity, keyed by `path`.
///
/// Immutable between updates: an upsert replaces the whole document, so a
/// concurrent query observes either the old or the new version, never a
/// partially written one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedDocument {
    pub path: String,
    pub name: String,
    pub description: String,
    pub tags: BTreeSet<String>,
    pub enabled: bool,
    /// Vector of the entity's embeddable text. Length always equals the
    /// collection's configured dimension (checked on every upsert).
    pub embedding: Vec<f32>,
    pub detail: DocDetail,
}

impl IndexedDocument {
    /// Which result group this document belongs to.
    pub fn kind(&self) -> EntityKind {
        match self.detail {
            DocDetail::Server { .. } => EntityKind::Server,
            DocDetail::Agent { .. } => EntityKind::Agent,
        }
    }

    /// Build a document from a registry record and its computed vector.
    pub fn from_record(record: &EntityRecord, embedding: Vec<f32>) -> Self {
        match record {
            EntityRecord::Server(s) => Self {
                path: s.path.clone(),
                name: s.name.clone(),
                description: s.description.clone(),
                tags: s.tags.clone(),
                enabled: s.enabled,
                embedding,
                detail: DocDetail::Server {
                    tools: s.tools.clone(),
                },
            },
            EntityRecord::Agent(a) => Self {
                path: a.path.clone(),
                name: a.name.clone(),
                description: a.description.clone(),
                tags: a.tags.clone(),
                enabled: a.enabled,
                embedding,
                detail: DocDetail::Agent {
                    capabilities: a.capabilities.clone(),
                    skills: a.skills.clone(),
                },
            },
        }
    }
}

/// Build the text that is vectorized for a record.
///
/// Servers contribute name, description, tags, and each tool's name and
/// description; agents additionally contribute capabilities and skills.
/// `path` and tool input schemas are kept on the document for display and
/// lexical matching but are never embedded.
pub fn embeddable_text(record: &EntityRecord) -> String {
    let mut parts: Vec<String> = Vec::new();

    match record {
        EntityRecord::Server(s) => {
            push_nonempty(&mut parts, &s.name);
            push_nonempty(&mut parts, &s.description);
            if !s.tags.is_empty() {
                parts.push(format!("Tags: {}", join_set(&s.tags)));
            }
            for tool in &s.tools {
                push_nonempty(&mut parts, &tool.name);
                push_nonempty(&mut parts, &tool.description);
            }
        }
        EntityRecord::Agent(a) => {
            push_nonempty(&mut parts, &a.name);
            push_nonempty(&mut parts, &a.description);
            if !a.tags.is_empty() {
                parts.push(format!("Tags: {}", join_set(&a.tags)));
            }
            if !a.capabilities.is_empty() {
                parts.push(format!("Capabilities: {}", join_set(&a.capabilities)));
            }
            for skill in &a.skills {
                push_nonempty(&mut parts, &skill.name);
                push_nonempty(&mut parts, &skill.description);
            }
        }
    }

    parts.join("\n")
}

fn push_nonempty(parts: &mut Vec<String>, s: &str) {
    let s = s.trim();
    if !s.is_empty() {
        parts.push(s.to_string());
    }
}

fn join_set(set: &BTreeSet<String>) -> String {
    set.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}
