//! Lexical matching: query tokenization and per-field boosts.
//!
//! The lexical pass is intentionally simple — substring containment of
//! query tokens against structured fields, with a fixed additive weight per
//! match location. It exists to guarantee that literal name/path matches
//! surface near the top even when the semantic signal is weak; ranking
//! sophistication (BM25, stemming, fuzzy matching) is out of scope.

use std::sync::OnceLock;

use regex::Regex;

use crate::model::{DocDetail, IndexedDocument};

/// Additive boost per distinct match location (not per token).
pub const PATH_BOOST: f32 = 5.0;
pub const NAME_BOOST: f32 = 3.0;
pub const DESCRIPTION_BOOST: f32 = 2.0;
pub const TAG_BOOST: f32 = 1.5;
/// Applied once per matched tool or skill.
pub const ITEM_BOOST: f32 = 1.0;

/// Tokens shorter than this carry too little signal and are dropped.
const MIN_TOKEN_LEN: usize = 3;

/// Fixed stopword list dropped from queries.
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "how", "in", "is",
    "it", "its", "of", "on", "or", "that", "the", "to", "was", "were", "what", "which", "will",
    "with",
];

fn token_split() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\W+").expect("token split pattern is valid"))
}

/// Lexical outcome for one document.
#[derive(Debug, Clone, Default)]
pub struct KeywordMatch {
    /// Sum of location boosts; 0 when nothing matched.
    pub boost: f32,
    /// Names of the tools or skills that matched.
    pub matched_items: Vec<String>,
}

/// Split a query into lowercase keyword tokens.
///
/// Non-word characters are stripped, stopwords and tokens shorter than
/// three characters are dropped.
pub fn tokenize(query: &str) -> Vec<String> {
    let lowered = query.to_lowercase();
    token_split()
        .split(&lowered)
        .filter(|t| t.len() >= MIN_TOKEN_LEN && !STOPWORDS.contains(t))
        .map(str::to_string)
        .collect()
}

/// Score one document against pre-tokenized query keywords.
pub fn match_document(tokens: &[String], doc: &IndexedDocument) -> KeywordMatch {
    if tokens.is_empty() {
        return KeywordMatch::default();
    }

    let contains_any =
        |haystack: &str| tokens.iter().any(|t| haystack.contains(t.as_str()));

    let mut boost = 0.0;

    if contains_any(&doc.path.to_lowercase()) {
        boost += PATH_BOOST;
    }
    if contains_any(&doc.name.to_lowercase()) {
        boost += NAME_BOOST;
    }
    if contains_any(&doc.description.to_lowercase()) {
        boost += DESCRIPTION_BOOST;
    }
    if doc
        .tags
        .iter()
        .any(|tag| contains_any(&tag.to_lowercase()))
    {
        boost += TAG_BOOST;
    }

    let mut matched_items = Vec::new();
    match &doc.detail {
        DocDetail::Server { tools } => {
            for tool in tools {
                if contains_any(&tool.name.to_lowercase())
                    || contains_any(&tool.description.to_lowercase())
                {
                    boost += ITEM_BOOST;
                    matched_items.push(tool.name.clone());
                }
            }
        }
        DocDetail::Agent { skills, .. } => {
            for skill in skills {
                if contains_any(&skill.name.to_lowercase())
                    || contains_any(&skill.description.to_lowercase())
                {
                    boost += ITEM_BOOST;
                    matched_items.push(skill.name.clone());
                }
            }
        }
    }

    KeywordMatch {
        boost,
        matched_items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SkillDef, ToolDef};
    use std::collections::BTreeSet;

    fn server_doc() -> IndexedDocument {
        IndexedDocument {
            path: "/context7".into(),
            name: "context7".into(),
            description: "documentation search".into(),
            tags: ["docs".to_string(), "library".to_string()].into_iter().collect(),
            enabled: true,
            embedding: vec![0.0; 4],
            detail: DocDetail::Server {
                tools: vec![
                    ToolDef {
                        name: "query-docs".into(),
                        description: "look up library documentation".into(),
                        input_schema: serde_json::Value::Null,
                    },
                    ToolDef {
                        name: "resolve-library".into(),
                        description: "map a package name to a library id".into(),
                        input_schema: serde_json::Value::Null,
                    },
                ],
            },
        }
    }

    #[test]
    fn tokenize_strips_stopwords_and_short_tokens()  {
        assert_eq!(
            tokenize("What is the weather API for NY?"),
            vec!["weather", "api"]
        );
        assert!(tokenize("is a to of").is_empty());
        assert_eq!(tokenize("context7"), vec!["context7"]);
    }

    #[test]
    fn boosts_are_additive_per_location() {
        let doc = server_doc();
        // "context7" appears in path and name, nowhere else.
        let m = match_document(&tokenize("context7"), &doc);
        assert_eq!(m.boost, PATH_BOOST + NAME_BOOST);
        assert!(m.matched_items.is_empty());
    }

    #[test]
    fn each_matched_tool_adds_one_boost() {
        let doc = server_doc();
        // "documentation" hits description + both tools' text; "library"
        // additionally hits a tag.
        let m = match_document(&tokenize("library documentation"), &doc);
        assert_eq!(
            m.boost,
            DESCRIPTION_BOOST + TAG_BOOST + 2.0 * ITEM_BOOST
        );
        assert_eq!(m.matched_items, vec!["query-docs", "resolve-library"]);
    }

    #[test]
    fn multiple_tokens_in_one_location_boost_once() {
        let doc = server_doc();
        // Both tokens hit the description; the location still counts once.
        let m = match_document(&tokenize("documentation search"), &doc);
        assert_eq!(m.boost, DESCRIPTION_BOOST + ITEM_BOOST);
        // Description contributed exactly once regardless of token count.
        let single = match_document(&tokenize("documentation"), &doc);
        let double = match_document(&tokenize("documentation documentation2"), &doc);
        assert_eq!(single.boost, double.boost);
    }

    #[test]
    fn no_match_yields_zero_boost() {
        let doc = server_doc();
        let m = match_document(&tokenize("underwater basket weaving"), &doc);
        assert_eq!(m.boost, 0.0);
        assert!(m.matched_items.is_empty());
    }

    #[test]
    fn agent_skills_match_like_tools() {
        let doc = IndexedDocument {
            path: "/planner".into(),
            name: "planner".into(),
            description: "task planning agent".into(),
            tags: BTreeSet::new(),
            enabled: true,
            embedding: vec![0.0; 4],
            detail: DocDetail::Agent {
                capabilities: BTreeSet::new(),
                skills: vec![SkillDef {
                    name: "scheduling".into(),
                    description: "orders work across deadlines".into(),
                }],
            },
        };
        let m = match_document(&tokenize("scheduling"), &doc);
        assert_eq!(m.boost, ITEM_BOOST);
        assert_eq!(m.matched_items, vec!["scheduling"]);
    }
}
