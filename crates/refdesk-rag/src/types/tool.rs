//! Declarative tool descriptions for pipeline stages
//!
//! A `ToolSpec` describes a capability a stage may exercise. Bindings are
//! declarative; the stage runner lowers them to the remote service's native
//! tool format at request time.

use serde::{Deserialize, Serialize};

/// What a tool is bound to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ToolBinding {
    /// Semantic retrieval over a remote corpus
    CorpusRetrieval {
        /// Full corpus resource name
        corpus: String,
        /// Number of similar passages to retrieve
        similarity_top_k: u32,
        /// Maximum vector distance for a passage to qualify
        distance_threshold: f64,
    },
    /// Web search grounding
    WebSearch,
}

/// A capability available to a pipeline stage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolSpec {
    /// Tool name, referenced by stage instructions
    pub name: String,
    /// What the tool does
    pub description: String,
    /// What the tool is bound to
    pub binding: ToolBinding,
}

impl ToolSpec {
    /// Whether this tool retrieves from a corpus
    pub fn is_retrieval(&self) -> bool {
        matches!(self.binding, ToolBinding::CorpusRetrieval { .. })
    }
}
