//! Retrieval capability wiring
//!
//! Pure construction of the tool set for the retrieval stage, evaluated
//! once when the pipeline is built. No corpus reference means no tools;
//! the pipeline still runs without corpus access.

use crate::types::{ToolBinding, ToolSpec};

/// Name of the retrieval tool, referenced by the retrieval instruction
pub const RETRIEVAL_TOOL_NAME: &str = "retrieve_reference_docs";
/// Passages retrieved per query
pub const SIMILARITY_TOP_K: u32 = 10;
/// Maximum vector distance for a retrieved passage to qualify
pub const VECTOR_DISTANCE_THRESHOLD: f64 = 0.6;

/// Build the retrieval stage's tool set for an optional corpus reference.
///
/// A missing or blank reference yields no tools. A present reference
/// yields exactly one retrieval tool bound to that corpus with the fixed
/// retrieval policy above.
pub fn build_tools(corpus_reference: Option<&str>) -> Vec<ToolSpec> {
    match corpus_reference.map(str::trim).filter(|r| !r.is_empty()) {
        Some(corpus) => vec![ToolSpec {
            name: RETRIEVAL_TOOL_NAME.to_string(),
            description: "Retrieve relevant passages from the reference document corpus"
                .to_string(),
            binding: ToolBinding::CorpusRetrieval {
                corpus: corpus.to_string(),
                similarity_top_k: SIMILARITY_TOP_K,
                distance_threshold: VECTOR_DISTANCE_THRESHOLD,
            },
        }],
        None => Vec::new(),
    }
}

/// Web-search tool for the augmentation stage
pub fn web_search_tool() -> ToolSpec {
    ToolSpec {
        name: "web_search".to_string(),
        description: "Search the web for supplementary or corroborating information".to_string(),
        binding: ToolBinding::WebSearch,
    }
}
