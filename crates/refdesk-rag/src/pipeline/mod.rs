//! Two-stage retrieve-then-augment query pipeline
//!
//! The standard pipeline runs a retrieval stage that drafts an answer from
//! the corpus, then an augmentation stage that finalizes it with web
//! search. Stage outputs flow through per-run [`StageState`].

mod capability;
mod orchestrator;
mod prompts;
mod spec;
mod state;

pub use capability::{
    build_tools, web_search_tool, RETRIEVAL_TOOL_NAME, SIMILARITY_TOP_K, VECTOR_DISTANCE_THRESHOLD,
};
pub use orchestrator::PipelineOrchestrator;
pub use prompts::{augmentation_instruction, retrieval_instruction};
pub use spec::{PipelineSpec, StageSpec};
pub use state::{placeholders, StageState};

use crate::error::Result;

/// Name of the retrieval stage
pub const RETRIEVAL_STAGE: &str = "retrieval";
/// Name of the augmentation stage
pub const AUGMENTATION_STAGE: &str = "augmentation";
/// State key the retrieval stage writes
pub const RAG_RESPONSE_KEY: &str = "rag_response";
/// State key the augmentation stage writes; the pipeline's return value
pub const FINAL_RESPONSE_KEY: &str = "final_response";

/// Build the standard two-stage pipeline.
///
/// The retrieval stage carries the corpus retrieval tool when a corpus
/// reference is configured, and no tools otherwise; the augmentation stage
/// always carries web search and consumes the retrieval draft via
/// `{rag_response}`.
pub fn default_pipeline(corpus_reference: Option<&str>) -> Result<PipelineSpec> {
    PipelineSpec::new(vec![
        StageSpec::new(
            RETRIEVAL_STAGE,
            retrieval_instruction(),
            build_tools(corpus_reference),
            RAG_RESPONSE_KEY,
        ),
        StageSpec::new(
            AUGMENTATION_STAGE,
            augmentation_instruction(),
            vec![web_search_tool()],
            FINAL_RESPONSE_KEY,
        ),
    ])
}
