//! refdesk-rag: corpus-synchronized retrieval-augmented question answering
//!
//! Two cooperating halves: an idempotent sync engine that resolves (or
//! creates) a named Vertex AI RAG corpus and uploads every not-yet-tracked
//! file from a local folder into it, and a two-stage query pipeline that
//! drafts an answer from the corpus and then finalizes it with web search.
//! A durable per-folder ledger keeps reruns from re-uploading files.

pub mod config;
pub mod error;
pub mod ledger;
pub mod pipeline;
pub mod providers;
pub mod sync;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use ledger::FileLedger;
pub use pipeline::{default_pipeline, PipelineOrchestrator, PipelineSpec, StageSpec};
pub use sync::{CorpusResolver, IngestionEngine};
pub use types::{CorpusRecord, IngestionOutcome, IngestionResult, RagFileRecord, ToolSpec};
