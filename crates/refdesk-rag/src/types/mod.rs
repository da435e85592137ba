//! Core types for corpus synchronization and the query pipeline

pub mod corpus;
pub mod ingest;
pub mod tool;

pub use corpus::{CorpusRecord, RagFileRecord};
pub use ingest::{IngestionOutcome, IngestionResult, SyncSummary};
pub use tool::{ToolBinding, ToolSpec};
