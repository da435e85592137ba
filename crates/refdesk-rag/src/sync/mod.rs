//! Corpus synchronization: resolution and folder ingestion

mod engine;
mod resolver;

pub use engine::IngestionEngine;
pub use resolver::CorpusResolver;
