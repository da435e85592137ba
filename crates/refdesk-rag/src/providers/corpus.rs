//! Corpus service trait for managing remote document corpora

use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;
use crate::types::{CorpusRecord, RagFileRecord};

/// Trait for the remote corpus service
///
/// Implementations:
/// - `VertexRagClient`: Vertex AI RAG Engine corpora
#[async_trait]
pub trait CorpusService: Send + Sync {
    /// List all corpora in the configured project and location
    async fn list_corpora(&self) -> Result<Vec<CorpusRecord>>;

    /// Create a corpus with the given display name and description.
    ///
    /// The embedding configuration applied to the new corpus is fixed by
    /// the implementation's configuration.
    async fn create_corpus(&self, display_name: &str, description: &str) -> Result<CorpusRecord>;

    /// Upload one local file into a corpus.
    ///
    /// Returns the registered file record on success. Quota exhaustion is
    /// reported as the distinguished quota error so callers can defer the
    /// file instead of treating it as failed.
    async fn upload_file(
        &self,
        corpus: &str,
        path: &Path,
        display_name: &str,
        description: &str,
    ) -> Result<RagFileRecord>;

    /// List the files registered in a corpus
    async fn list_files(&self, corpus: &str) -> Result<Vec<RagFileRecord>>;

    /// Check if the service is reachable and credentials work
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
