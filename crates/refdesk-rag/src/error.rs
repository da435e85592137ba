//! Error types for corpus synchronization and the query pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for refdesk operations
pub type Result<T> = std::result::Result<T, Error>;

/// Refdesk errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (fatal at startup)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Corpus resolution error (list or create against the remote service)
    #[error("Corpus resolution failed: {0}")]
    Resolution(String),

    /// Ingestion quota exhausted on the remote service
    #[error("Ingestion quota exhausted: {0}")]
    QuotaExceeded(String),

    /// File upload error
    #[error("Failed to upload '{filename}': {message}")]
    Upload { filename: String, message: String },

    /// Scan folder does not exist or is not a directory
    #[error("Folder not found: {}", .0.display())]
    FolderNotFound(PathBuf),

    /// Ingestion ledger error
    #[error("Ledger error: {0}")]
    Ledger(String),

    /// Pipeline definition error (rejected at build time)
    #[error("Invalid pipeline: {0}")]
    Pipeline(String),

    /// Stage execution error
    #[error("Stage '{stage}' failed: {message}")]
    Stage { stage: String, message: String },

    /// Authentication error
    #[error("Authentication error: {0}")]
    Auth(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a corpus resolution error
    pub fn resolution(message: impl Into<String>) -> Self {
        Self::Resolution(message.into())
    }

    /// Create a quota error
    pub fn quota(message: impl Into<String>) -> Self {
        Self::QuotaExceeded(message.into())
    }

    /// Create an upload error
    pub fn upload(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upload {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create a ledger error
    pub fn ledger(message: impl Into<String>) -> Self {
        Self::Ledger(message.into())
    }

    /// Create a pipeline definition error
    pub fn pipeline(message: impl Into<String>) -> Self {
        Self::Pipeline(message.into())
    }

    /// Create a stage execution error
    pub fn stage(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Stage {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Create an authentication error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether this error is the remote service's quota signal
    pub fn is_quota(&self) -> bool {
        matches!(self, Self::QuotaExceeded(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::stage("retrieval", "model unavailable");
        assert_eq!(err.to_string(), "Stage 'retrieval' failed: model unavailable");

        let err = Error::upload("spec.pdf", "connection reset");
        assert_eq!(err.to_string(), "Failed to upload 'spec.pdf': connection reset");
    }

    #[test]
    fn test_quota_predicate() {
        assert!(Error::quota("project limit reached").is_quota());
        assert!(!Error::config("missing project").is_quota());
    }
}
