//! Corpus and corpus-file records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A remote document corpus.
///
/// `resource_name` is the full remote identifier
/// (`projects/{project}/locations/{location}/ragCorpora/{id}`) and is what
/// retrieval tools bind to; `display_name` is the human-chosen name used
/// for resolution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CorpusRecord {
    /// Full remote resource name
    pub resource_name: String,
    /// Display name used for resolution
    pub display_name: String,
    /// Corpus description
    #[serde(default)]
    pub description: String,
}

impl CorpusRecord {
    /// Trailing numeric id of the resource name, for compact logging
    pub fn short_id(&self) -> &str {
        self.resource_name
            .rsplit('/')
            .next()
            .unwrap_or(&self.resource_name)
    }
}

/// A file registered in a remote corpus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagFileRecord {
    /// Full remote resource name of the file
    pub resource_name: String,
    /// Display name attached at upload time
    pub display_name: String,
    /// Description attached at upload time
    #[serde(default)]
    pub description: String,
    /// When the remote service registered the file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
}
