//! Ingestion outcome types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Outcome of a single file's upload attempt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IngestionOutcome {
    /// Upload confirmed by the remote service; the file is now tracked
    Uploaded,
    /// The remote service reported quota exhaustion; not tracked, retried
    /// on the next sync run
    QuotaExceeded,
    /// Upload failed for any other reason; not tracked
    Failed {
        /// Why the upload failed
        reason: String,
    },
}

/// Result for one file in a sync batch.
///
/// Files skipped because the ledger already tracks them produce no result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionResult {
    /// Absolute path of the file
    pub path: PathBuf,
    /// What happened to it
    pub outcome: IngestionOutcome,
}

impl IngestionResult {
    /// Result for a confirmed upload
    pub fn uploaded(path: PathBuf) -> Self {
        Self {
            path,
            outcome: IngestionOutcome::Uploaded,
        }
    }

    /// Result for a quota-exhausted upload attempt
    pub fn quota_exceeded(path: PathBuf) -> Self {
        Self {
            path,
            outcome: IngestionOutcome::QuotaExceeded,
        }
    }

    /// Result for a failed upload attempt
    pub fn failed(path: PathBuf, reason: impl Into<String>) -> Self {
        Self {
            path,
            outcome: IngestionOutcome::Failed {
                reason: reason.into(),
            },
        }
    }

    /// Whether this file was uploaded and tracked
    pub fn is_uploaded(&self) -> bool {
        matches!(self.outcome, IngestionOutcome::Uploaded)
    }
}

/// Counts over a sync batch, for the end-of-run report
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncSummary {
    /// Files uploaded and newly tracked
    pub uploaded: usize,
    /// Files deferred by quota exhaustion
    pub quota_exceeded: usize,
    /// Files that failed to upload
    pub failed: usize,
}

impl SyncSummary {
    /// Tally outcomes from a batch
    pub fn tally(results: &[IngestionResult]) -> Self {
        let mut summary = Self::default();
        for result in results {
            match result.outcome {
                IngestionOutcome::Uploaded => summary.uploaded += 1,
                IngestionOutcome::QuotaExceeded => summary.quota_exceeded += 1,
                IngestionOutcome::Failed { .. } => summary.failed += 1,
            }
        }
        summary
    }
}

impl fmt::Display for SyncSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} uploaded, {} deferred by quota, {} failed",
            self.uploaded, self.quota_exceeded, self.failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally() {
        let results = vec![
            IngestionResult::uploaded(PathBuf::from("/docs/a.pdf")),
            IngestionResult::quota_exceeded(PathBuf::from("/docs/b.pdf")),
            IngestionResult::failed(PathBuf::from("/docs/c.pdf"), "connection reset"),
            IngestionResult::uploaded(PathBuf::from("/docs/d.pdf")),
        ];
        let summary = SyncSummary::tally(&results);
        assert_eq!(summary.uploaded, 2);
        assert_eq!(summary.quota_exceeded, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.to_string(), "2 uploaded, 1 deferred by quota, 1 failed");
    }

    #[test]
    fn test_outcome_serialization() {
        let result = IngestionResult::failed(PathBuf::from("/docs/c.pdf"), "timeout");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["outcome"]["failed"]["reason"], "timeout");
    }
}
