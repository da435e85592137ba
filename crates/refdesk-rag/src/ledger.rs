//! Durable per-folder ingestion ledger
//!
//! The ledger is a plain-text file inside the scanned folder, one absolute
//! path per line. It is the record of which files have already been
//! successfully uploaded, so reruns of the sync never re-upload. The file
//! is read once when the ledger is opened; marks append to it.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Ledger file name inside the scanned folder.
///
/// The folder enumerator must skip this file; it is bookkeeping, not
/// corpus content.
pub const LEDGER_FILE_NAME: &str = ".refdesk-ledger";

/// In-memory view of a folder's ingestion ledger
#[derive(Debug)]
pub struct FileLedger {
    ledger_path: PathBuf,
    tracked: HashSet<PathBuf>,
}

impl FileLedger {
    /// Open the ledger for a folder, loading the ledger file into memory.
    ///
    /// A missing ledger file means nothing is tracked yet. A missing
    /// folder is an error.
    pub fn open(folder: &Path) -> Result<Self> {
        if !folder.is_dir() {
            return Err(Error::FolderNotFound(folder.to_path_buf()));
        }
        let ledger_path = folder.join(LEDGER_FILE_NAME);
        let mut tracked = HashSet::new();
        if ledger_path.exists() {
            let contents = fs::read_to_string(&ledger_path)?;
            for line in contents.lines() {
                let line = line.trim();
                if !line.is_empty() {
                    tracked.insert(PathBuf::from(line));
                }
            }
        }
        tracing::debug!(
            "Ledger {} tracks {} files",
            ledger_path.display(),
            tracked.len()
        );
        Ok(Self {
            ledger_path,
            tracked,
        })
    }

    /// Whether a path has already been ingested
    pub fn is_tracked(&self, path: &Path) -> bool {
        self.tracked.contains(path)
    }

    /// Record a successful ingestion.
    ///
    /// Idempotent: marking an already-tracked path neither duplicates the
    /// line on disk nor errors. Callers must only mark paths whose upload
    /// the remote service has confirmed.
    pub fn mark_tracked(&mut self, path: &Path) -> Result<()> {
        if self.tracked.contains(path) {
            return Ok(());
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.ledger_path)
            .map_err(|e| {
                Error::ledger(format!("cannot open {}: {}", self.ledger_path.display(), e))
            })?;
        writeln!(file, "{}", path.display()).map_err(|e| {
            Error::ledger(format!(
                "cannot append to {}: {}",
                self.ledger_path.display(),
                e
            ))
        })?;
        self.tracked.insert(path.to_path_buf());
        Ok(())
    }

    /// Number of tracked files
    pub fn len(&self) -> usize {
        self.tracked.len()
    }

    /// Whether nothing is tracked
    pub fn is_empty(&self) -> bool {
        self.tracked.is_empty()
    }

    /// Path of the underlying ledger file
    pub fn ledger_path(&self) -> &Path {
        &self.ledger_path
    }
}
