//! Folder ingestion engine
//!
//! Uploads every not-yet-tracked file from a local folder into a corpus.
//! Enumeration is non-recursive; the per-folder ledger decides which files
//! are skipped; one file's failure never aborts the batch.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::ledger::{FileLedger, LEDGER_FILE_NAME};
use crate::providers::CorpusService;
use crate::types::{CorpusRecord, IngestionResult, SyncSummary};

/// Uploads folder contents into a corpus
pub struct IngestionEngine {
    service: Arc<dyn CorpusService>,
    file_display_name: String,
    file_description: String,
}

impl IngestionEngine {
    /// Create an engine over a corpus service.
    ///
    /// Every uploaded file carries the same display name and description.
    pub fn new(
        service: Arc<dyn CorpusService>,
        file_display_name: String,
        file_description: String,
    ) -> Self {
        Self {
            service,
            file_display_name,
            file_description,
        }
    }

    /// Upload every untracked file directly inside `folder` into `corpus`.
    ///
    /// Files already in the ledger are skipped and produce no result entry.
    /// A successful upload is marked in the ledger before the next file is
    /// attempted; quota exhaustion and other upload failures leave the file
    /// untracked so a later run retries it. The batch continues past any
    /// per-file outcome.
    pub async fn sync_folder(
        &self,
        corpus: &CorpusRecord,
        folder: &Path,
    ) -> Result<Vec<IngestionResult>> {
        let folder = absolutize(folder)?;
        let mut ledger = FileLedger::open(&folder)?;
        let files = enumerate_files(&folder)?;
        tracing::info!(
            "Syncing {} files from {} into corpus '{}' via {}",
            files.len(),
            folder.display(),
            corpus.display_name,
            self.service.name()
        );

        let mut results = Vec::new();
        let mut skipped = 0usize;
        for path in files {
            if ledger.is_tracked(&path) {
                tracing::info!("[{}] Already tracked, skipping", file_label(&path));
                skipped += 1;
                continue;
            }

            match self
                .service
                .upload_file(
                    &corpus.resource_name,
                    &path,
                    &self.file_display_name,
                    &self.file_description,
                )
                .await
            {
                Ok(file) => {
                    // Track only after the service confirmed the upload
                    ledger.mark_tracked(&path)?;
                    tracing::info!("[{}] Uploaded as {}", file_label(&path), file.resource_name);
                    results.push(IngestionResult::uploaded(path));
                }
                Err(e) if e.is_quota() => {
                    tracing::warn!(
                        "[{}] Quota exhausted, deferring to a later run: {}",
                        file_label(&path),
                        e
                    );
                    results.push(IngestionResult::quota_exceeded(path));
                }
                Err(e) => {
                    tracing::error!("[{}] Upload failed: {}", file_label(&path), e);
                    results.push(IngestionResult::failed(path, e.to_string()));
                }
            }
        }

        let summary = SyncSummary::tally(&results);
        tracing::info!(
            "Sync of {} complete: {}, {} skipped as already tracked",
            folder.display(),
            summary,
            skipped
        );
        Ok(results)
    }
}

/// Regular files directly inside `folder`, sorted by name.
///
/// Subdirectories are ignored (no recursion) and the ledger file is never
/// a candidate for upload.
fn enumerate_files(folder: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(folder).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FolderNotFound(folder.to_path_buf())
        } else {
            Error::Io(e)
        }
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if path
            .file_name()
            .map(|name| name == LEDGER_FILE_NAME)
            .unwrap_or(false)
        {
            continue;
        }
        files.push(path);
    }
    files.sort();
    Ok(files)
}

/// Resolve a path against the current working directory without touching
/// symlinks
fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

fn file_label(path: &Path) -> &str {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("<non-utf8>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{default_pipeline, PipelineOrchestrator, RETRIEVAL_TOOL_NAME};
    use crate::providers::StageRunner;
    use crate::sync::CorpusResolver;
    use crate::types::{IngestionOutcome, RagFileRecord, ToolBinding, ToolSpec};
    use async_trait::async_trait;
    use std::collections::{HashSet, VecDeque};
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FakeUploader {
        /// Corpora known to the remote side
        corpora: Mutex<Vec<CorpusRecord>>,
        /// Corpus create calls issued
        create_calls: AtomicUsize,
        /// File names uploaded successfully, in order
        uploads: Mutex<Vec<String>>,
        /// File names that currently hit the quota
        quota_files: Mutex<HashSet<String>>,
        /// File names that currently fail outright
        fail_files: Mutex<HashSet<String>>,
    }

    impl FakeUploader {
        fn new() -> Self {
            Self {
                corpora: Mutex::new(Vec::new()),
                create_calls: AtomicUsize::new(0),
                uploads: Mutex::new(Vec::new()),
                quota_files: Mutex::new(HashSet::new()),
                fail_files: Mutex::new(HashSet::new()),
            }
        }

        fn uploads(&self) -> Vec<String> {
            self.uploads.lock().unwrap().clone()
        }

        fn set_quota(&self, names: &[&str]) {
            *self.quota_files.lock().unwrap() = names.iter().map(|s| s.to_string()).collect();
        }

        fn set_failing(&self, names: &[&str]) {
            *self.fail_files.lock().unwrap() = names.iter().map(|s| s.to_string()).collect();
        }
    }

    #[async_trait]
    impl CorpusService for FakeUploader {
        async fn list_corpora(&self) -> Result<Vec<CorpusRecord>> {
            Ok(self.corpora.lock().unwrap().clone())
        }

        async fn create_corpus(
            &self,
            display_name: &str,
            description: &str,
        ) -> Result<CorpusRecord> {
            let n = self.create_calls.fetch_add(1, Ordering::SeqCst);
            let created = CorpusRecord {
                resource_name: format!(
                    "projects/demo/locations/us-central1/ragCorpora/{}",
                    100 + n
                ),
                display_name: display_name.to_string(),
                description: description.to_string(),
            };
            self.corpora.lock().unwrap().push(created.clone());
            Ok(created)
        }

        async fn upload_file(
            &self,
            _corpus: &str,
            path: &Path,
            display_name: &str,
            _description: &str,
        ) -> Result<RagFileRecord> {
            let name = file_label(path).to_string();
            if self.quota_files.lock().unwrap().contains(&name) {
                return Err(Error::quota(format!("upload of '{}' rejected", name)));
            }
            if self.fail_files.lock().unwrap().contains(&name) {
                return Err(Error::upload(&name, "backend unavailable"));
            }
            let mut uploads = self.uploads.lock().unwrap();
            uploads.push(name);
            Ok(RagFileRecord {
                resource_name: format!(
                    "projects/demo/locations/us-central1/ragCorpora/7/ragFiles/{}",
                    uploads.len()
                ),
                display_name: display_name.to_string(),
                description: String::new(),
                create_time: None,
            })
        }

        async fn list_files(&self, _corpus: &str) -> Result<Vec<RagFileRecord>> {
            Ok(Vec::new())
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    struct CannedStageRunner {
        /// Stage outputs handed back in order
        responses: Mutex<VecDeque<String>>,
        /// Tools each invocation carried
        tools_seen: Mutex<Vec<Vec<ToolSpec>>>,
    }

    impl CannedStageRunner {
        fn scripted(responses: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.iter().map(|r| r.to_string()).collect()),
                tools_seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl StageRunner for CannedStageRunner {
        async fn invoke(
            &self,
            _instruction: &str,
            _query: &str,
            tools: &[ToolSpec],
        ) -> Result<String> {
            self.tools_seen.lock().unwrap().push(tools.to_vec());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| Error::internal("no canned response left"))
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "canned"
        }

        fn model(&self) -> &str {
            "canned-model"
        }
    }

    fn test_corpus() -> CorpusRecord {
        CorpusRecord {
            resource_name: "projects/demo/locations/us-central1/ragCorpora/7".to_string(),
            display_name: "refdesk-library".to_string(),
            description: String::new(),
        }
    }

    fn engine_over(service: Arc<FakeUploader>) -> IngestionEngine {
        IngestionEngine::new(
            service,
            "reference-document".to_string(),
            "Reference document ingested by refdesk-sync".to_string(),
        )
    }

    #[tokio::test]
    async fn test_sync_uploads_and_tracks_each_file_once() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        fs::write(dir.path().join("b.txt"), "beta").unwrap();

        let service = Arc::new(FakeUploader::new());
        let engine = engine_over(service.clone());
        let corpus = test_corpus();

        let first = engine.sync_folder(&corpus, dir.path()).await.unwrap();
        assert_eq!(first.len(), 2);
        assert!(first.iter().all(IngestionResult::is_uploaded));
        assert_eq!(service.uploads(), vec!["a.txt", "b.txt"]);

        // Rerun: everything is tracked, nothing re-uploads, no result entries
        let second = engine.sync_folder(&corpus, dir.path()).await.unwrap();
        assert!(second.is_empty());
        assert_eq!(service.uploads().len(), 2);
    }

    #[tokio::test]
    async fn test_quota_on_one_file_does_not_stop_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        fs::write(dir.path().join("b.txt"), "beta").unwrap();

        let service = Arc::new(FakeUploader::new());
        service.set_quota(&["a.txt"]);
        let engine = engine_over(service.clone());
        let corpus = test_corpus();

        let results = engine.sync_folder(&corpus, dir.path()).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].outcome, IngestionOutcome::QuotaExceeded);
        assert!(results[1].is_uploaded());
        assert_eq!(service.uploads(), vec!["b.txt"]);

        // Quota lifts; the deferred file is retried, the uploaded one is not
        service.set_quota(&[]);
        let retry = engine.sync_folder(&corpus, dir.path()).await.unwrap();
        assert_eq!(retry.len(), 1);
        assert!(retry[0].is_uploaded());
        assert!(retry[0].path.ends_with("a.txt"));
        assert_eq!(service.uploads(), vec!["b.txt", "a.txt"]);
    }

    #[tokio::test]
    async fn test_failed_file_is_not_tracked_and_retries() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "alpha").unwrap();

        let service = Arc::new(FakeUploader::new());
        service.set_failing(&["a.txt"]);
        let engine = engine_over(service.clone());
        let corpus = test_corpus();

        let results = engine.sync_folder(&corpus, dir.path()).await.unwrap();
        assert_eq!(results.len(), 1);
        match &results[0].outcome {
            IngestionOutcome::Failed { reason } => {
                assert!(reason.contains("backend unavailable"))
            }
            other => panic!("expected failure, got {:?}", other),
        }

        service.set_failing(&[]);
        let retry = engine.sync_folder(&corpus, dir.path()).await.unwrap();
        assert_eq!(retry.len(), 1);
        assert!(retry[0].is_uploaded());
    }

    #[tokio::test]
    async fn test_missing_folder_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_over(Arc::new(FakeUploader::new()));

        let err = engine
            .sync_folder(&test_corpus(), &dir.path().join("absent"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::FolderNotFound(_)));
    }

    #[tokio::test]
    async fn test_ledger_file_and_subdirectories_are_not_uploaded() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("deep.txt"), "deep").unwrap();

        let service = Arc::new(FakeUploader::new());
        let engine = engine_over(service.clone());
        engine
            .sync_folder(&test_corpus(), dir.path())
            .await
            .unwrap();
        assert_eq!(service.uploads(), vec!["a.txt"]);

        // The ledger file the first run created is never itself ingested
        let results = engine
            .sync_folder(&test_corpus(), dir.path())
            .await
            .unwrap();
        assert!(results.is_empty());
        assert_eq!(service.uploads(), vec!["a.txt"]);
    }

    #[tokio::test]
    async fn test_fresh_folder_syncs_into_created_corpus_then_answers() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("spec.pdf"),
            "%PDF-1.4 the timeout is 120 seconds",
        )
        .unwrap();

        // No corpus exists yet; resolution creates one
        let service = Arc::new(FakeUploader::new());
        let resolver = CorpusResolver::new(service.clone());
        let corpus = resolver
            .resolve_or_create("refdesk-library", "Reference documents")
            .await
            .unwrap();
        assert_eq!(service.create_calls.load(Ordering::SeqCst), 1);

        // The folder's one file lands in the corpus that was just created
        let results = engine_over(service.clone())
            .sync_folder(&corpus, dir.path())
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].is_uploaded());
        assert_eq!(service.uploads(), vec!["spec.pdf"]);

        // A question then flows through both stages, with the retrieval
        // tool bound to that corpus
        let spec = default_pipeline(Some(corpus.resource_name.as_str())).unwrap();
        match &spec.stages()[0].tools()[0].binding {
            ToolBinding::CorpusRetrieval { corpus: bound, .. } => {
                assert_eq!(bound, &corpus.resource_name)
            }
            other => panic!("unexpected binding: {:?}", other),
        }

        let runner = CannedStageRunner::scripted(&[
            "spec.pdf says the timeout is 120 seconds",
            "Per spec.pdf, the timeout is 120 seconds.",
        ]);
        let orchestrator = PipelineOrchestrator::new(spec, runner.clone());
        let answer = orchestrator
            .run("what timeout does spec.pdf mandate?")
            .await
            .unwrap();
        assert_eq!(answer, "Per spec.pdf, the timeout is 120 seconds.");

        let tools_seen = runner.tools_seen.lock().unwrap();
        assert_eq!(tools_seen.len(), 2);
        assert_eq!(tools_seen[0][0].name, RETRIEVAL_TOOL_NAME);
    }

    #[tokio::test]
    async fn test_ledger_survives_engine_instances() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "alpha").unwrap();

        let service = Arc::new(FakeUploader::new());
        let corpus = test_corpus();
        engine_over(service.clone())
            .sync_folder(&corpus, dir.path())
            .await
            .unwrap();

        // A brand new engine over the same folder sees the existing ledger
        let results = engine_over(service.clone())
            .sync_folder(&corpus, dir.path())
            .await
            .unwrap();
        assert!(results.is_empty());
        assert_eq!(service.uploads().len(), 1);
    }
}
