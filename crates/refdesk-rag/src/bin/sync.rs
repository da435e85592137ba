//! Corpus sync driver
//!
//! Resolves (or creates) the configured corpus, records its reference in
//! the env file, uploads every untracked file from a folder, and prints
//! the corpus inventory.
//!
//! Run with: cargo run -p refdesk-rag --bin refdesk-sync -- <folder>

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use refdesk_rag::config::{self, Config};
use refdesk_rag::providers::gcp::{GcpAuth, VertexRagClient};
use refdesk_rag::providers::CorpusService;
use refdesk_rag::sync::{CorpusResolver, IngestionEngine};
use refdesk_rag::types::{IngestionOutcome, SyncSummary};

/// Synchronize a folder of reference documents into the remote corpus
#[derive(Parser)]
#[command(
    name = "refdesk-sync",
    about = "Synchronize a folder of reference documents into a Vertex AI RAG corpus",
    version
)]
struct Cli {
    /// Folder whose files are uploaded (non-recursive)
    folder: PathBuf,

    /// Env-style file read for settings and updated with the resolved
    /// corpus reference
    #[arg(long, default_value = ".env")]
    env_file: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "refdesk_rag=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load(Some(&cli.env_file))?;
    tracing::info!("Configuration loaded");
    tracing::info!("  - Project: {}", config.gcp.project_id);
    tracing::info!("  - Location: {}", config.gcp.location);
    tracing::info!("  - Corpus display name: {}", config.corpus.display_name);
    tracing::info!("  - Embedding model: {}", config.corpus.embedding_model);

    let credentials = config
        .gcp
        .credentials_path
        .clone()
        .ok_or_else(|| anyhow::anyhow!("{} is not set", config::ENV_CREDENTIALS))?;
    let auth = Arc::new(GcpAuth::from_service_account(
        &credentials,
        config.gcp.project_id.clone(),
    )?);
    let service: Arc<dyn CorpusService> = Arc::new(VertexRagClient::new(
        auth,
        config.gcp.location.clone(),
        config.corpus.embedding_model.clone(),
        config.pipeline.request_timeout(),
    ));

    // Resolve or create the corpus
    let resolver = CorpusResolver::new(service.clone());
    let corpus = resolver
        .resolve_or_create(&config.corpus.display_name, &config.corpus.description)
        .await?;
    println!("Corpus: {} ({})", corpus.display_name, corpus.resource_name);

    // Record the reference so the query pipeline picks it up
    config::persist_corpus_reference(&cli.env_file, &corpus.resource_name)?;

    // Upload whatever the ledger does not yet track
    let engine = IngestionEngine::new(
        service.clone(),
        config.corpus.file_display_name.clone(),
        config.corpus.file_description.clone(),
    );
    let results = engine.sync_folder(&corpus, &cli.folder).await?;

    for result in &results {
        match &result.outcome {
            IngestionOutcome::Uploaded => {
                println!("  uploaded  {}", result.path.display())
            }
            IngestionOutcome::QuotaExceeded => {
                println!("  deferred  {} (quota exhausted, rerun later)", result.path.display())
            }
            IngestionOutcome::Failed { reason } => {
                println!("  failed    {} ({})", result.path.display(), reason)
            }
        }
    }
    println!("Sync finished: {}", SyncSummary::tally(&results));

    // Remote inventory after the sync
    let files = service.list_files(&corpus.resource_name).await?;
    println!("\nCorpus holds {} files:", files.len());
    for file in &files {
        match &file.create_time {
            Some(created) => println!(
                "  {}  {}  ({})",
                file.display_name,
                file.resource_name,
                created.to_rfc3339()
            ),
            None => println!("  {}  {}", file.display_name, file.resource_name),
        }
    }

    Ok(())
}
