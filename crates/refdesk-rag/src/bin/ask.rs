//! Query driver
//!
//! Answers a question through the two-stage pipeline: a retrieval stage
//! grounded in the synced corpus, then an augmentation stage that
//! finalizes the answer with web search.
//!
//! Run with: cargo run -p refdesk-rag --bin refdesk-ask -- "your question"

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use refdesk_rag::config::{self, Config};
use refdesk_rag::pipeline::{default_pipeline, PipelineOrchestrator};
use refdesk_rag::providers::gcp::{GcpAuth, GeminiStageRunner};

/// Ask a question against the synced reference corpus
#[derive(Parser)]
#[command(
    name = "refdesk-ask",
    about = "Answer a question through corpus retrieval and web augmentation",
    version
)]
struct Cli {
    /// The question to answer
    #[arg(required = true)]
    query: Vec<String>,

    /// Env-style file read for settings (including the corpus reference)
    #[arg(long, default_value = ".env")]
    env_file: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let query = cli.query.join(" ");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "refdesk_rag=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load(Some(&cli.env_file))?;
    if config.corpus.reference.is_none() {
        tracing::warn!(
            "{} is not set; answering without corpus retrieval (run refdesk-sync first)",
            config::ENV_CORPUS
        );
    }

    let credentials = config
        .gcp
        .credentials_path
        .clone()
        .ok_or_else(|| anyhow::anyhow!("{} is not set", config::ENV_CREDENTIALS))?;
    let auth = Arc::new(GcpAuth::from_service_account(
        &credentials,
        config.gcp.project_id.clone(),
    )?);
    let runner = Arc::new(GeminiStageRunner::new(
        auth,
        config.gcp.location.clone(),
        config.pipeline.generation_model.clone(),
        config.pipeline.request_timeout(),
    ));

    let spec = default_pipeline(config.corpus.reference.as_deref())?;
    let orchestrator = PipelineOrchestrator::new(spec, runner);

    let answer = orchestrator.run(&query).await?;
    println!("{}", answer);

    Ok(())
}
