//! Command-line interface

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::api::{self, ApiState};
use crate::auth;
use crate::classifier::RelevanceClassifier;
use crate::client::{GmailMailClient, MailClient, ProgressCallback};
use crate::config::Config;
use crate::drafter::DraftGenerator;
use crate::engine::{CompletionBackend, OpenAiBackend};
use crate::pipeline::IngestionPipeline;
use crate::store::Store;

#[derive(Parser, Debug)]
#[command(name = "jobmail")]
#[command(about = "Sent-mail ingestion and job-application tracking", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Path to OAuth2 credentials file
    #[arg(long, default_value = "credentials.json")]
    pub credentials: PathBuf,

    /// Path to token cache file
    #[arg(long, default_value = ".jobmail/token.json")]
    pub token_cache: PathBuf,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authenticate with the mail provider
    Auth {
        /// Force re-authentication even if token exists
        #[arg(long)]
        force: bool,
    },

    /// Ingest a batch of sent messages into the store
    Sync {
        /// Override the configured batch bound
        #[arg(long)]
        max_results: Option<usize>,
    },

    /// Serve the HTTP API
    Serve {
        /// Override the configured bind address
        #[arg(long)]
        bind: Option<String>,
    },

    /// Show store statistics
    Status,
}

pub async fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(&cli.config).await?;

    match &cli.command {
        Commands::Auth { force } => cmd_auth(&cli, *force).await,
        Commands::Sync { max_results } => cmd_sync(&cli, &config, *max_results).await,
        Commands::Serve { bind } => cmd_serve(&cli, &config, bind.clone()).await,
        Commands::Status => cmd_status(&config).await,
    }
}

async fn cmd_auth(cli: &Cli, force: bool) -> anyhow::Result<()> {
    if let Some(parent) = cli.token_cache.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    if force && cli.token_cache.exists() {
        tokio::fs::remove_file(&cli.token_cache).await?;
        info!("Removed existing token cache");
    }

    let _hub = auth::initialize_gmail_hub(&cli.credentials, &cli.token_cache).await?;
    auth::secure_token_file(&cli.token_cache).await?;

    println!("Authentication successful.");
    Ok(())
}

async fn cmd_sync(cli: &Cli, config: &Config, max_results: Option<usize>) -> anyhow::Result<()> {
    let (client, backend, store) = build_components(cli, config).await?;
    let pipeline = IngestionPipeline::new(
        client,
        backend,
        store,
        config.sync.label.clone(),
        config.sync.page_size,
    );

    let max_results = max_results.unwrap_or(config.sync.max_results);

    let bar = ProgressBar::new(max_results as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed:>6}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")
            .unwrap()
            .progress_chars("##-"),
    );
    bar.set_message("ingesting");

    let on_progress: ProgressCallback = {
        let bar = bar.clone();
        Arc::new(move || bar.inc(1))
    };

    let summary = pipeline
        .run_with_progress(max_results, Some(on_progress))
        .await?;
    bar.finish_and_clear();

    println!("Sync complete.");
    println!(
        "Successfully synced: {}/{}",
        summary.succeeded, summary.attempted
    );
    println!("Total messages in store: {}", summary.total_in_store);
    Ok(())
}

async fn cmd_serve(cli: &Cli, config: &Config, bind: Option<String>) -> anyhow::Result<()> {
    let (client, backend, store) = build_components(cli, config).await?;

    let pipeline = Arc::new(IngestionPipeline::new(
        Arc::clone(&client),
        Arc::clone(&backend),
        Arc::clone(&store),
        config.sync.label.clone(),
        config.sync.page_size,
    ));

    let state = ApiState {
        store,
        client,
        pipeline,
        classifier: Arc::new(RelevanceClassifier::new(Arc::clone(&backend))),
        drafter: Arc::new(DraftGenerator::new(backend)),
        sync_max_results: config.sync.max_results,
    };

    let bind = bind.unwrap_or_else(|| config.api.bind.clone());
    api::serve(state, &bind).await?;
    Ok(())
}

async fn cmd_status(config: &Config) -> anyhow::Result<()> {
    let store = Store::open(&config.store.path)?;
    println!("Messages in store: {}", store.count().await?);
    Ok(())
}

async fn build_components(
    cli: &Cli,
    config: &Config,
) -> anyhow::Result<(Arc<dyn MailClient>, Arc<dyn CompletionBackend>, Arc<Store>)> {
    let hub = auth::initialize_gmail_hub(&cli.credentials, &cli.token_cache).await?;
    let client: Arc<dyn MailClient> = Arc::new(GmailMailClient::new(hub));

    let backend: Arc<dyn CompletionBackend> = Arc::new(OpenAiBackend::new(
        config.model.model.clone(),
        config.model.max_tokens,
    ));

    let store = Arc::new(Store::open(&config.store.path)?);

    Ok((client, backend, store))
}
