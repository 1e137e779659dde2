//! Scribe daemon - capturing proxy and control API

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use scribe::config::Config;
use scribe::error::Result;
use scribe::export::{CredentialStore, FileCredentialStore};
use scribe::proxy::{AppState, ProxyServer};

/// Scribe - capture chat transcripts and export them to Markdown or Notion
#[derive(Parser)]
#[command(name = "scribe")]
#[command(about = "A capturing HTTP proxy that exports chat transcripts to Markdown and Notion")]
#[command(version)]
pub struct Cli {
    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the proxy server (default command)
    #[command(name = "serve")]
    Serve,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    match cli.command {
        None | Some(Command::Serve) => serve(cli.config).await,
    }
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,scribe=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn serve(config_path: Option<PathBuf>) -> Result<()> {
    tracing::info!("Starting Scribe daemon");

    let config = Config::load(config_path.as_deref())?;
    tracing::debug!("Config loaded: {:?}", config);

    let credentials = FileCredentialStore::new(config.notion.credentials_path.clone());
    tracing::info!(
        "Notion credentials stored at: {}",
        credentials.path().display()
    );
    let stored = credentials
        .load()
        .await?
        .with_env_fallback(&config.notion.api_token_env);
    if !stored.is_complete() {
        tracing::warn!("Notion credentials not configured; set them via PUT /admin/config/notion");
    }
    tracing::info!("Markdown exports go to: {}", config.export.output_dir.display());

    let state = AppState::from_config(&config, Arc::new(credentials))?;
    let proxy = ProxyServer::new(state);
    tracing::info!("Starting proxy server on {}", config.proxy.listen_addr);

    proxy.serve().await?;

    tracing::info!("Scribe daemon stopped");
    Ok(())
}
