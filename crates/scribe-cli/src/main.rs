use std::path::PathBuf;

use clap::{Parser, Subcommand};
use scribe::config::Config;
use scribe_cli::commands::{
    BlocksCommand, ConfigCommand, ExportCommand, InspectCommand, PushCommand, RenderCommand,
};
use scribe_cli::error::CliResult;
use scribe_cli::output::OutputFormat;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "scribe-cli")]
#[command(about = "Scribe CLI - render and export saved chat transcripts")]
#[command(version)]
pub struct Cli {
    #[clap(long, short, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[clap(long, short = 'c', global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(about = "Render a capture as Markdown")]
    Render(RenderCommand),

    #[clap(about = "List the turns of a capture")]
    Inspect(InspectCommand),

    #[clap(about = "Show the Notion blocks a capture would produce")]
    Blocks(BlocksCommand),

    #[clap(about = "Write a capture to a Markdown file")]
    Export(ExportCommand),

    #[clap(about = "Create a Notion page from a capture")]
    Push(PushCommand),

    #[clap(about = "Configuration commands")]
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> CliResult<()> {
    init_logging();

    let cli = Cli::parse();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Table
    };

    let config = Config::load(cli.config.as_deref())?;

    match &cli.command {
        Command::Render(cmd) => cmd.execute(&config, format).await,
        Command::Inspect(cmd) => cmd.execute(&config, format).await,
        Command::Blocks(cmd) => cmd.execute(&config, format).await,
        Command::Export(cmd) => cmd.execute(&config, format).await,
        Command::Push(cmd) => cmd.execute(&config, format).await,
        Command::Config(cmd) => cmd.execute(&config, cli.config.as_deref(), format).await,
    }
}

/// Logs go to stderr so stdout stays clean for Markdown and JSON
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
