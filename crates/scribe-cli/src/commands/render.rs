use std::path::PathBuf;

use clap::Parser;
use scribe::config::Config;

use crate::commands::load_document;
use crate::error::CliResult;
use crate::output::OutputFormat;

#[derive(Parser)]
pub struct RenderCommand {
    #[clap(help = "Saved chat-history response (JSON)")]
    pub capture: PathBuf,

    #[clap(long, help = "Title prefix (defaults to export.title_prefix)")]
    pub prefix: Option<String>,
}

impl RenderCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> CliResult<()> {
        let prefix = self
            .prefix
            .as_deref()
            .unwrap_or(&config.export.title_prefix);
        let document = load_document(&self.capture, prefix)?;

        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&document)?),
            OutputFormat::Table => print!("{}", document.markdown),
        }

        Ok(())
    }
}
