use std::path::PathBuf;

use clap::Parser;
use scribe::config::Config;
use scribe::export::{ExportDispatcher, ExportReceipt};

use crate::commands::load_document;
use crate::error::CliResult;
use crate::output::OutputFormat;

#[derive(Parser)]
pub struct ExportCommand {
    #[clap(help = "Saved chat-history response (JSON)")]
    pub capture: PathBuf,

    #[clap(long, short = 'o', help = "Output directory (defaults to export.output_dir)")]
    pub out_dir: Option<PathBuf>,
}

impl ExportCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> CliResult<()> {
        let mut config = config.clone();
        if let Some(dir) = &self.out_dir {
            config.export.output_dir = dir.clone();
        }

        let document = load_document(&self.capture, &config.export.title_prefix)?;
        let dispatcher = ExportDispatcher::from_config(&config)?;
        let receipt = dispatcher.export_file(&document).await?;

        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&receipt)?),
            OutputFormat::Table => {
                if let ExportReceipt::File { path, bytes } = &receipt {
                    println!("Wrote {bytes} bytes to {}", path.display());
                }
            }
        }

        Ok(())
    }
}
