use std::path::PathBuf;

use clap::Parser;
use scribe::config::Config;
use scribe::export::{CredentialStore, ExportDispatcher, ExportReceipt, FileCredentialStore};

use crate::commands::load_document;
use crate::error::CliResult;
use crate::output::OutputFormat;

#[derive(Parser)]
pub struct PushCommand {
    #[clap(help = "Saved chat-history response (JSON)")]
    pub capture: PathBuf,
}

impl PushCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> CliResult<()> {
        let document = load_document(&self.capture, &config.export.title_prefix)?;

        let credentials = FileCredentialStore::new(config.notion.credentials_path.clone())
            .load()
            .await?
            .with_env_fallback(&config.notion.api_token_env);

        let dispatcher = ExportDispatcher::from_config(config)?;
        let receipt = dispatcher.export_notion(&document, &credentials).await?;

        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&receipt)?),
            OutputFormat::Table => {
                if let ExportReceipt::Notion {
                    page_url,
                    truncated,
                    dropped_segments,
                    ..
                } = &receipt
                {
                    println!("Created {page_url}");
                    if *truncated {
                        println!(
                            "Note: {dropped_segments} segments did not fit; export to Markdown for the full conversation"
                        );
                    }
                }
            }
        }

        Ok(())
    }
}
