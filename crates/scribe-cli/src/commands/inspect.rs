use std::path::PathBuf;

use clap::Parser;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use scribe::config::Config;

use crate::commands::load_transcript;
use crate::error::CliResult;
use crate::output::{OutputFormat, one_line, truncate_string};

#[derive(Parser)]
pub struct InspectCommand {
    #[clap(help = "Saved chat-history response (JSON)")]
    pub capture: PathBuf,

    #[clap(long, default_value = "60", help = "Maximum preview length per turn")]
    pub width: usize,
}

impl InspectCommand {
    pub async fn execute(&self, _config: &Config, format: OutputFormat) -> CliResult<()> {
        let transcript = load_transcript(&self.capture)?;

        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&transcript)?),
            OutputFormat::Table => {
                println!("{}", transcript.title());
                println!("======================\n");

                let mut table = Table::new();
                table
                    .load_preset(UTF8_FULL_CONDENSED)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header(["#", "Role", "Inserted", "Tokens", "Cites", "Body"]);

                for (i, turn) in transcript.turns().iter().enumerate() {
                    table.add_row([
                        (i + 1).to_string(),
                        turn.role.label().to_string(),
                        turn.inserted_at.clone(),
                        turn.token_usage.to_string(),
                        turn.citations.len().to_string(),
                        truncate_string(&one_line(&turn.body), self.width),
                    ]);
                }

                println!("{table}\n");
                println!(
                    "Total: {} turns, {} tokens",
                    transcript.turns().len(),
                    transcript.total_tokens()
                );
            }
        }

        Ok(())
    }
}
