use std::path::PathBuf;

use clap::Parser;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use scribe::blocks::{BlockCapper, CappedBlocks, markdown_to_blocks};
use scribe::config::Config;

use crate::commands::load_document;
use crate::error::CliResult;
use crate::output::{OutputFormat, one_line, truncate_string};

#[derive(Parser)]
pub struct BlocksCommand {
    #[clap(help = "Saved chat-history response (JSON)")]
    pub capture: PathBuf,

    #[clap(long, help = "Block ceiling (defaults to export.block_ceiling)")]
    pub ceiling: Option<usize>,

    #[clap(long, help = "Include the request body that would be sent to Notion")]
    pub request: bool,
}

impl BlocksCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> CliResult<()> {
        let document = load_document(&self.capture, &config.export.title_prefix)?;
        let capper = BlockCapper::new(self.ceiling.unwrap_or(config.export.block_ceiling));
        let capped = markdown_to_blocks(&document.markdown, &capper);

        match format {
            OutputFormat::Json => {
                let output = if self.request {
                    scribe::export::page_request_body("<database_id>", &document.title, &capped.blocks)
                } else {
                    serde_json::to_value(&capped)?
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Table => {
                print_blocks(&capped);
                println!(
                    "\n{} blocks (ceiling {}), {} of {} segments{}",
                    capped.blocks.len(),
                    capper.ceiling(),
                    capped.emitted_segments,
                    capped.segment_count,
                    if capped.truncated { ", truncated" } else { "" }
                );
            }
        }

        Ok(())
    }
}

fn print_blocks(capped: &CappedBlocks) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(["#", "Type", "Text"]);

    for (i, block) in capped.blocks.iter().enumerate() {
        table.add_row([
            i.to_string(),
            block.block_type().to_string(),
            truncate_string(&one_line(&block.text()), 70),
        ]);
    }

    println!("{table}");
}
