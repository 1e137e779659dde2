pub mod blocks;
pub mod config;
pub mod export;
pub mod inspect;
pub mod push;
pub mod render;

use std::path::Path;

use scribe::render::RenderedDocument;
use scribe::transcript::{Transcript, build_transcript};

use crate::error::CliResult;

pub use blocks::BlocksCommand;
pub use config::ConfigCommand;
pub use export::ExportCommand;
pub use inspect::InspectCommand;
pub use push::PushCommand;
pub use render::RenderCommand;

/// Parse a saved chat-history response body
pub fn load_transcript(path: &Path) -> CliResult<Transcript> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read capture file {}: {e}", path.display()))?;
    let transcript = build_transcript(&raw)?;
    tracing::debug!(
        "Loaded '{}' ({} turns) from {}",
        transcript.title(),
        transcript.turns().len(),
        path.display()
    );
    Ok(transcript)
}

/// Parse and render a saved capture
pub fn load_document(path: &Path, title_prefix: &str) -> CliResult<RenderedDocument> {
    let transcript = load_transcript(path)?;
    Ok(RenderedDocument::from_transcript(&transcript, title_prefix))
}
