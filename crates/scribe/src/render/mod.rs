//! Markdown rendering of a [`Transcript`]

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::transcript::Transcript;

/// The Markdown form of one transcript, cached per session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedDocument {
    pub markdown: String,
    /// Chat title without prefix
    pub title: String,
    pub rendered_at: DateTime<Utc>,
}

impl RenderedDocument {
    pub fn from_transcript(transcript: &Transcript, title_prefix: &str) -> Self {
        Self {
            markdown: render_markdown(transcript, title_prefix),
            title: transcript.title().to_string(),
            rendered_at: Utc::now(),
        }
    }

    /// Prefixed title used for file names
    pub fn display_title(&self, title_prefix: &str) -> String {
        format!("{title_prefix} - {}", self.title)
    }
}

/// Render a transcript as Markdown.
///
/// Layout: a level-1 title carrying the token total, then per turn a
/// level-3 role heading, an italic timestamp and the body, with blank lines
/// between sections.
pub fn render_markdown(transcript: &Transcript, title_prefix: &str) -> String {
    let mut parts = Vec::with_capacity(transcript.turns().len() * 3 + 1);
    parts.push(format!(
        "# {title_prefix} - {} (Total Tokens: {})\n",
        transcript.title(),
        transcript.total_tokens()
    ));

    for turn in transcript.turns() {
        parts.push(format!("### {}", turn.role.label()));
        parts.push(format!("*{}*\n", turn.inserted_at));
        parts.push(format!("{}\n", turn.body));
    }

    parts.join("\n")
}
