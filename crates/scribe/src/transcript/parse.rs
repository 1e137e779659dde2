//! Raw capture → [`Transcript`]
//!
//! Wire format of the chat history endpoint:
//!
//! ```json
//! {"data": {"biz_data": {
//!     "chat_session": {"title": "..."},
//!     "chat_messages": [{"role": "USER", "inserted_at": 1700000000.5,
//!                        "content": "...", "accumulated_token_usage": 12,
//!                        "search_results": [{"cite_index": 1, "url": "..."}],
//!                        "thinking_content": "...", "thinking_elapsed_secs": 4}]
//! }}}
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;

use super::normalize::{merge_reasoning, reformat_display_math, resolve_citations};
use super::types::{Citation, Reasoning, Role, Transcript, Turn};
use crate::error::{Result, ScribeError};

/// Title used when the session has none
pub const UNTITLED_CHAT: &str = "Untitled Chat";

#[derive(Debug, Deserialize)]
struct Envelope {
    data: Data,
}

#[derive(Debug, Deserialize)]
struct Data {
    biz_data: BizData,
}

#[derive(Debug, Deserialize)]
struct BizData {
    chat_session: ChatSession,
    chat_messages: Vec<WireMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatSession {
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    role: String,
    inserted_at: f64,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    accumulated_token_usage: Option<u64>,
    #[serde(default)]
    search_results: Option<Vec<WireSearchResult>>,
    #[serde(default)]
    thinking_content: Option<String>,
    #[serde(default)]
    thinking_elapsed_secs: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WireSearchResult {
    #[serde(default)]
    cite_index: Option<u32>,
    #[serde(default)]
    url: Option<String>,
}

/// Parse a captured response body into a normalized transcript.
///
/// Fails with [`ScribeError::MalformedCapture`] when the body is not JSON or
/// lacks the session / message-list fields.
pub fn build_transcript(raw: &str) -> Result<Transcript> {
    let envelope: Envelope = serde_json::from_str(raw)
        .map_err(|e| ScribeError::MalformedCapture(format!("Invalid transcript payload: {e}")))?;

    let BizData {
        chat_session,
        chat_messages,
    } = envelope.data.biz_data;

    let title = chat_session
        .title
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNTITLED_CHAT.to_string());

    let turns = chat_messages
        .into_iter()
        .map(build_turn)
        .collect::<Result<Vec<_>>>()?;

    Ok(Transcript::new(title, turns))
}

fn build_turn(message: WireMessage) -> Result<Turn> {
    let citations: Vec<Citation> = message
        .search_results
        .unwrap_or_default()
        .into_iter()
        .map(|r| Citation {
            index: r.cite_index,
            url: r.url,
        })
        .collect();

    let reasoning = message.thinking_content.map(|text| Reasoning {
        text,
        elapsed_secs: message.thinking_elapsed_secs,
    });

    let content = message.content.unwrap_or_default();
    let body = resolve_citations(&content, &citations);
    let body = merge_reasoning(&body, reasoning.as_ref());
    let body = reformat_display_math(&body);

    Ok(Turn {
        role: Role::from_tag(&message.role),
        inserted_at: iso_instant(message.inserted_at)?,
        body,
        citations,
        reasoning,
        token_usage: message.accumulated_token_usage.unwrap_or(0),
    })
}

/// Epoch seconds → `YYYY-MM-DDTHH:MM:SS.mmmZ`
pub fn iso_instant(epoch_secs: f64) -> Result<String> {
    let millis = (epoch_secs * 1000.0).trunc();
    if !millis.is_finite() || millis.abs() > i64::MAX as f64 {
        return Err(ScribeError::MalformedCapture(format!(
            "Timestamp out of range: {epoch_secs}"
        )));
    }

    DateTime::<Utc>::from_timestamp_millis(millis as i64)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .ok_or_else(|| {
            ScribeError::MalformedCapture(format!("Timestamp out of range: {epoch_secs}"))
        })
}
