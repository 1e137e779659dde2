//! Test utilities for scribe - capture fixtures
//!
//! Builders for chat-history response bodies and transcript fetch URLs,
//! shared by unit tests, integration tests and the CLI crate.

use serde_json::{Value, json};
use url::Url;

/// Base URL of the chat API used by fixtures
pub const FIXTURE_API_BASE: &str = "https://chat.deepseek.com/api/v0/chat/history_messages";

/// Epoch seconds of the first fixture message (2023-11-14T22:13:20Z)
pub const FIXTURE_EPOCH: f64 = 1_700_000_000.0;

/// Transcript fetch URL for `session_id`
pub fn history_url(session_id: &str) -> Url {
    Url::parse(&format!("{FIXTURE_API_BASE}?chat_session_id={session_id}"))
        .expect("fixture URL is valid")
}

/// Builds a chat-history response body.
///
/// Messages are stamped one minute apart starting at [`FIXTURE_EPOCH`].
#[derive(Debug, Clone)]
pub struct CaptureBuilder {
    title: Value,
    messages: Vec<Value>,
}

impl CaptureBuilder {
    pub fn new(title: &str) -> Self {
        Self {
            title: json!(title),
            messages: Vec::new(),
        }
    }

    /// Session without a title (`null` on the wire)
    pub fn untitled() -> Self {
        Self {
            title: Value::Null,
            messages: Vec::new(),
        }
    }

    fn next_timestamp(&self) -> f64 {
        FIXTURE_EPOCH + 60.0 * self.messages.len() as f64
    }

    pub fn human(mut self, content: &str, tokens: u64) -> Self {
        let message = json!({
            "role": "USER",
            "inserted_at": self.next_timestamp(),
            "content": content,
            "accumulated_token_usage": tokens,
        });
        self.messages.push(message);
        self
    }

    pub fn assistant(mut self, content: &str, tokens: u64) -> Self {
        let message = json!({
            "role": "ASSISTANT",
            "inserted_at": self.next_timestamp(),
            "content": content,
            "accumulated_token_usage": tokens,
        });
        self.messages.push(message);
        self
    }

    /// Assistant turn with search results and optional reasoning
    pub fn assistant_with(
        mut self,
        content: &str,
        tokens: u64,
        citations: &[(u32, &str)],
        thinking: Option<(&str, f64)>,
    ) -> Self {
        let results: Vec<Value> = citations
            .iter()
            .map(|(index, url)| json!({"cite_index": index, "url": url}))
            .collect();

        let mut message = json!({
            "role": "ASSISTANT",
            "inserted_at": self.next_timestamp(),
            "content": content,
            "accumulated_token_usage": tokens,
            "search_results": results,
        });
        if let Some((text, secs)) = thinking {
            message["thinking_content"] = json!(text);
            message["thinking_elapsed_secs"] = json!(secs);
        }
        self.messages.push(message);
        self
    }

    /// Append `count` alternating turns with short bodies
    pub fn turns(mut self, count: usize) -> Self {
        for i in 0..count {
            self = if i % 2 == 0 {
                self.human(&format!("question {i}"), 1)
            } else {
                self.assistant(&format!("answer {i}"), 1)
            };
        }
        self
    }

    pub fn build_value(&self) -> Value {
        json!({
            "code": 0,
            "msg": "",
            "data": {
                "biz_code": 0,
                "biz_msg": "",
                "biz_data": {
                    "chat_session": {"id": "fixture", "title": self.title},
                    "chat_messages": self.messages,
                }
            }
        })
    }

    pub fn build(&self) -> String {
        self.build_value().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::build_transcript;

    #[test]
    fn fixture_builds_a_parsable_transcript() {
        let raw = CaptureBuilder::new("Fixture")
            .human("hi", 2)
            .assistant("hello", 3)
            .build();
        let transcript = build_transcript(&raw).unwrap();
        assert_eq!(transcript.title(), "Fixture");
        assert_eq!(transcript.total_tokens(), 5);
        assert_eq!(transcript.turns()[1].inserted_at, "2023-11-14T22:14:20.000Z");
    }

    #[test]
    fn history_url_carries_session() {
        let url = history_url("abc");
        assert!(url.path().ends_with("history_messages"));
        assert_eq!(url.query(), Some("chat_session_id=abc"));
    }
}
