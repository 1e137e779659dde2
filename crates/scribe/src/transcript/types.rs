//! Normalized transcript model
//!
//! A [`Transcript`] is built once from a raw capture and never mutated.
//! Turn order is capture order.

use serde::Serialize;

/// Speaker of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Human,
    Assistant,
}

impl Role {
    /// Map the chat API's role tag; only `USER` is a human turn
    pub fn from_tag(tag: &str) -> Self {
        if tag == "USER" {
            Role::Human
        } else {
            Role::Assistant
        }
    }

    /// Label used as the turn heading
    pub fn label(&self) -> &'static str {
        match self {
            Role::Human => "Human",
            Role::Assistant => "Assistant",
        }
    }
}

/// One search result attached to a turn
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Citation {
    /// Citation number; `None` means the result is not citable
    pub index: Option<u32>,
    pub url: Option<String>,
}

/// Auxiliary reasoning text produced alongside an assistant turn
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reasoning {
    pub text: String,
    pub elapsed_secs: Option<f64>,
}

/// One message of a conversation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Turn {
    pub role: Role,
    /// Insertion time as an ISO-8601 instant
    pub inserted_at: String,
    /// Final body: citations resolved, reasoning merged, math reformatted
    pub body: String,
    pub citations: Vec<Citation>,
    pub reasoning: Option<Reasoning>,
    /// Cumulative token usage reported for this turn
    pub token_usage: u64,
}

/// A parsed conversation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transcript {
    title: String,
    total_tokens: u64,
    turns: Vec<Turn>,
}

impl Transcript {
    /// Build a transcript; the token total is summed here and only here.
    pub fn new(title: String, turns: Vec<Turn>) -> Self {
        let total_tokens = turns.iter().map(|t| t.token_usage).sum();
        Self {
            title,
            total_tokens,
            turns,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn total_tokens(&self) -> u64 {
        self.total_tokens
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }
}
