//! Transcript model builder
//!
//! Turns a raw history response into an ordered, normalized [`Transcript`].

mod normalize;
mod parse;
mod types;

pub use normalize::{merge_reasoning, reformat_display_math, resolve_citations};
pub use parse::{UNTITLED_CHAT, build_transcript, iso_instant};
pub use types::{Citation, Reasoning, Role, Transcript, Turn};
