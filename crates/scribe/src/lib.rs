//! Scribe - chat transcript capture and export
//!
//! A local forwarding proxy observes a chat application's transcript
//! fetches, keeps a normalized Markdown rendering of the active
//! conversation, and exports it to a Markdown file or a Notion page.

pub mod admin;
pub mod blocks;
pub mod capture;
pub mod config;
pub mod error;
pub mod export;
pub mod proxy;
pub mod render;
pub mod testing;
pub mod transcript;

pub use error::{Result, ScribeError};
