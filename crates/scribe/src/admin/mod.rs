//! Control API
//!
//! Read-only observations of the capture state plus export and
//! configuration commands, and the event stream consumed by dashboards.

pub mod handlers;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::export::ExportTarget;

/// Events emitted by the daemon for real-time monitoring
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScribeEvent {
    /// A transcript response was stored
    TranscriptCaptured {
        session_id: String,
        /// Title of the cached document, if one is available
        title: Option<String>,
        /// False when the body could not be parsed
        rendered: bool,
        bytes: usize,
        timestamp: DateTime<Utc>,
    },
    /// A transcript response carried no usable session identity
    CaptureDropped {
        reason: String,
        timestamp: DateTime<Utc>,
    },
    /// The active conversation changed and the cache was cleared
    SessionSwitched { from: String, to: String },
    ExportCompleted {
        target: ExportTarget,
        /// File path or page URL
        location: String,
        truncated: bool,
        timestamp: DateTime<Utc>,
    },
    ExportFailed {
        target: ExportTarget,
        error: String,
        timestamp: DateTime<Utc>,
    },
}
