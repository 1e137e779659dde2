//! Transcript capture
//!
//! The response monitor recognizes transcript fetches passing through the
//! proxy and keeps the single active session's capture and rendered
//! document current.

mod monitor;
mod session;
mod state;

use std::sync::Arc;
use tokio::sync::Mutex;

pub use monitor::{CaptureOutcome, ResponseMonitor};
pub use session::{SessionId, SessionIdError, extract_session_id};
pub use state::{RawCapture, SessionSnapshot, SessionState};

/// Session state shared between the capture path and exports
pub type SharedSession = Arc<Mutex<SessionState>>;

/// Fresh, empty shared session state
pub fn shared_session() -> SharedSession {
    Arc::new(Mutex::new(SessionState::new()))
}
