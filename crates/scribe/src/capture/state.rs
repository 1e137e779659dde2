//! Per-session capture state
//!
//! Holds at most one raw capture and one rendered document, both belonging
//! to the current session. Only the response monitor mutates it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;

use super::session::SessionId;
use crate::error::{Result, ScribeError};
use crate::render::RenderedDocument;

/// An unparsed transcript response
#[derive(Debug, Clone, PartialEq)]
pub struct RawCapture {
    pub body: String,
    pub source_url: Url,
    pub captured_at: DateTime<Utc>,
}

/// Read-only view for the control API
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub has_transcript: bool,
    pub session_id: Option<String>,
    pub last_update: Option<DateTime<Utc>>,
    pub title: Option<String>,
}

/// Capture context for the single active conversation
#[derive(Debug, Default)]
pub struct SessionState {
    session_id: Option<SessionId>,
    raw_capture: Option<RawCapture>,
    document: Option<RenderedDocument>,
    last_update: Option<DateTime<Utc>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    pub fn raw_capture(&self) -> Option<&RawCapture> {
        self.raw_capture.as_ref()
    }

    pub fn document(&self) -> Option<&RenderedDocument> {
        self.document.as_ref()
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    pub fn has_transcript(&self) -> bool {
        self.document.is_some()
    }

    /// Copy of the cached document, or `NoTranscriptAvailable`
    pub fn require_document(&self) -> Result<RenderedDocument> {
        self.document
            .clone()
            .ok_or(ScribeError::NoTranscriptAvailable)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            has_transcript: self.has_transcript(),
            session_id: self.session_id.as_ref().map(|id| id.to_string()),
            last_update: self.last_update,
            title: self.document.as_ref().map(|d| d.title.clone()),
        }
    }

    /// Adopt `session_id`, dropping everything cached for the previous one.
    /// Returns the previous identity when this was a switch.
    pub(crate) fn enter_session(&mut self, session_id: SessionId) -> Option<SessionId> {
        if self.session_id.as_ref() == Some(&session_id) {
            return None;
        }
        self.raw_capture = None;
        self.document = None;
        self.session_id.replace(session_id)
    }

    pub(crate) fn store_capture(&mut self, capture: RawCapture) {
        self.last_update = Some(capture.captured_at);
        self.raw_capture = Some(capture);
    }

    pub(crate) fn store_document(&mut self, document: RenderedDocument) {
        self.document = Some(document);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> SessionId {
        SessionId::try_from(s).unwrap()
    }

    fn capture(body: &str) -> RawCapture {
        RawCapture {
            body: body.to_string(),
            source_url: Url::parse("https://x.test/history_messages?chat_session_id=a").unwrap(),
            captured_at: Utc::now(),
        }
    }

    fn document(title: &str) -> RenderedDocument {
        RenderedDocument {
            markdown: format!("# {title}"),
            title: title.to_string(),
            rendered_at: Utc::now(),
        }
    }

    #[test]
    fn test_new_state_is_empty() {
        let state = SessionState::new();
        assert!(!state.has_transcript());
        assert!(state.session_id().is_none());
        assert!(matches!(
            state.require_document(),
            Err(ScribeError::NoTranscriptAvailable)
        ));
    }

    #[test]
    fn test_first_session_is_not_a_switch() {
        let mut state = SessionState::new();
        // No previous identity to report
        assert!(state.enter_session(id("a")).is_none());
        assert_eq!(state.session_id().unwrap().as_str(), "a");
    }

    #[test]
    fn test_same_session_keeps_cache() {
        let mut state = SessionState::new();
        state.enter_session(id("a"));
        state.store_capture(capture("one"));
        state.store_document(document("A"));

        assert!(state.enter_session(id("a")).is_none());
        assert!(state.raw_capture().is_some());
        assert!(state.has_transcript());
    }

    #[test]
    fn test_switch_clears_cache() {
        let mut state = SessionState::new();
        state.enter_session(id("a"));
        state.store_capture(capture("one"));
        state.store_document(document("A"));

        let previous = state.enter_session(id("b"));
        assert_eq!(previous.unwrap().as_str(), "a");
        assert!(state.raw_capture().is_none());
        assert!(state.document().is_none());
    }

    #[test]
    fn test_snapshot() {
        let mut state = SessionState::new();
        state.enter_session(id("a"));
        state.store_capture(capture("one"));
        state.store_document(document("Title"));

        let snapshot = state.snapshot();
        assert!(snapshot.has_transcript);
        assert_eq!(snapshot.session_id.as_deref(), Some("a"));
        assert_eq!(snapshot.title.as_deref(), Some("Title"));
        assert!(snapshot.last_update.is_some());
    }
}
