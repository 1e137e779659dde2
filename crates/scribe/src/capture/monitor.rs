//! Response monitor
//!
//! Decides which requests are transcript fetches, normalizes their target
//! before they are sent and applies completed responses to the session
//! state. Capture-side failures are logged and absorbed here.

use chrono::Utc;
use url::Url;

use super::session::{SessionId, extract_session_id};
use super::state::{RawCapture, SessionState};
use crate::config::{CaptureConfig, Config};
use crate::render::RenderedDocument;
use crate::transcript::build_transcript;

/// What a completed response did to the session state
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    /// No session identity could be read; state untouched
    Dropped { reason: String },
    /// The body was stored as the current raw capture
    Stored {
        session_id: SessionId,
        /// Previous identity when this capture switched sessions
        switched_from: Option<SessionId>,
        /// False when the body failed to parse and the previous
        /// document was kept
        rendered: bool,
        bytes: usize,
    },
}

/// Watches transcript fetches and keeps [`SessionState`] current
#[derive(Debug, Clone)]
pub struct ResponseMonitor {
    capture: CaptureConfig,
    title_prefix: String,
}

impl ResponseMonitor {
    pub fn new(capture: CaptureConfig, title_prefix: impl Into<String>) -> Self {
        Self {
            capture,
            title_prefix: title_prefix.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.capture.clone(), config.export.title_prefix.clone())
    }

    /// Whether `url` targets the transcript endpoint
    pub fn matches(&self, url: &Url) -> bool {
        url.path().ends_with(&self.capture.path_suffix)
            && url
                .query_pairs()
                .any(|(key, _)| key == self.capture.session_param.as_str())
    }

    /// Strip the cache-busting parameter from a transcript fetch.
    ///
    /// Other query pairs keep their original encoding and order.
    /// Non-matching targets are returned unchanged.
    pub fn prepare_request(&self, url: &Url) -> Url {
        let mut prepared = url.clone();
        if !self.matches(url) {
            return prepared;
        }

        if let Some(query) = url.query() {
            let cache_key = self.capture.cache_param.as_str();
            let kept: Vec<&str> = query
                .split('&')
                .filter(|pair| pair.split('=').next() != Some(cache_key))
                .collect();

            if kept.len() != query.split('&').count() {
                tracing::debug!("Stripped '{cache_key}' from transcript fetch {url}");
                if kept.is_empty() {
                    prepared.set_query(None);
                } else {
                    prepared.set_query(Some(&kept.join("&")));
                }
            }
        }

        prepared
    }

    /// Apply a successfully completed transcript response.
    ///
    /// A session change clears the cached capture and document before the
    /// new body is stored. A body that fails to parse is still stored as the
    /// raw capture, but the previously rendered document is kept.
    pub fn on_response(
        &self,
        state: &mut SessionState,
        resolved_url: &Url,
        body: String,
    ) -> CaptureOutcome {
        let session_id = match extract_session_id(resolved_url, &self.capture.session_param) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!("Dropping capture: {e}");
                return CaptureOutcome::Dropped {
                    reason: e.to_string(),
                };
            }
        };

        let switched_from = state.enter_session(session_id.clone());
        if let Some(previous) = &switched_from {
            tracing::info!("Session switched from {previous} to {session_id}, cleared cached transcript");
        }

        let bytes = body.len();
        tracing::info!("Captured transcript response ({bytes} bytes) from {resolved_url}");

        let rendered = match build_transcript(&body) {
            Ok(transcript) => {
                let document = RenderedDocument::from_transcript(&transcript, &self.title_prefix);
                tracing::debug!(
                    "Rendered {} turns ({} tokens) for session {}",
                    transcript.turns().len(),
                    transcript.total_tokens(),
                    session_id
                );
                Some(document)
            }
            Err(e) => {
                tracing::error!("Failed to build transcript for session {session_id}: {e}");
                None
            }
        };

        state.store_capture(RawCapture {
            body,
            source_url: resolved_url.clone(),
            captured_at: Utc::now(),
        });

        let was_rendered = rendered.is_some();
        if let Some(document) = rendered {
            state.store_document(document);
        }

        CaptureOutcome::Stored {
            session_id,
            switched_from,
            rendered: was_rendered,
            bytes,
        }
    }
}
