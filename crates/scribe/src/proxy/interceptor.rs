//! Interceptor registration point
//!
//! Every forwarded exchange passes through the registered interceptors
//! twice: once before the request is sent, where the target and headers may
//! be rewritten, and once after a response body has been read in full.

use async_trait::async_trait;
use axum::http::{HeaderMap, StatusCode};
use bytes::Bytes;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::broadcast;
use url::Url;

use crate::admin::ScribeEvent;
use crate::capture::{CaptureOutcome, ResponseMonitor, SharedSession};

/// Hook into forwarded exchanges
#[async_trait]
pub trait Interceptor: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Rewrite the outbound request before it is sent
    fn on_request(&self, _target: &mut Url, _headers: &mut HeaderMap) {}

    /// Observe a completed response.
    ///
    /// `resolved_url` is the final URL after redirects.
    async fn on_response(&self, resolved_url: &Url, status: StatusCode, body: &Bytes);
}

/// Ordered set of interceptors applied by the proxy
#[derive(Clone, Default)]
pub struct InterceptorChain {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl std::fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.interceptors.iter().map(|i| i.name()))
            .finish()
    }
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, interceptor: Arc<dyn Interceptor>) {
        tracing::debug!("Registered interceptor: {}", interceptor.name());
        self.interceptors.push(interceptor);
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    pub fn apply_request(&self, target: &mut Url, headers: &mut HeaderMap) {
        for interceptor in &self.interceptors {
            interceptor.on_request(target, headers);
        }
    }

    pub async fn apply_response(&self, resolved_url: &Url, status: StatusCode, body: &Bytes) {
        for interceptor in &self.interceptors {
            interceptor.on_response(resolved_url, status, body).await;
        }
    }
}

/// Runs the response monitor on transcript fetches
pub struct CaptureInterceptor {
    monitor: ResponseMonitor,
    session: SharedSession,
    events: broadcast::Sender<ScribeEvent>,
}

impl CaptureInterceptor {
    pub fn new(
        monitor: ResponseMonitor,
        session: SharedSession,
        events: broadcast::Sender<ScribeEvent>,
    ) -> Self {
        Self {
            monitor,
            session,
            events,
        }
    }
}

#[async_trait]
impl Interceptor for CaptureInterceptor {
    fn name(&self) -> &str {
        "capture"
    }

    fn on_request(&self, target: &mut Url, headers: &mut HeaderMap) {
        if !self.monitor.matches(target) {
            return;
        }
        *target = self.monitor.prepare_request(target);
        // The client has no decompression; ask for an identity-encoded body
        headers.remove(axum::http::header::ACCEPT_ENCODING);
    }

    async fn on_response(&self, resolved_url: &Url, status: StatusCode, body: &Bytes) {
        if !status.is_success() || !self.monitor.matches(resolved_url) {
            return;
        }

        let body = String::from_utf8_lossy(body).into_owned();
        let (outcome, title) = {
            let mut state = self.session.lock().await;
            let outcome = self.monitor.on_response(&mut state, resolved_url, body);
            let title = state.document().map(|d| d.title.clone());
            (outcome, title)
        };

        let event = match outcome {
            CaptureOutcome::Dropped { reason } => ScribeEvent::CaptureDropped {
                reason,
                timestamp: Utc::now(),
            },
            CaptureOutcome::Stored {
                session_id,
                switched_from,
                rendered,
                bytes,
            } => {
                if let Some(previous) = switched_from {
                    let _ = self.events.send(ScribeEvent::SessionSwitched {
                        from: previous.to_string(),
                        to: session_id.to_string(),
                    });
                }
                ScribeEvent::TranscriptCaptured {
                    session_id: session_id.to_string(),
                    title,
                    rendered,
                    bytes,
                    timestamp: Utc::now(),
                }
            }
        };

        // No subscribers is not an error
        let _ = self.events.send(event);
    }
}
