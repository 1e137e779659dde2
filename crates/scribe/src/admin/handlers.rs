use axum::{
    Json,
    body::Body,
    extract::State,
    http::{HeaderValue, StatusCode, header},
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use chrono::Utc;
use futures::stream::StreamExt;
use serde::Serialize;
use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_stream::wrappers::BroadcastStream;

use crate::admin::ScribeEvent;
use crate::capture::SessionSnapshot;
use crate::error::{Result, ScribeError};
use crate::export::{ExportReceipt, ExportTarget, NotionCredentials};
use crate::proxy::{AppState, create_error_response};
use crate::render::RenderedDocument;

pub async fn events_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl futures::Stream<Item = std::result::Result<Event, Infallible>>> {
    let rx = state.event_tx.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(event) => {
                let json = serde_json::to_string(&event).ok()?;
                Some(Ok(Event::default().data(json)))
            }
            Err(_) => None,
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<SessionSnapshot> {
    Json(state.session.lock().await.snapshot())
}

/// The cached Markdown as a download
pub async fn document_handler(State(state): State<Arc<AppState>>) -> Response {
    let document = match current_document(&state).await {
        Ok(document) => document,
        Err(e) => return error_response(&e),
    };

    let file_name = state.dispatcher.file_name_for(&document);
    let mut response = Response::new(Body::from(document.markdown));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/markdown; charset=utf-8"),
    );
    if let Ok(value) = HeaderValue::from_str(&content_disposition(&file_name)) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    response
}

#[derive(Debug, Serialize)]
pub struct FileExportResponse {
    pub path: PathBuf,
}

pub async fn export_file_handler(State(state): State<Arc<AppState>>) -> Response {
    match run_export(&state, ExportTarget::File).await {
        Ok(ExportReceipt::File { path, .. }) => Json(FileExportResponse { path }).into_response(),
        Ok(other) => Json(other).into_response(),
        Err(e) => error_response(&e),
    }
}

#[derive(Debug, Serialize)]
pub struct NotionExportResponse {
    pub page_id: String,
    pub page_url: String,
    pub truncated: bool,
}

pub async fn export_notion_handler(State(state): State<Arc<AppState>>) -> Response {
    match run_export(&state, ExportTarget::Notion).await {
        Ok(ExportReceipt::Notion {
            page_id,
            page_url,
            truncated,
            ..
        }) => Json(NotionExportResponse {
            page_id,
            page_url,
            truncated,
        })
        .into_response(),
        Ok(other) => Json(other).into_response(),
        Err(e) => error_response(&e),
    }
}

/// Replace the stored Notion credentials
pub async fn notion_config_handler(
    State(state): State<Arc<AppState>>,
    Json(credentials): Json<NotionCredentials>,
) -> Response {
    match state.credentials.save(&credentials).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(&e),
    }
}

/// Export the cached document to `target` and announce the outcome
async fn run_export(state: &AppState, target: ExportTarget) -> Result<ExportReceipt> {
    let result = async {
        let document = current_document(state).await?;
        let credentials = match target {
            ExportTarget::Notion => state
                .credentials
                .load()
                .await?
                .with_env_fallback(&state.api_token_env),
            ExportTarget::File => NotionCredentials::default(),
        };
        state.dispatcher.export(&document, target, &credentials).await
    }
    .await;

    publish_export(state, target, result)
}

/// Copy the cached document out and release the lock
async fn current_document(state: &AppState) -> Result<RenderedDocument> {
    state.session.lock().await.require_document()
}

fn publish_export(
    state: &AppState,
    target: ExportTarget,
    result: Result<ExportReceipt>,
) -> Result<ExportReceipt> {
    let event = match &result {
        Ok(ExportReceipt::File { path, .. }) => ScribeEvent::ExportCompleted {
            target,
            location: path.display().to_string(),
            truncated: false,
            timestamp: Utc::now(),
        },
        Ok(ExportReceipt::Notion {
            page_url, truncated, ..
        }) => ScribeEvent::ExportCompleted {
            target,
            location: page_url.clone(),
            truncated: *truncated,
            timestamp: Utc::now(),
        },
        Err(e) => {
            tracing::warn!("Export to {target:?} failed: {e}");
            ScribeEvent::ExportFailed {
                target,
                error: e.to_string(),
                timestamp: Utc::now(),
            }
        }
    };
    let _ = state.event_tx.send(event);
    result
}

/// Map a pipeline error onto the control API's JSON error body
pub fn error_response(error: &ScribeError) -> Response {
    let status = match error {
        ScribeError::NoTranscriptAvailable => StatusCode::NOT_FOUND,
        ScribeError::MissingCredentials => StatusCode::PRECONDITION_FAILED,
        ScribeError::RemoteSink { .. } => StatusCode::BAD_GATEWAY,
        ScribeError::NetworkUnreachable(_) => StatusCode::GATEWAY_TIMEOUT,
        ScribeError::Config(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let message = match error {
        ScribeError::MissingCredentials => {
            format!("{error}. Set them with PUT /admin/config/notion")
        }
        _ => error.to_string(),
    };

    create_error_response(status, error.kind(), &message)
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987 name
fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if c == ' ' || (c.is_ascii_graphic() && c != '"' && c != '\\') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let mut encoded = String::with_capacity(file_name.len() * 3);
    for byte in file_name.bytes() {
        if byte.is_ascii_alphanumeric() || b"-._~".contains(&byte) {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }

    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}
