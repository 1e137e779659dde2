//! Forwarding proxy and control API server
//!
//! Serves:
//! - Dynamic passthrough via `/p/{url}` routes
//! - Configured upstream fallback for all other paths
//! - The `/admin` control API and `/health`
//!
//! Every forwarded exchange runs through the registered interceptors.

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, RawQuery, Request, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode},
    response::Response,
    routing::{any, get, post, put},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;
use url::Url;

use crate::admin::{ScribeEvent, handlers};
use crate::capture::{ResponseMonitor, SharedSession, shared_session};
use crate::config::{Config, ProxyConfig};
use crate::error::{Result, ScribeError};
use crate::export::{CredentialStore, ExportDispatcher};

use super::interceptor::{CaptureInterceptor, InterceptorChain};
use super::passthrough::UpstreamTarget;

/// Hop-by-hop headers that should not be forwarded
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "host",
    "connection",
    "keep-alive",
    "transfer-encoding",
    "proxy-connection",
    "te",
    "upgrade",
];

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: ProxyConfig,
    /// HTTP client for upstream requests
    pub client: reqwest::Client,
    pub interceptors: InterceptorChain,
    /// Capture state of the active conversation
    pub session: SharedSession,
    pub dispatcher: ExportDispatcher,
    pub credentials: Arc<dyn CredentialStore>,
    /// Environment variable holding a fallback Notion token
    pub api_token_env: String,
    pub event_tx: broadcast::Sender<ScribeEvent>,
}

impl AppState {
    /// Build the daemon state with the capture interceptor registered
    pub fn from_config(config: &Config, credentials: Arc<dyn CredentialStore>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.proxy.timeout_secs))
            .build()
            .map_err(|e| ScribeError::Proxy(format!("Failed to create HTTP client: {e}")))?;

        let session = shared_session();
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let mut interceptors = InterceptorChain::new();
        interceptors.register(Arc::new(CaptureInterceptor::new(
            ResponseMonitor::from_config(config),
            session.clone(),
            event_tx.clone(),
        )));

        Ok(Self {
            config: config.proxy.clone(),
            client,
            interceptors,
            session,
            dispatcher: ExportDispatcher::from_config(config)?,
            credentials,
            api_token_env: config.notion.api_token_env.clone(),
            event_tx,
        })
    }
}

/// The proxy server
pub struct ProxyServer {
    state: Arc<AppState>,
}

impl ProxyServer {
    pub fn new(state: AppState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    /// Start the proxy server and listen for requests
    pub async fn serve(&self) -> Result<()> {
        let config = &self.state.config;
        let addr: SocketAddr = config
            .listen_addr
            .parse()
            .map_err(|e| ScribeError::Config(format!("Invalid listen address: {e}")))?;

        tracing::info!("Starting proxy server on {addr}");
        tracing::info!("Dynamic passthrough enabled via /p/{{url}}");
        tracing::info!("Control API available under /admin");
        if config.allowed_hosts.is_empty() {
            tracing::info!("Host allowlist: disabled (all hosts allowed)");
        } else {
            tracing::info!(
                "Host allowlist: {} hosts configured",
                config.allowed_hosts.len()
            );
        }
        match &config.upstream_url {
            Some(upstream) => tracing::info!("Configured upstream URL: {upstream}"),
            None => tracing::info!("No configured upstream URL (dynamic passthrough only)"),
        }
        tracing::debug!("Interceptors: {:?}", self.state.interceptors);

        let app = create_router(self.state.clone());

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ScribeError::Proxy(format!("Failed to bind to {addr}: {e}")))?;

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ScribeError::Proxy(format!("Server error: {e}")))?;

        tracing::info!("Proxy server shut down gracefully");
        Ok(())
    }
}

/// Create the router with all routes configured
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/admin/status", get(handlers::status_handler))
        .route("/admin/document", get(handlers::document_handler))
        .route("/admin/export/file", post(handlers::export_file_handler))
        .route("/admin/export/notion", post(handlers::export_notion_handler))
        .route("/admin/config/notion", put(handlers::notion_config_handler))
        .route("/admin/events", get(handlers::events_handler))
        .route("/p/{*upstream_url}", any(dynamic_proxy_handler))
        .fallback(configured_proxy_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint - returns JSON status
async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Handle dynamic passthrough requests via /p/{url}
async fn dynamic_proxy_handler(
    State(state): State<Arc<AppState>>,
    Path(upstream_url): Path<String>,
    RawQuery(query): RawQuery,
    method: Method,
    headers: HeaderMap,
    body: Body,
) -> Response<Body> {
    let path = format!("/p/{upstream_url}");

    let target = match UpstreamTarget::from_path(&path, query.as_deref()) {
        Ok(t) => t,
        Err(e) => {
            tracing::warn!("Invalid passthrough URL: {e}");
            return create_error_response(
                StatusCode::BAD_REQUEST,
                "invalid_url",
                &format!("Invalid upstream URL: {e}"),
            );
        }
    };

    if !target.is_allowed(&state.config) {
        tracing::warn!("Blocked request to disallowed host: {}", target.host);
        return create_error_response(
            StatusCode::FORBIDDEN,
            "host_not_allowed",
            &format!("Host '{}' is not in the allowlist", target.host),
        );
    }

    tracing::debug!("Proxying dynamic request to: {}", target.url);
    forward_request(&state, target.url, method, headers, body).await
}

/// Forward anything else to the configured upstream, if there is one
async fn configured_proxy_handler(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
) -> Response<Body> {
    let Some(upstream_base) = &state.config.upstream_url else {
        return create_error_response(
            StatusCode::NOT_FOUND,
            "no_upstream_configured",
            "No upstream URL configured. Use /p/{url} for dynamic passthrough or configure an upstream_url.",
        );
    };

    let base_url = match Url::parse(upstream_base) {
        Ok(url) => url,
        Err(e) => {
            tracing::error!("Invalid configured upstream URL: {e}");
            return create_error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "invalid_upstream_config",
                "The configured upstream URL is invalid",
            );
        }
    };

    let path_and_query = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    let target_url = match base_url.join(path_and_query) {
        Ok(url) => url,
        Err(e) => {
            tracing::error!("Failed to construct target URL: {e}");
            return create_error_response(
                StatusCode::BAD_REQUEST,
                "invalid_path",
                &format!("Invalid request path: {e}"),
            );
        }
    };

    let method = request.method().clone();
    let headers = request.headers().clone();
    let body = request.into_body();

    tracing::debug!("Proxying configured request to: {target_url}");
    forward_request(&state, target_url, method, headers, body).await
}

/// Shared forwarding path for both proxy handlers.
///
/// Interceptors see the request before it is sent and the fully read
/// response before it is returned to the client.
async fn forward_request(
    state: &AppState,
    mut target_url: Url,
    method: Method,
    headers: HeaderMap,
    body: Body,
) -> Response<Body> {
    let mut forwarded_headers = HeaderMap::new();
    for (name, value) in headers.iter() {
        if !HOP_BY_HOP_HEADERS.contains(&name.as_str()) {
            forwarded_headers.append(name.clone(), value.clone());
        }
    }

    state
        .interceptors
        .apply_request(&mut target_url, &mut forwarded_headers);

    if let Some(host) = target_url.host_str() {
        let host_value = match target_url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        if let Ok(header_value) = HeaderValue::from_str(&host_value) {
            forwarded_headers.insert("host", header_value);
        }
    }

    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return create_error_response(
                StatusCode::BAD_REQUEST,
                "invalid_request",
                &format!("Failed to read request body: {e}"),
            );
        }
    };

    let response = match state
        .client
        .request(method, target_url.clone())
        .headers(forwarded_headers)
        .body(body_bytes)
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Upstream request to {target_url} failed: {e}");
            let (status, error_type) = if e.is_timeout() {
                (StatusCode::GATEWAY_TIMEOUT, "upstream_timeout")
            } else {
                (StatusCode::BAD_GATEWAY, "upstream_unreachable")
            };
            return create_error_response(status, error_type, &format!("Request failed: {e}"));
        }
    };

    let status = response.status();
    let resolved_url = response.url().clone();

    let mut response_headers = HeaderMap::new();
    for (name, value) in response.headers().iter() {
        if !HOP_BY_HOP_HEADERS.contains(&name.as_str()) {
            response_headers.append(name.clone(), value.clone());
        }
    }

    let response_body = match response.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("Failed to read upstream response body: {e}");
            return create_error_response(
                StatusCode::BAD_GATEWAY,
                "upstream_body_error",
                &format!("Failed to read response body: {e}"),
            );
        }
    };

    state
        .interceptors
        .apply_response(&resolved_url, status, &response_body)
        .await;

    let mut builder = Response::builder().status(status);
    if let Some(headers) = builder.headers_mut() {
        headers.extend(response_headers);
    }

    builder.body(Body::from(response_body)).unwrap_or_else(|e| {
        create_error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "response_build_error",
            &format!("Failed to build response: {e}"),
        )
    })
}

/// Create a JSON error response
pub(crate) fn create_error_response(
    status: StatusCode,
    error_type: &str,
    message: &str,
) -> Response<Body> {
    let body = serde_json::json!({
        "error": {
            "type": error_type,
            "message": message,
        }
    });

    let mut response = Response::new(Body::from(body.to_string()));
    *response.status_mut() = status;
    response.headers_mut().insert(
        axum::http::header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}
