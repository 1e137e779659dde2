//! Error types for Scribe

use thiserror::Error;

/// Main error type for Scribe operations
#[derive(Error, Debug)]
pub enum ScribeError {
    /// The response URL carried no usable session identity
    #[error("Session ID extraction failed: {0}")]
    SessionIdExtraction(String),

    /// A captured body was not a transcript payload
    #[error("Malformed capture: {0}")]
    MalformedCapture(String),

    /// An export was requested before any transcript was captured
    #[error("No transcript available yet; wait for a conversation to load")]
    NoTranscriptAvailable,

    /// Notion credentials have not been configured
    #[error("Notion credentials are missing; configure an API token and database ID first")]
    MissingCredentials,

    /// The remote document sink rejected the request
    #[error("Remote sink returned {status}: {message}")]
    RemoteSink { status: u16, message: String },

    /// The remote document sink could not be reached
    #[error("Network unreachable: {0}. Check your connection and Notion API token")]
    NetworkUnreachable(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Proxy/HTTP errors
    #[error("Proxy error: {0}")]
    Proxy(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ScribeError {
    /// Short machine-readable tag used in API error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            ScribeError::SessionIdExtraction(_) => "session_id_extraction",
            ScribeError::MalformedCapture(_) => "malformed_capture",
            ScribeError::NoTranscriptAvailable => "no_transcript_available",
            ScribeError::MissingCredentials => "missing_credentials",
            ScribeError::RemoteSink { .. } => "remote_sink_error",
            ScribeError::NetworkUnreachable(_) => "network_unreachable",
            ScribeError::Config(_) => "config_error",
            ScribeError::Proxy(_) => "proxy_error",
            ScribeError::Io(_) => "io_error",
            ScribeError::Serialization(_) => "serialization_error",
        }
    }
}

/// Result type alias for Scribe operations
pub type Result<T> = std::result::Result<T, ScribeError>;
