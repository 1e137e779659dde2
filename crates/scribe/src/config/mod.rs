use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::blocks::{DEFAULT_BLOCK_CEILING, DESTINATION_BLOCK_LIMIT};
use crate::error::{Result, ScribeError};

/// Main configuration structure for Scribe
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// HTTP proxy configuration
    #[serde(default)]
    pub proxy: ProxyConfig,
    /// Transcript capture matching
    #[serde(default)]
    pub capture: CaptureConfig,
    /// Markdown / block export settings
    #[serde(default)]
    pub export: ExportConfig,
    /// Notion sink configuration
    #[serde(default)]
    pub notion: NotionConfig,
}

impl Config {
    /// Load configuration from an explicit path, or from the first default
    /// location that exists, falling back to built-in defaults.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = config_path {
            tracing::info!("Loading config from: {}", path.display());
            return Self::from_file(path);
        }

        let default_paths = [
            dirs::home_dir().map(|h| h.join(".scribe").join("config.toml")),
            dirs::config_dir().map(|c| c.join("scribe").join("config.toml")),
            Some(PathBuf::from("config.toml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Config::default())
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ScribeError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| ScribeError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would break pipeline invariants
    pub fn validate(&self) -> Result<()> {
        let ceiling = self.export.block_ceiling;
        if !(2..=DESTINATION_BLOCK_LIMIT).contains(&ceiling) {
            return Err(ScribeError::Config(format!(
                "export.block_ceiling must be between 2 and {DESTINATION_BLOCK_LIMIT}, got {ceiling}"
            )));
        }
        if self.capture.path_suffix.trim().is_empty() {
            return Err(ScribeError::Config(
                "capture.path_suffix cannot be empty".to_string(),
            ));
        }
        if self.capture.session_param.trim().is_empty() {
            return Err(ScribeError::Config(
                "capture.session_param cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// HTTP proxy server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyConfig {
    /// Address to listen on (e.g., "127.0.0.1:9898")
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Upstream chat API URL (optional - can be specified per-request)
    #[serde(default)]
    pub upstream_url: Option<String>,
    /// Allowed upstream hosts (empty = allow all)
    #[serde(default)]
    pub allowed_hosts: Vec<String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            upstream_url: None,
            allowed_hosts: Vec::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_listen_addr() -> String {
    "127.0.0.1:9898".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

/// Which responses count as transcript fetches
#[derive(Debug, Clone, Deserialize)]
pub struct CaptureConfig {
    /// Path suffix of the transcript endpoint
    #[serde(default = "default_path_suffix")]
    pub path_suffix: String,
    /// Query parameter carrying the session identity
    #[serde(default = "default_session_param")]
    pub session_param: String,
    /// Cache-busting query parameter stripped before forwarding
    #[serde(default = "default_cache_param")]
    pub cache_param: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            path_suffix: default_path_suffix(),
            session_param: default_session_param(),
            cache_param: default_cache_param(),
        }
    }
}

fn default_path_suffix() -> String {
    "history_messages".to_string()
}

fn default_session_param() -> String {
    "chat_session_id".to_string()
}

fn default_cache_param() -> String {
    "cache_version".to_string()
}

/// Export settings shared by the file and Notion sinks
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// Prefix for document titles and file names
    #[serde(default = "default_title_prefix")]
    pub title_prefix: String,
    /// Directory Markdown files are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Maximum blocks per Notion page request, intro and advisory included
    #[serde(default = "default_block_ceiling")]
    pub block_ceiling: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            title_prefix: default_title_prefix(),
            output_dir: default_output_dir(),
            block_ceiling: default_block_ceiling(),
        }
    }
}

fn default_title_prefix() -> String {
    "DeepSeek".to_string()
}

fn default_output_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".scribe").join("exports")))
        .unwrap_or_else(|| PathBuf::from("exports"))
}

fn default_block_ceiling() -> usize {
    DEFAULT_BLOCK_CEILING
}

/// Notion API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NotionConfig {
    /// Base URL of the Notion API
    #[serde(default = "default_notion_api_url")]
    pub api_url: String,
    /// Value of the Notion-Version header
    #[serde(default = "default_notion_version")]
    pub notion_version: String,
    /// Request timeout in seconds
    #[serde(default = "default_notion_timeout_secs")]
    pub timeout_secs: u64,
    /// Where the API token and database ID are persisted
    #[serde(default = "default_credentials_path")]
    pub credentials_path: PathBuf,
    /// Environment variable consulted when no token is stored
    #[serde(default = "default_api_token_env")]
    pub api_token_env: String,
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            api_url: default_notion_api_url(),
            notion_version: default_notion_version(),
            timeout_secs: default_notion_timeout_secs(),
            credentials_path: default_credentials_path(),
            api_token_env: default_api_token_env(),
        }
    }
}

fn default_notion_api_url() -> String {
    "https://api.notion.com".to_string()
}

fn default_notion_version() -> String {
    "2022-06-28".to_string()
}

fn default_notion_timeout_secs() -> u64 {
    30
}

fn default_credentials_path() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".scribe").join("credentials.toml"))
        .unwrap_or_else(|| PathBuf::from(".scribe/credentials.toml"))
}

fn default_api_token_env() -> String {
    "NOTION_API_TOKEN".to_string()
}
