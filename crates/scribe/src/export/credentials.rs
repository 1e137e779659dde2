//! Notion credential store
//!
//! Credentials are an API token and the target database ID. They are kept
//! in a small TOML file and may be replaced at runtime through the control
//! API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

use crate::error::{Result, ScribeError};

/// API token plus target database
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotionCredentials {
    #[serde(default)]
    pub api_token: String,
    #[serde(default)]
    pub database_id: String,
}

impl NotionCredentials {
    pub fn new(api_token: impl Into<String>, database_id: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            database_id: database_id.into(),
        }
    }

    /// Both fields are non-blank
    pub fn is_complete(&self) -> bool {
        !self.api_token.trim().is_empty() && !self.database_id.trim().is_empty()
    }

    /// Fill an empty token from the environment variable `var`
    pub fn with_env_fallback(mut self, var: &str) -> Self {
        if self.api_token.trim().is_empty() {
            if let Ok(token) = std::env::var(var) {
                tracing::debug!("Using Notion API token from ${var}");
                self.api_token = token;
            }
        }
        self
    }

    /// Trimmed copy, or a validation error naming the blank field
    pub fn validated(&self) -> Result<Self> {
        let api_token = self.api_token.trim();
        let database_id = self.database_id.trim();
        if api_token.is_empty() {
            return Err(ScribeError::Config("api_token cannot be empty".to_string()));
        }
        if database_id.is_empty() {
            return Err(ScribeError::Config("database_id cannot be empty".to_string()));
        }
        Ok(Self::new(api_token, database_id))
    }
}

/// Persistent storage for [`NotionCredentials`]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Stored credentials; empty when nothing has been saved yet
    async fn load(&self) -> Result<NotionCredentials>;

    /// Validate and persist `credentials`
    async fn save(&self, credentials: &NotionCredentials) -> Result<()>;
}

/// Credentials kept in a TOML file
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Result<NotionCredentials> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No credentials file at {}", self.path.display());
                return Ok(NotionCredentials::default());
            }
            Err(e) => return Err(e.into()),
        };

        toml::from_str(&content).map_err(|e| {
            ScribeError::Config(format!(
                "Failed to parse credentials file {}: {e}",
                self.path.display()
            ))
        })
    }

    async fn save(&self, credentials: &NotionCredentials) -> Result<()> {
        let credentials = credentials.validated()?;
        let content = toml::to_string(&credentials)
            .map_err(|e| ScribeError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, content).await?;

        // Owner read/write only
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            tokio::fs::set_permissions(&self.path, permissions).await?;
        }

        tracing::info!("Saved Notion credentials to {}", self.path.display());
        Ok(())
    }
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    inner: RwLock<NotionCredentials>,
}

impl MemoryCredentialStore {
    pub fn new(credentials: NotionCredentials) -> Self {
        Self {
            inner: RwLock::new(credentials),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self) -> Result<NotionCredentials> {
        Ok(self.inner.read().await.clone())
    }

    async fn save(&self, credentials: &NotionCredentials) -> Result<()> {
        *self.inner.write().await = credentials.validated()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_is_complete() {
        assert!(NotionCredentials::new("secret", "db").is_complete());
        assert!(!NotionCredentials::new("secret", "  ").is_complete());
        assert!(!NotionCredentials::default().is_complete());
    }

    #[test]
    fn test_validated_trims() {
        let creds = NotionCredentials::new("  secret ", "\tdb\n").validated().unwrap();
        assert_eq!(creds, NotionCredentials::new("secret", "db"));
    }

    #[test]
    fn test_validated_rejects_blank_fields() {
        let err = NotionCredentials::new(" ", "db").validated().unwrap_err();
        assert!(err.to_string().contains("api_token"));
        let err = NotionCredentials::new("secret", "").validated().unwrap_err();
        assert!(err.to_string().contains("database_id"));
    }

    #[test]
    fn test_env_fallback_only_fills_empty_token() {
        let var = "SCRIBE_TEST_NOTION_TOKEN_FALLBACK";
        // SAFETY: the variable name is unique to this test
        unsafe { std::env::set_var(var, "from-env") };

        let creds = NotionCredentials::new("", "db").with_env_fallback(var);
        assert_eq!(creds.api_token, "from-env");

        let creds = NotionCredentials::new("stored", "db").with_env_fallback(var);
        assert_eq!(creds.api_token, "stored");

        unsafe { std::env::remove_var(var) };
    }

    #[tokio::test]
    async fn test_file_store_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.toml"));
        assert_eq!(store.load().await.unwrap(), NotionCredentials::default());
    }

    #[tokio::test]
    async fn test_file_store_roundtrip_creates_parent() {
        let dir = tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("nested").join("credentials.toml"));

        store
            .save(&NotionCredentials::new("secret_abc", "db123"))
            .await
            .unwrap();
        assert!(store.path().exists());

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.api_token, "secret_abc");
        assert_eq!(loaded.database_id, "db123");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.toml");
        std::fs::write(&path, "").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        let store = FileCredentialStore::new(&path);
        store
            .save(&NotionCredentials::new("secret_abc", "db123"))
            .await
            .unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_file_store_rejects_blank_save() {
        let dir = tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.toml"));
        assert!(store.save(&NotionCredentials::new("", "db")).await.is_err());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_file_store_invalid_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.toml");
        std::fs::write(&path, "api_token = [").unwrap();
        let err = FileCredentialStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, ScribeError::Config(_)));
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryCredentialStore::default();
        assert!(!store.load().await.unwrap().is_complete());
        store.save(&NotionCredentials::new("t", "d")).await.unwrap();
        assert!(store.load().await.unwrap().is_complete());
    }
}
