//! Local file sink

use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;

use crate::error::Result;

/// Destination for a named byte payload
#[async_trait]
pub trait FileSink: Send + Sync {
    /// Write `payload` under `file_name`; returns where it landed
    async fn deliver(&self, file_name: &str, payload: Bytes) -> Result<PathBuf>;
}

/// Writes files into one directory, creating it on first use
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl FileSink for DirectorySink {
    async fn deliver(&self, file_name: &str, payload: Bytes) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(file_name);
        tokio::fs::write(&path, &payload).await?;
        tracing::info!("Wrote {} bytes to {}", payload.len(), path.display());
        Ok(path)
    }
}
