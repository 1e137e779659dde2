//! Export dispatcher
//!
//! Delivers a rendered document to the local file sink as Markdown or to
//! Notion as a capped block sequence. Blocks are derived fresh from the
//! document on every Notion export.

mod credentials;
mod file;
mod notion;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

pub use credentials::{
    CredentialStore, FileCredentialStore, MemoryCredentialStore, NotionCredentials,
};
pub use file::{DirectorySink, FileSink};
pub use notion::{DocumentSink, NotionClient, PageReceipt, page_request_body};

use crate::blocks::{BlockCapper, markdown_to_blocks};
use crate::config::Config;
use crate::error::{Result, ScribeError};
use crate::render::RenderedDocument;

/// Where an export goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportTarget {
    File,
    Notion,
}

/// Outcome of a successful export
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "target", rename_all = "snake_case")]
pub enum ExportReceipt {
    File {
        path: PathBuf,
        bytes: usize,
    },
    Notion {
        page_id: String,
        page_url: String,
        truncated: bool,
        blocks: usize,
        dropped_segments: usize,
    },
}

const UNSAFE_FILE_NAME_CHARS: [char; 10] = ['/', '\\', '?', '%', '*', ':', '|', '"', '<', '>'];

/// `<prefix> - <title>_<timestamp>.md` with path-unsafe characters
/// replaced by `-`
pub fn export_file_name(title_prefix: &str, title: &str, now: DateTime<Utc>) -> String {
    let stem: String = format!("{title_prefix} - {title}")
        .chars()
        .map(|c| if UNSAFE_FILE_NAME_CHARS.contains(&c) { '-' } else { c })
        .collect();
    format!("{stem}_{}.md", now.format("%Y-%m-%dT%H-%M-%S"))
}

/// Routes export commands to the configured sinks
#[derive(Clone)]
pub struct ExportDispatcher {
    title_prefix: String,
    capper: BlockCapper,
    files: Arc<dyn FileSink>,
    pages: Arc<dyn DocumentSink>,
}

impl std::fmt::Debug for ExportDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportDispatcher")
            .field("title_prefix", &self.title_prefix)
            .field("capper", &self.capper)
            .finish_non_exhaustive()
    }
}

impl ExportDispatcher {
    pub fn new(
        title_prefix: impl Into<String>,
        capper: BlockCapper,
        files: Arc<dyn FileSink>,
        pages: Arc<dyn DocumentSink>,
    ) -> Self {
        Self {
            title_prefix: title_prefix.into(),
            capper,
            files,
            pages,
        }
    }

    /// Directory sink and Notion client built from `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            config.export.title_prefix.clone(),
            BlockCapper::new(config.export.block_ceiling),
            Arc::new(DirectorySink::new(config.export.output_dir.clone())),
            Arc::new(NotionClient::new(&config.notion)?),
        ))
    }

    pub fn title_prefix(&self) -> &str {
        &self.title_prefix
    }

    /// Suggested file name for `document` at the current time
    pub fn file_name_for(&self, document: &RenderedDocument) -> String {
        export_file_name(&self.title_prefix, &document.title, Utc::now())
    }

    pub async fn export(
        &self,
        document: &RenderedDocument,
        target: ExportTarget,
        credentials: &NotionCredentials,
    ) -> Result<ExportReceipt> {
        match target {
            ExportTarget::File => self.export_file(document).await,
            ExportTarget::Notion => self.export_notion(document, credentials).await,
        }
    }

    pub async fn export_file(&self, document: &RenderedDocument) -> Result<ExportReceipt> {
        let file_name = self.file_name_for(document);
        let payload = Bytes::from(document.markdown.clone());
        let bytes = payload.len();
        let path = self.files.deliver(&file_name, payload).await?;
        Ok(ExportReceipt::File { path, bytes })
    }

    /// Credentials are checked before anything touches the network
    pub async fn export_notion(
        &self,
        document: &RenderedDocument,
        credentials: &NotionCredentials,
    ) -> Result<ExportReceipt> {
        if !credentials.is_complete() {
            tracing::warn!("Notion export requested without credentials");
            return Err(ScribeError::MissingCredentials);
        }

        let capped = markdown_to_blocks(&document.markdown, &self.capper);
        if capped.truncated {
            tracing::warn!(
                "Document '{}' truncated for Notion: {} of {} segments kept",
                document.title,
                capped.emitted_segments,
                capped.segment_count
            );
        }

        let page = self
            .pages
            .create_page(credentials, &document.title, &capped.blocks)
            .await?;

        Ok(ExportReceipt::Notion {
            page_id: page.page_id,
            page_url: page.page_url,
            truncated: capped.truncated,
            blocks: capped.blocks.len(),
            dropped_segments: capped.dropped(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::Block;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::Mutex;

    /// Records every page request instead of sending it
    #[derive(Default)]
    struct RecordingSink {
        calls: Mutex<Vec<(String, Vec<Block>)>>,
    }

    #[async_trait]
    impl DocumentSink for RecordingSink {
        async fn create_page(
            &self,
            _credentials: &NotionCredentials,
            title: &str,
            blocks: &[Block],
        ) -> Result<PageReceipt> {
            self.calls
                .lock()
                .unwrap()
                .push((title.to_string(), blocks.to_vec()));
            Ok(PageReceipt::from_page_id("11-22"))
        }
    }

    fn document(markdown: &str) -> RenderedDocument {
        RenderedDocument {
            markdown: markdown.to_string(),
            title: "Plans".to_string(),
            rendered_at: Utc::now(),
        }
    }

    fn dispatcher(dir: &std::path::Path, pages: Arc<RecordingSink>) -> ExportDispatcher {
        ExportDispatcher::new(
            "DeepSeek",
            BlockCapper::default(),
            Arc::new(DirectorySink::new(dir)),
            pages,
        )
    }

    #[test]
    fn test_export_file_name() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(
            export_file_name("DeepSeek", "a/b: c?", now),
            "DeepSeek - a-b- c-_2024-03-09T07-05-01.md"
        );
        assert_eq!(
            export_file_name("X", r#"\%*|"<>"#, now),
            "X - -------_2024-03-09T07-05-01.md"
        );
    }

    #[tokio::test]
    async fn test_export_file_writes_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let dispatcher = dispatcher(dir.path(), Arc::new(RecordingSink::default()));

        let receipt = dispatcher
            .export(&document("# Title\n"), ExportTarget::File, &NotionCredentials::default())
            .await
            .unwrap();

        let ExportReceipt::File { path, bytes } = receipt else {
            panic!("expected a file receipt");
        };
        assert_eq!(bytes, 8);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Title\n");
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("DeepSeek - Plans_"));
        assert!(name.ends_with(".md"));
    }

    #[tokio::test]
    async fn test_export_notion_requires_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let pages = Arc::new(RecordingSink::default());
        let dispatcher = dispatcher(dir.path(), pages.clone());

        let err = dispatcher
            .export_notion(&document("# T\n"), &NotionCredentials::new("token", " "))
            .await
            .unwrap_err();

        assert!(matches!(err, ScribeError::MissingCredentials));
        assert!(pages.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_export_notion_sends_capped_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let pages = Arc::new(RecordingSink::default());
        let dispatcher = dispatcher(dir.path(), pages.clone());

        let markdown: String = (0..200).map(|i| format!("p{i}\n\n")).collect();
        let receipt = dispatcher
            .export_notion(&document(&markdown), &NotionCredentials::new("t", "d"))
            .await
            .unwrap();

        assert_eq!(
            receipt,
            ExportReceipt::Notion {
                page_id: "11-22".to_string(),
                page_url: "https://notion.so/1122".to_string(),
                truncated: true,
                blocks: 95,
                dropped_segments: 107,
            }
        );

        let calls = pages.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "Plans");
        assert_eq!(calls[0].1.len(), 95);
        assert_eq!(calls[0].1[1].text(), "p0");
    }
}
