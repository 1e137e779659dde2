//! Notion page sink
//!
//! Creates one page per export in the configured database. The request is
//! sent once; failures are reported to the caller, never retried.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;

use super::credentials::NotionCredentials;
use crate::blocks::Block;
use crate::config::NotionConfig;
use crate::error::{Result, ScribeError};

/// Identity of a created page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageReceipt {
    pub page_id: String,
    pub page_url: String,
}

impl PageReceipt {
    pub fn from_page_id(page_id: impl Into<String>) -> Self {
        let page_id = page_id.into();
        let page_url = format!("https://notion.so/{}", page_id.replace('-', ""));
        Self { page_id, page_url }
    }
}

/// A remote destination that turns a block sequence into a page
#[async_trait]
pub trait DocumentSink: Send + Sync {
    async fn create_page(
        &self,
        credentials: &NotionCredentials,
        title: &str,
        blocks: &[Block],
    ) -> Result<PageReceipt>;
}

/// Notion REST API client
#[derive(Debug, Clone)]
pub struct NotionClient {
    client: Client,
    api_url: String,
    notion_version: String,
}

#[derive(Debug, Deserialize)]
struct CreatedPage {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

impl NotionClient {
    pub fn new(config: &NotionConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ScribeError::Config(format!("Failed to build HTTP client: {e}")))?;

        tracing::debug!(
            "NotionClient initialized with api_url: {}, version: {}",
            config.api_url,
            config.notion_version
        );

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            notion_version: config.notion_version.clone(),
        })
    }

    fn pages_url(&self) -> String {
        format!("{}/v1/pages", self.api_url)
    }
}

/// Request body for `POST /v1/pages`
pub fn page_request_body(database_id: &str, title: &str, blocks: &[Block]) -> Value {
    json!({
        "parent": {"database_id": database_id},
        "properties": {
            "title": {"title": [{"text": {"content": title}}]}
        },
        "children": blocks.iter().map(block_json).collect::<Vec<_>>(),
    })
}

/// One block object; the whole text goes into a single rich-text run
fn block_json(block: &Block) -> Value {
    let block_type = block.block_type();
    let mut object = json!({"object": "block", "type": block_type});
    object[block_type] = json!({
        "rich_text": [{"type": "text", "text": {"content": block.text()}}]
    });
    object
}

fn error_message(body: &str) -> String {
    if let Ok(ApiErrorBody { message: Some(message) }) = serde_json::from_str(body) {
        return message;
    }
    if body.trim().is_empty() {
        "unknown error".to_string()
    } else {
        body.to_string()
    }
}

#[async_trait]
impl DocumentSink for NotionClient {
    async fn create_page(
        &self,
        credentials: &NotionCredentials,
        title: &str,
        blocks: &[Block],
    ) -> Result<PageReceipt> {
        let url = self.pages_url();
        let body = page_request_body(&credentials.database_id, title, blocks);
        tracing::debug!("Creating Notion page '{}' with {} blocks", title, blocks.len());

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", credentials.api_token))
            .header("Notion-Version", &self.notion_version)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Notion request to {url} failed: {e}");
                ScribeError::NetworkUnreachable(e.to_string())
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ScribeError::NetworkUnreachable(e.to_string()))?;

        if !status.is_success() {
            let message = error_message(&text);
            tracing::error!("Notion API returned {status}: {message}");
            return Err(ScribeError::RemoteSink {
                status: status.as_u16(),
                message,
            });
        }

        let page: CreatedPage = serde_json::from_str(&text).map_err(|e| {
            ScribeError::Serialization(format!("Unexpected Notion response: {e}"))
        })?;

        let receipt = PageReceipt::from_page_id(page.id);
        tracing::info!("Created Notion page {}", receipt.page_url);
        Ok(receipt)
    }
}
