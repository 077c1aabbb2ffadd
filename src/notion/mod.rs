//! Optional sync of generated reports into Notion databases.
//!
//! Each task that publishes a report maps to a database id, resolved from
//! `NOTION_DB_<TASK_ID>` first and the obsolete `config/notion_config.json`
//! second. A sync creates one page titled with the run date; when duplicate
//! deletion is on, same-titled pages are archived first so reruns replace
//! the earlier page.
//!
//! # Submodules
//!
//! - [`blocks`]: Markdown to block conversion

pub mod blocks;

use crate::config::NotionSettings;
use crate::error::{PipelineError, Result};
use crate::utils::truncate_for_log;
use reqwest::Method;
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

/// Maximum number of children Notion accepts per request.
pub const MAX_BLOCKS_PER_REQUEST: usize = 100;

#[derive(Clone)]
pub struct NotionClient {
    http: reqwest::Client,
    settings: NotionSettings,
}

impl NotionClient {
    pub fn new(settings: &NotionSettings, http: reqwest::Client) -> Self {
        Self {
            http,
            settings: settings.clone(),
        }
    }

    /// Sync is enabled and an integration token is present.
    pub fn is_available(&self) -> bool {
        if !self.settings.enabled {
            self.log("Notion sync disabled");
            return false;
        }
        if self.settings.api_key.is_none() {
            self.log("NOTION_API_KEY not configured");
            return false;
        }
        true
    }

    /// Target database for `task_id`: environment first, legacy file second.
    pub fn database_id(&self, task_id: &str) -> Option<&str> {
        if let Some(id) = self.settings.databases.get(task_id) {
            self.log(&format!("Using database from NOTION_DB_{}", task_id.to_ascii_uppercase()));
            return Some(id.as_str());
        }
        if let Some(id) = self.settings.legacy_databases.get(task_id) {
            self.log(&format!("Using database from legacy config for {task_id}"));
            return Some(id.as_str());
        }
        self.log(&format!("No database configured for {task_id}"));
        None
    }

    /// Publish `markdown` as a page titled `date` in the database for `task_id`.
    ///
    /// Returns `Ok(false)` when there is nowhere to publish. Dry-run mode
    /// returns `Ok(true)` without touching the network.
    #[instrument(level = "info", skip(self, markdown), fields(bytes = markdown.len()))]
    pub async fn sync_markdown(&self, task_id: &str, markdown: &str, date: &str) -> Result<bool> {
        let blocks = blocks::markdown_to_blocks(markdown);

        if self.settings.dry_run {
            info!(blocks = blocks.len(), "Dry run: skipping Notion sync");
            return Ok(true);
        }
        if self.settings.api_key.is_none() {
            warn!("NOTION_API_KEY not configured; cannot sync");
            return Ok(false);
        }
        let Some(database_id) = self.database_id(task_id) else {
            warn!("No Notion database configured for this task");
            return Ok(false);
        };

        if self.settings.delete_duplicates {
            let archived = self.archive_pages_titled(database_id, date).await?;
            if archived > 0 {
                info!(archived, "Archived pages with the same title");
            }
        }

        let mut chunks = blocks.chunks(MAX_BLOCKS_PER_REQUEST);
        let first = chunks.next().unwrap_or(&[]);
        let payload = page_payload(database_id, &self.settings.title_property, date, first);
        let page = self.call(Method::POST, "/pages", &payload).await?;
        let page_id = page["id"]
            .as_str()
            .ok_or_else(|| PipelineError::Notion("created page has no id".to_string()))?
            .to_string();

        for chunk in chunks {
            self.call(
                Method::PATCH,
                &format!("/blocks/{page_id}/children"),
                &json!({ "children": chunk }),
            )
            .await?;
        }

        info!(%page_id, blocks = blocks.len(), "Synced page to Notion");
        Ok(true)
    }

    async fn archive_pages_titled(&self, database_id: &str, title: &str) -> Result<usize> {
        let query = json!({
            "filter": {
                "property": self.settings.title_property,
                "title": { "equals": title }
            }
        });
        let found = self
            .call(Method::POST, &format!("/databases/{database_id}/query"), &query)
            .await?;

        let ids: Vec<String> = found["results"]
            .as_array()
            .map(|pages| {
                pages
                    .iter()
                    .filter_map(|p| p["id"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        for id in &ids {
            self.call(Method::PATCH, &format!("/pages/{id}"), &json!({ "archived": true }))
                .await?;
            self.log(&format!("Archived duplicate page {id}"));
        }
        Ok(ids.len())
    }

    async fn call(&self, method: Method, path: &str, body: &Value) -> Result<Value> {
        let url = format!("{}{path}", self.settings.api_base.trim_end_matches('/'));
        let token = self.settings.api_key.as_deref().unwrap_or_default();

        let response = self
            .http
            .request(method, &url)
            .bearer_auth(token)
            .header("Notion-Version", &self.settings.api_version)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(PipelineError::Status {
                url,
                status: status.as_u16(),
                body: truncate_for_log(&text, 500),
            });
        }
        Ok(response.json().await?)
    }

    fn log(&self, message: &str) {
        if self.settings.debug {
            info!(target: "notion", "{message}");
        } else {
            debug!(target: "notion", "{message}");
        }
    }
}

/// Body for creating a page titled `title` with the given children.
pub fn page_payload(database_id: &str, title_property: &str, title: &str, children: &[Value]) -> Value {
    json!({
        "parent": { "database_id": database_id },
        "properties": {
            title_property: {
                "title": [{ "text": { "content": title } }]
            }
        },
        "children": children,
    })
}
