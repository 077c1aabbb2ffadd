//! Analysis tasks built on top of the scraped artifacts.
//!
//! | Task | Input | Output |
//! |------|-------|--------|
//! | `trending_ai` | today's trending Markdown | `github-trending/<YYYY>/<date>-analysis.md` |
//! | `tech_insights` | today's HN / Product Hunt / dev.to JSON | `tech-insights/<date>.md` |
//!
//! Both publish their report to Notion when sync is configured. A failed
//! sync is logged and never fails the task.

pub mod tech_insights;
pub mod trending_ai;

use crate::notion::NotionClient;
use crate::runner::PluginContext;
use tracing::{info, warn};

/// Push a finished report to the task's Notion database, if configured.
pub(crate) async fn sync_report(ctx: &PluginContext, task_id: &str, markdown: &str) {
    let client = NotionClient::new(&ctx.settings.notion, ctx.http.clone());
    if !client.is_available() {
        info!(task = task_id, "Notion not configured; skipping sync");
        return;
    }
    match client.sync_markdown(task_id, markdown, &ctx.date()).await {
        Ok(true) => info!(task = task_id, "Report synced to Notion"),
        Ok(false) => warn!(task = task_id, "Notion sync skipped"),
        Err(e) => warn!(task = task_id, error = %e, "Notion sync failed"),
    }
}
