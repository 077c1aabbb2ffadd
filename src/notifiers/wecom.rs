//! WeCom (企业微信) group-robot notifier.
//!
//! Sends up to three Markdown messages per run:
//!
//! 1. the AI-news brief, when `ai_news` succeeded
//! 2. the tech briefing, when `tech_insights` succeeded, split into parts
//!    when it is too large for one message
//! 3. GitHub trending, whenever a listing exists (the AI analysis is
//!    preferred over the raw listing)
//!
//! The robot rejects Markdown bodies over 4096 bytes, so every body is
//! capped before it is posted.

use crate::analysis::tech_insights;
use crate::error::{PipelineError, Result};
use crate::models::NewsDigest;
use crate::outputs::OutputTree;
use crate::runner::{Notifier, Plugin, PluginContext, TaskResults};
use crate::scrapers::{ai_news, github_trending};
use crate::utils::truncate_utf8;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use std::fmt::Write as _;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

/// Hard limit the robot enforces on a Markdown body.
pub const MESSAGE_LIMIT: usize = 4096;
/// Budget for one part of a split briefing.
pub const CHUNK_LIMIT: usize = 1900;
/// Budget for the trending message before the "more" notice.
pub const TRENDING_LIMIT: usize = 3800;

const BRIEFING_TITLE: &str = "## 📊 技术行业动态简报";
const TRENDING_TITLE: &str = "# GitHub Trending 今日热榜";
const MORE_NOTICE: &str = "\n\n... (更多内容请查看仓库)";

#[derive(Debug, Deserialize)]
struct WebhookReply {
    errcode: i64,
    #[serde(default)]
    errmsg: String,
}

pub struct WecomNotifier {
    http: reqwest::Client,
    webhook_url: Option<String>,
    timeout: Duration,
    output: OutputTree,
    today: NaiveDate,
    /// Pause between parts of a split message.
    pause: Duration,
}

impl WecomNotifier {
    pub const ID: &'static str = "wecom";
    pub const SUBSCRIBE_TO: &'static [&'static str] = &["ai_news", "trending_ai", "tech_insights"];

    pub fn new(ctx: &PluginContext) -> Self {
        let wecom = &ctx.settings.wecom;
        Self {
            http: ctx.http.clone(),
            webhook_url: wecom.webhook_url.clone(),
            timeout: Duration::from_secs(wecom.timeout_secs),
            output: ctx.output.clone(),
            today: ctx.today,
            pause: Duration::from_secs(1),
        }
    }

    /// AI-news message built from today's digest, if it exists.
    pub async fn news_message(&self) -> Result<Option<String>> {
        let digest: Option<NewsDigest> = self.output.read_json(&ai_news::json_path(self.today)).await?;
        Ok(digest.map(|d| render_news_brief(&d)))
    }

    /// Trending message: analysis first, raw listing second. The raw listing
    /// only carries a date heading, so it gets the message title prepended.
    pub async fn trending_message(&self) -> Result<Option<String>> {
        let analysis = github_trending::analysis_path(self.today);
        let raw = github_trending::markdown_path(self.today);

        let (content, kind) = match self.output.read_text(&analysis).await? {
            Some(content) => (content, "analysis"),
            None => match self.output.read_text(&raw).await? {
                Some(content) => (content, "raw"),
                None => return Ok(None),
            },
        };
        info!(kind, bytes = content.len(), limit = TRENDING_LIMIT, "Trending content");

        let body = truncate_with_notice(&content, TRENDING_LIMIT);
        Ok(Some(if kind == "raw" {
            format!("{TRENDING_TITLE}\n\n{body}")
        } else {
            body
        }))
    }

    /// Briefing parts, each ready to post. Empty when there is no report.
    pub async fn briefing_messages(&self) -> Result<Vec<String>> {
        let Some(content) = self
            .output
            .read_text(&tech_insights::report_path(self.today))
            .await?
        else {
            return Ok(Vec::new());
        };

        if content.len() <= CHUNK_LIMIT {
            return Ok(vec![format!("{BRIEFING_TITLE}\n\n{content}")]);
        }

        let parts = split_markdown(&content, CHUNK_LIMIT);
        info!(bytes = content.len(), parts = parts.len(), "Briefing too long; splitting");
        let total = parts.len();
        Ok(parts
            .into_iter()
            .enumerate()
            .map(|(i, part)| {
                if total > 1 {
                    format!("{BRIEFING_TITLE}\n\n（第 {}/{total} 部分）\n\n{part}", i + 1)
                } else {
                    format!("{BRIEFING_TITLE}\n\n{part}")
                }
            })
            .collect())
    }

    #[instrument(level = "info", skip_all, fields(bytes = content.len()))]
    async fn post_markdown(&self, url: &str, content: &str) -> Result<()> {
        let body = json!({
            "msgtype": "markdown",
            "markdown": { "content": cap_message(content) }
        });
        let response = self
            .http
            .post(url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(PipelineError::Status {
                url: "wecom webhook".to_string(),
                status: status.as_u16(),
                body: text,
            });
        }
        check_reply(&text)
    }

    async fn deliver(&self, url: &str, label: &str, content: &str) -> bool {
        match self.post_markdown(url, content).await {
            Ok(()) => {
                info!(kind = label, "Delivered to WeCom");
                true
            }
            Err(e) => {
                error!(kind = label, error = %e, "WeCom delivery failed");
                false
            }
        }
    }
}

#[async_trait]
impl Notifier for WecomNotifier {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn subscriptions(&self) -> &'static [&'static str] {
        Self::SUBSCRIBE_TO
    }

    #[instrument(level = "info", skip_all, fields(notifier = Self::ID))]
    async fn send(&self, results: &TaskResults) -> Result<bool> {
        let Some(url) = self.webhook_url.as_deref() else {
            error!("WECOM_WEBHOOK_URL is not set");
            return Ok(false);
        };
        let mut delivered = 0usize;

        if results.is_success("ai_news") {
            match self.news_message().await {
                Ok(Some(message)) => {
                    if self.deliver(url, "ai_news", &message).await {
                        delivered += 1;
                    }
                }
                Ok(None) => warn!("ai_news succeeded but today's digest is missing"),
                Err(e) => warn!(error = %e, "Could not build AI news message"),
            }
        } else {
            info!("Skipping AI news: task did not succeed");
        }

        if results.is_success("tech_insights") {
            match self.briefing_messages().await {
                Ok(parts) if !parts.is_empty() => {
                    let mut all_sent = true;
                    for (i, part) in parts.iter().enumerate() {
                        if i > 0 {
                            sleep(self.pause).await;
                        }
                        if !self.deliver(url, "tech_insights", part).await {
                            all_sent = false;
                            break;
                        }
                    }
                    if all_sent {
                        delivered += 1;
                    }
                }
                Ok(_) => warn!("tech_insights succeeded but the briefing file is missing"),
                Err(e) => warn!(error = %e, "Could not build briefing messages"),
            }
        } else {
            info!("Skipping tech briefing: task did not succeed");
        }

        match self.trending_message().await {
            Ok(Some(message)) => {
                if self.deliver(url, "github_trending", &message).await {
                    delivered += 1;
                }
            }
            Ok(None) => warn!("No GitHub trending data for today"),
            Err(e) => warn!(error = %e, "Could not build trending message"),
        }

        info!(delivered, "WeCom notifications finished");
        Ok(delivered > 0)
    }
}

pub fn load(ctx: &PluginContext) -> Result<Vec<Plugin>> {
    Ok(vec![Plugin::notifier(WecomNotifier::new(ctx))])
}

pub fn render_news_brief(digest: &NewsDigest) -> String {
    let mut out = format!("# AI快讯 ({} {})\n## 今日要闻\n", digest.date, digest.weekday);
    for item in &digest.items {
        let _ = write!(
            out,
            "### {}\n> {}\n来源：{} [查看详情]({})\n\n",
            item.title, item.content, item.source, item.url
        );
    }
    out
}

/// Split Markdown into chunks of at most `max_bytes`.
///
/// Every `## ` heading starts a new chunk. Sections still over budget are
/// packed line by line, and single lines over budget are cut on character
/// boundaries.
pub fn split_markdown(content: &str, max_bytes: usize) -> Vec<String> {
    let mut sections: Vec<String> = Vec::new();
    let mut current = String::new();
    for line in content.split('\n') {
        if line.starts_with("## ") && !current.trim().is_empty() {
            sections.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);
    }
    sections.push(current);

    let mut chunks = Vec::new();
    for section in sections {
        if section.len() <= max_bytes {
            chunks.push(section);
        } else {
            chunks.extend(pack_lines(&section, max_bytes));
        }
    }
    chunks.retain(|c| !c.trim().is_empty());
    chunks
}

fn pack_lines(section: &str, max_bytes: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for line in section.split('\n') {
        for piece in split_line(line, max_bytes) {
            let needed = if current.is_empty() { piece.len() } else { current.len() + 1 + piece.len() };
            if !current.is_empty() && needed > max_bytes {
                chunks.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(piece);
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn split_line(line: &str, max_bytes: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut rest = line;
    while rest.len() > max_bytes {
        let mut head = truncate_utf8(rest, max_bytes);
        if head.is_empty() {
            // budget smaller than one character; emit it whole
            let width = rest.chars().next().map_or(rest.len(), char::len_utf8);
            head = &rest[..width];
        }
        pieces.push(head);
        rest = &rest[head.len()..];
    }
    pieces.push(rest);
    pieces
}

/// Cut `content` to `max_bytes` and append the "more" notice when it was cut.
pub fn truncate_with_notice(content: &str, max_bytes: usize) -> String {
    if content.len() <= max_bytes {
        content.to_string()
    } else {
        format!("{}{MORE_NOTICE}", truncate_utf8(content, max_bytes))
    }
}

/// Final guard so no body exceeds [`MESSAGE_LIMIT`].
pub fn cap_message(content: &str) -> &str {
    truncate_utf8(content, MESSAGE_LIMIT)
}

fn check_reply(body: &str) -> Result<()> {
    let reply: WebhookReply = serde_json::from_str(body)?;
    if reply.errcode != 0 {
        return Err(PipelineError::Webhook {
            errcode: reply.errcode,
            errmsg: reply.errmsg,
        });
    }
    Ok(())
}
