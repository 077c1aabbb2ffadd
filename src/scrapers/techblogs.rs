//! Popular developer blog posts from the dev.to articles API.

use super::fetch_json;
use crate::error::{PipelineError, Result};
use crate::models::BlogArticle;
use crate::runner::{Plugin, PluginContext, Task};
use crate::utils::ymd;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use url::Url;

const MAX_TAGS: usize = 5;

pub fn json_path(date: NaiveDate) -> String {
    format!("techblogs/{}.json", ymd(date))
}

#[derive(Debug, Deserialize)]
pub struct DevtoArticle {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub user: Option<DevtoUser>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub tag_list: Vec<String>,
    #[serde(default)]
    pub reading_time_minutes: u64,
    #[serde(default)]
    pub positive_reactions_count: u64,
}

#[derive(Debug, Deserialize)]
pub struct DevtoUser {
    #[serde(default)]
    pub name: Option<String>,
}

pub struct TechBlogsTask {
    ctx: PluginContext,
}

impl TechBlogsTask {
    pub const ID: &'static str = "techblogs";
    pub const PRIORITY: i32 = 17;

    pub fn new(ctx: PluginContext) -> Self {
        Self { ctx }
    }

    async fn fetch_devto(&self) -> Result<Vec<BlogArticle>> {
        let sources = &self.ctx.settings.sources;
        let mut url = Url::parse(&sources.devto_api)
            .map_err(|e| PipelineError::Config(format!("devto_api: {e}")))?;
        url.query_pairs_mut()
            .append_pair("top", &sources.devto_top_days.to_string())
            .append_pair("per_page", &sources.devto_per_page.to_string());

        let raw: Vec<DevtoArticle> = fetch_json(&self.ctx.http, sources, url.as_str()).await?;
        Ok(raw
            .into_iter()
            .map(|a| to_blog_article(a, self.ctx.today))
            .collect())
    }
}

#[async_trait]
impl Task for TechBlogsTask {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn priority(&self) -> i32 {
        Self::PRIORITY
    }

    #[instrument(level = "info", skip_all, fields(task = Self::ID))]
    async fn execute(&self) -> Result<bool> {
        let articles = match self.fetch_devto().await {
            Ok(articles) if !articles.is_empty() => {
                info!(count = articles.len(), "Fetched dev.to articles");
                articles
            }
            Ok(_) => {
                warn!("dev.to returned no articles; using sample data");
                sample_articles(self.ctx.today)
            }
            Err(e) => {
                warn!(error = %e, "dev.to fetch failed; using sample data");
                sample_articles(self.ctx.today)
            }
        };

        let path = json_path(self.ctx.today);
        self.ctx.output.write_json(&path, &articles).await?;
        info!(
            count = articles.len(),
            path = %self.ctx.output.path(&path).display(),
            "Tech blog articles saved"
        );
        Ok(true)
    }
}

pub fn load(ctx: &PluginContext) -> Result<Vec<Plugin>> {
    Ok(vec![Plugin::task(TechBlogsTask::new(ctx.clone()))])
}

/// Reduce `published_at` to a date; unparseable or missing values fall back to `today`.
pub fn publication_date(published_at: Option<&str>, today: NaiveDate) -> String {
    published_at
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|dt| ymd(dt.date_naive()))
        .unwrap_or_else(|| ymd(today))
}

pub fn to_blog_article(raw: DevtoArticle, today: NaiveDate) -> BlogArticle {
    let author = raw
        .user
        .and_then(|u| u.name)
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "Unknown".to_string());
    BlogArticle {
        published_at: publication_date(raw.published_at.as_deref(), today),
        title: raw.title,
        url: raw.url,
        author,
        source: "devto".to_string(),
        tags: raw.tag_list.into_iter().take(MAX_TAGS).collect(),
        reading_time_minutes: raw.reading_time_minutes,
        positive_reactions_count: raw.positive_reactions_count,
    }
}

/// Listing stored when the API yields nothing.
pub fn sample_articles(today: NaiveDate) -> Vec<BlogArticle> {
    let date = ymd(today);
    let article = |title: &str, url: &str, author: &str, tags: &[&str], minutes, reactions| {
        BlogArticle {
            title: title.to_string(),
            url: url.to_string(),
            author: author.to_string(),
            published_at: date.clone(),
            source: "devto".to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            reading_time_minutes: minutes,
            positive_reactions_count: reactions,
        }
    };
    vec![
        article(
            "The Future of WebAssembly: A Comprehensive Guide",
            "https://dev.to/johndoe/future-of-webassembly",
            "John Doe",
            &["webassembly", "webdev", "performance"],
            8,
            234,
        ),
        article(
            "Why I Switched from Python to Rust for ML",
            "https://dev.to/janesmith/python-to-rust-ml",
            "Jane Smith",
            &["rust", "machinelearning", "python"],
            6,
            567,
        ),
        article(
            "Building AI Agents with Auto-GPT",
            "https://dev.to/alexchen/ai-agents-autogpt",
            "Alex Chen",
            &["ai", "agents", "autogpt"],
            10,
            892,
        ),
    ]
}
