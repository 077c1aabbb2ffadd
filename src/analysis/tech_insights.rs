//! Daily tech-industry briefing across Hacker News, Product Hunt and dev.to.
//!
//! With an LLM configured the briefing is written by the model from the top
//! ten entries of each source. Without one (or when the call fails) a local
//! digest of the same entries is rendered instead, so the notifier always has
//! something to send.

use super::sync_report;
use crate::error::Result;
use crate::llm::{ChatClient, ChatPrompt, ask_with_backoff};
use crate::models::{BlogArticle, HnStory, Product};
use crate::runner::{Plugin, PluginContext, Task};
use crate::scrapers::{hackernews, producthunt, techblogs};
use crate::utils::ymd;
use async_trait::async_trait;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Write as _;
use tracing::{info, instrument, warn};

const TOP_N: usize = 10;
const NO_DATA: &str = "（无数据）";

const SYSTEM_PROMPT: &str = "你是一位技术行业分析师，擅长从社区热度数据中提炼趋势。";

static AI_KEYWORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(ai|llm|llms|gpt|agents?|openai|anthropic|claude|gemini|model|ml)\b")
        .expect("static regex")
});

pub fn report_path(date: NaiveDate) -> String {
    format!("tech-insights/{}.md", ymd(date))
}

/// Everything read back from today's scraper artifacts.
#[derive(Debug, Default)]
pub struct SourceData {
    pub hackernews: Option<Vec<HnStory>>,
    pub producthunt: Option<Vec<Product>>,
    pub techblogs: Option<Vec<BlogArticle>>,
}

impl SourceData {
    /// Names of sources whose artifact exists and is non-empty.
    pub fn available(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.hackernews.as_ref().is_some_and(|v| !v.is_empty()) {
            names.push("hackernews");
        }
        if self.producthunt.as_ref().is_some_and(|v| !v.is_empty()) {
            names.push("producthunt");
        }
        if self.techblogs.as_ref().is_some_and(|v| !v.is_empty()) {
            names.push("techblogs");
        }
        names
    }

    fn stories(&self) -> &[HnStory] {
        self.hackernews.as_deref().unwrap_or(&[])
    }

    fn products(&self) -> &[Product] {
        self.producthunt.as_deref().unwrap_or(&[])
    }

    fn articles(&self) -> &[BlogArticle] {
        self.techblogs.as_deref().unwrap_or(&[])
    }
}

pub struct TechInsightsTask {
    ctx: PluginContext,
}

impl TechInsightsTask {
    pub const ID: &'static str = "tech_insights";
    pub const PRIORITY: i32 = 40;

    pub fn new(ctx: PluginContext) -> Self {
        Self { ctx }
    }

    async fn read_sources(&self) -> SourceData {
        let output = &self.ctx.output;
        let today = self.ctx.today;
        SourceData {
            hackernews: read_or_warn(output.read_json(&hackernews::json_path(today)).await),
            producthunt: read_or_warn(output.read_json(&producthunt::json_path(today)).await),
            techblogs: read_or_warn(output.read_json(&techblogs::json_path(today)).await),
        }
    }
}

fn read_or_warn<T>(read: Result<Option<T>>) -> Option<T> {
    read.unwrap_or_else(|e| {
        warn!(error = %e, "Unreadable source artifact; treating as missing");
        None
    })
}

#[async_trait]
impl Task for TechInsightsTask {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn priority(&self) -> i32 {
        Self::PRIORITY
    }

    #[instrument(level = "info", skip_all, fields(task = Self::ID))]
    async fn execute(&self) -> Result<bool> {
        let data = self.read_sources().await;
        let available = data.available();
        if available.is_empty() {
            warn!("No source data available for today");
            return Ok(false);
        }
        info!(sources = ?available, "Building tech briefing");

        let date = self.ctx.date();
        let briefing = match ChatClient::from_settings(&self.ctx.settings.llm, self.ctx.http.clone()) {
            Some(client) => {
                info!(model = client.model(), "Requesting LLM briefing");
                let prompt = ChatPrompt::new(SYSTEM_PROMPT, build_prompt(&date, &data));
                match ask_with_backoff(&client, &prompt).await {
                    Ok(answer) => answer,
                    Err(e) => {
                        warn!(error = %e, "LLM briefing failed; rendering local digest");
                        render_local_digest(&date, &data)
                    }
                }
            }
            None => {
                info!("No LLM configured; rendering local digest");
                render_local_digest(&date, &data)
            }
        };

        let path = report_path(self.ctx.today);
        self.ctx.output.write_text(&path, &briefing).await?;
        info!(path = %self.ctx.output.path(&path).display(), "Tech briefing saved");

        sync_report(&self.ctx, Self::ID, &briefing).await;
        Ok(true)
    }
}

pub fn load(ctx: &PluginContext) -> Result<Vec<Plugin>> {
    Ok(vec![Plugin::task(TechInsightsTask::new(ctx.clone()))])
}

fn lines_or_placeholder(lines: Vec<String>) -> String {
    if lines.is_empty() {
        NO_DATA.to_string()
    } else {
        lines.join("\n")
    }
}

pub fn build_prompt(date: &str, data: &SourceData) -> String {
    let hn = lines_or_placeholder(
        data.stories()
            .iter()
            .take(TOP_N)
            .map(|s| format!("- {} ({} points, {} comments)", s.title, s.points, s.comments_count))
            .collect(),
    );
    let ph = lines_or_placeholder(
        data.products()
            .iter()
            .take(TOP_N)
            .map(|p| format!("- **{}**: {} ({} votes)", p.name, p.description, p.votes_count))
            .collect(),
    );
    let tb = lines_or_placeholder(
        data.articles()
            .iter()
            .take(TOP_N)
            .map(|a| format!("- **{}** by {} ({})", a.title, a.author, a.source))
            .collect(),
    );

    format!(
        "请基于以下数据源，生成一份简洁的技术行业动态简报。\n\n\
         ## 数据源\n\n\
         ### 1. Hacker News\n{hn}\n\n\
         ### 2. Product Hunt\n{ph}\n\n\
         ### 3. 技术博客热门文章\n{tb}\n\n\
         ## 要求\n\n\
         使用中文，控制在 1000 字以内，按以下结构输出 Markdown：\n\n\
         # 技术行业动态简报 - {date}\n\n\
         ## 🔥 今日热门技术话题\n\
         ## 🚀 新兴热门项目\n\
         ## 📊 技术趋势观察\n\
         ## 🤖 AI 前沿动态\n\
         ## 🛠️ 新工具推荐\n\
         ## 💡 技术洞察\n"
    )
}

/// Share of titles that mention AI topics, as a whole percentage.
pub fn ai_share(titles: &[&str]) -> Option<usize> {
    if titles.is_empty() {
        return None;
    }
    let hits = titles.iter().filter(|t| AI_KEYWORDS.is_match(t)).count();
    Some(hits * 100 / titles.len())
}

/// Deterministic briefing built from the raw entries.
pub fn render_local_digest(date: &str, data: &SourceData) -> String {
    let mut out = format!("# 技术行业动态简报 - {date}\n");

    if !data.stories().is_empty() {
        out.push_str("\n## 🔥 Hacker News 热门\n\n");
        for (i, s) in data.stories().iter().take(TOP_N).enumerate() {
            let domain = s.domain().map(|d| format!(" ({d})")).unwrap_or_default();
            let _ = writeln!(
                out,
                "{}. [{}]({}){} - {} points, {} comments",
                i + 1,
                s.title,
                s.url,
                domain,
                s.points,
                s.comments_count
            );
        }
    }

    if !data.products().is_empty() {
        out.push_str("\n## 🚀 Product Hunt 新品\n\n");
        for p in data.products().iter().take(TOP_N) {
            let _ = writeln!(out, "- **[{}]({})**: {} ({} votes)", p.name, p.url, p.description, p.votes_count);
        }
    }

    if !data.articles().is_empty() {
        out.push_str("\n## 📝 技术博客热文\n\n");
        for a in data.articles().iter().take(TOP_N) {
            let tags = if a.tags.is_empty() {
                String::new()
            } else {
                format!(" `{}`", a.tags.join("` `"))
            };
            let _ = writeln!(out, "- [{}]({}) by {}{}", a.title, a.url, a.author, tags);
        }
    }

    let titles: Vec<&str> = data
        .stories()
        .iter()
        .map(|s| s.title.as_str())
        .chain(data.products().iter().map(|p| p.name.as_str()))
        .chain(data.articles().iter().map(|a| a.title.as_str()))
        .collect();
    out.push_str("\n## 📊 数据概览\n\n");
    let _ = writeln!(out, "- 数据源: {}", data.available().join(", "));
    let _ = writeln!(out, "- 条目总数: {}", titles.len());
    if let Some(share) = ai_share(&titles) {
        let _ = writeln!(out, "- AI 相关占比: {share}%");
    }

    out.push_str("\n---\n*本简报由本地数据自动汇总 | 数据来源: Hacker News, Product Hunt, dev.to*\n");
    out
}
