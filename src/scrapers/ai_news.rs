//! AI-news aggregator scraper.
//!
//! The aggregator publishes one page listing recent days, newest first. Each
//! day is a `.news-list` block whose direct children are a `.news-date`
//! header (`2025年5月6日 · 星期二`) followed by `.news-item` cards. Only the
//! first block (today) is kept.

use super::fetch_page;
use crate::error::Result;
use crate::models::{NewsDigest, NewsItem};
use crate::runner::{Plugin, PluginContext, Task};
use crate::utils::{collapse_whitespace, year, ymd};
use async_trait::async_trait;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{error, info, instrument, warn};
use url::Url;

static NEWS_LIST: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".news-list").expect("static selector"));
static CONTENT: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".news-content").expect("static selector"));
static TITLE_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h2 a").expect("static selector"));
static SUMMARY: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p.text-muted").expect("static selector"));
static SOURCE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".news-time").expect("static selector"));

const SOURCE_PREFIX: &str = "来源：";

/// Raw page snapshot for `date`.
pub fn html_path(date: NaiveDate) -> String {
    format!("ai-news/{}/{}.html", year(date), ymd(date))
}

/// Parsed digest for `date`; the chat notifier reads this back.
pub fn json_path(date: NaiveDate) -> String {
    format!("ai-news/{}/{}.json", year(date), ymd(date))
}

pub struct AiNewsTask {
    ctx: PluginContext,
}

impl AiNewsTask {
    pub const ID: &'static str = "ai_news";
    pub const PRIORITY: i32 = 10;

    pub fn new(ctx: PluginContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Task for AiNewsTask {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn priority(&self) -> i32 {
        Self::PRIORITY
    }

    #[instrument(level = "info", skip_all, fields(task = Self::ID))]
    async fn execute(&self) -> Result<bool> {
        let sources = &self.ctx.settings.sources;
        let page_url = sources.ai_news_url.as_str();

        let html = match fetch_page(&self.ctx.http, sources, page_url).await {
            Ok(html) => html,
            Err(e) => {
                error!(url = page_url, error = %e, "Failed to fetch AI news");
                return Ok(false);
            }
        };
        self.ctx
            .output
            .write_text(&html_path(self.ctx.today), &html)
            .await?;

        let Some(digest) = parse_news(&html, page_url, &self.ctx.date()) else {
            warn!(url = page_url, "No .news-list block on the page");
            return Ok(false);
        };
        info!(count = digest.items.len(), weekday = %digest.weekday, "Parsed AI news");

        let path = json_path(self.ctx.today);
        self.ctx.output.write_json(&path, &digest).await?;
        info!(path = %self.ctx.output.path(&path).display(), "AI news saved");
        Ok(true)
    }
}

pub fn load(ctx: &PluginContext) -> Result<Vec<Plugin>> {
    Ok(vec![Plugin::task(AiNewsTask::new(ctx.clone()))])
}

/// Parse the first day block of the aggregator page.
///
/// Returns `None` when the page has no `.news-list` at all. Relative links
/// are resolved against `page_url`.
pub fn parse_news(html: &str, page_url: &str, date: &str) -> Option<NewsDigest> {
    let document = Html::parse_document(html);
    let list = document.select(&NEWS_LIST).next()?;
    let base = Url::parse(page_url).ok();

    let weekday = direct_children(list, "news-date")
        .next()
        .map(text_of)
        .and_then(|text| text.split('·').nth(1).map(|w| w.trim().to_string()))
        .unwrap_or_default();

    let items = direct_children(list, "news-item")
        .filter_map(|item| parse_item(item, base.as_ref()))
        .collect();

    Some(NewsDigest {
        date: date.to_string(),
        weekday,
        items,
    })
}

fn parse_item(item: ElementRef<'_>, base: Option<&Url>) -> Option<NewsItem> {
    let content = item.select(&CONTENT).next()?;
    let link = content.select(&TITLE_LINK).next();

    let title = link.map(text_of).unwrap_or_default();
    let href = link
        .and_then(|a| a.value().attr("href"))
        .unwrap_or_default();
    let url = match base.and_then(|b| b.join(href).ok()) {
        Some(resolved) if !href.is_empty() => resolved.to_string(),
        _ => href.to_string(),
    };

    let source = content
        .select(&SOURCE)
        .next()
        .map(text_of)
        .unwrap_or_default()
        .replace(SOURCE_PREFIX, "")
        .trim()
        .to_string();
    let summary = content.select(&SUMMARY).next().map(text_of).unwrap_or_default();
    let body = summary
        .replace(&format!("{SOURCE_PREFIX}{source}"), "")
        .trim()
        .to_string();

    Some(NewsItem {
        title,
        url,
        content: body,
        source,
    })
}

/// Element children of `parent` carrying `class`, without descending further.
fn direct_children<'a>(
    parent: ElementRef<'a>,
    class: &'a str,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |el| el.value().classes().any(|c| c == class))
}

fn text_of(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
        <div class="news-list">
          <div class="news-date">2025年5月6日 · 星期二</div>
          <div class="news-item">
            <div class="news-content">
              <h2><a href="https://example.com/a">OpenAI ships a new model</a></h2>
              <p class="text-muted">Faster and cheaper.
                <span class="news-time">来源：TechCrunch</span></p>
            </div>
          </div>
          <div class="news-item">
            <div class="news-content">
              <h2><a href="/post/42">国产大模型更新</a></h2>
              <p class="text-muted">支持长上下文。 <span class="news-time">来源：机器之心</span></p>
            </div>
          </div>
          <div class="wrapper">
            <div class="news-item">
              <div class="news-content"><h2><a href="/nested">Nested</a></h2></div>
            </div>
          </div>
        </div>
        <div class="news-list">
          <div class="news-date">2025年5月5日 · 星期一</div>
          <div class="news-item">
            <div class="news-content"><h2><a href="/old">Yesterday</a></h2></div>
          </div>
        </div>
        </body></html>
    "#;

    #[test]
    fn test_parse_first_block_only() {
        let digest = parse_news(PAGE, "https://ai-bot.cn/daily-ai-news/", "2025-05-06").unwrap();
        assert_eq!(digest.date, "2025-05-06");
        assert_eq!(digest.weekday, "星期二");
        assert_eq!(digest.items.len(), 2);
        assert!(digest.items.iter().all(|i| i.title != "Yesterday"));
    }

    #[test]
    fn test_parse_item_fields() {
        let digest = parse_news(PAGE, "https://ai-bot.cn/daily-ai-news/", "2025-05-06").unwrap();
        let first = &digest.items[0];
        assert_eq!(first.title, "OpenAI ships a new model");
        assert_eq!(first.url, "https://example.com/a");
        assert_eq!(first.content, "Faster and cheaper.");
        assert_eq!(first.source, "TechCrunch");

        let second = &digest.items[1];
        assert_eq!(second.url, "https://ai-bot.cn/post/42");
        assert_eq!(second.content, "支持长上下文。");
        assert_eq!(second.source, "机器之心");
    }

    #[test]
    fn test_nested_items_are_ignored() {
        let digest = parse_news(PAGE, "https://ai-bot.cn/daily-ai-news/", "2025-05-06").unwrap();
        assert!(digest.items.iter().all(|i| i.title != "Nested"));
    }

    #[test]
    fn test_missing_list_is_none() {
        assert!(parse_news("<html><body><p>maintenance</p></body></html>", "https://x.test/", "2025-05-06").is_none());
    }

    #[test]
    fn test_missing_weekday_is_empty() {
        let html = r#"<div class="news-list"><div class="news-date">2025年5月6日</div></div>"#;
        let digest = parse_news(html, "https://x.test/", "2025-05-06").unwrap();
        assert_eq!(digest.weekday, "");
        assert!(digest.items.is_empty());
    }

    #[test]
    fn test_artifact_paths() {
        let d = NaiveDate::from_ymd_opt(2025, 5, 6).unwrap();
        assert_eq!(html_path(d), "ai-news/2025/2025-05-06.html");
        assert_eq!(json_path(d), "ai-news/2025/2025-05-06.json");
    }

    #[test]
    fn test_load_registers_one_task() {
        let dir = tempfile::tempdir().unwrap();
        let plugins = load(&PluginContext::for_tests(dir.path())).unwrap();
        assert_eq!(plugins.len(), 1);
        assert_eq!(plugins[0].id(), AiNewsTask::ID);
    }
}
