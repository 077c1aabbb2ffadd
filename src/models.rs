//! Data models for scraped items and the JSON artifacts built from them.
//!
//! - [`NewsDigest`] / [`NewsItem`]: one day of the AI-news aggregator
//! - [`HnStory`]: a Hacker News top story with a link
//! - [`Product`]: a Product Hunt launch card
//! - [`BlogArticle`]: a popular dev.to article
//!
//! Field names match the artifact files on disk, which downstream consumers
//! (the chat notifier, the insights briefing) read back.

use serde::{Deserialize, Serialize};

/// The AI-news page for one day.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct NewsDigest {
    /// The run date in `YYYY-MM-DD` format.
    pub date: String,
    /// The weekday label printed next to the page's date, if any.
    pub weekday: String,
    pub items: Vec<NewsItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct NewsItem {
    pub title: String,
    pub url: String,
    /// Summary paragraph with the trailing source attribution removed.
    pub content: String,
    pub source: String,
}

/// A Hacker News story. Text-only posts (Ask HN and friends) are never stored.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct HnStory {
    pub title: String,
    pub url: String,
    pub points: u64,
    pub comments_count: u64,
    /// Submission time, `YYYY-MM-DDTHH:MM:SS`.
    pub posted_at: String,
    pub source: String,
    pub hn_id: u64,
}

impl HnStory {
    /// Registrable domain of the story link, e.g. `"https://blog.rust-lang.org/x"` -> `"rust-lang.org"`.
    pub fn domain(&self) -> Option<String> {
        let parsed = url::Url::parse(&self.url).ok()?;
        let host = parsed.host_str()?;
        let parts: Vec<&str> = host.split('.').collect();
        if parts.len() >= 2 {
            Some(parts[parts.len() - 2..].join("."))
        } else {
            Some(host.to_string())
        }
    }
}

/// A Product Hunt launch.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Product {
    pub name: String,
    pub description: String,
    pub url: String,
    pub votes_count: u64,
    /// The listing page does not show comment counts; scraped cards carry 0.
    pub comments_count: u64,
    pub tags: Vec<String>,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BlogArticle {
    pub title: String,
    pub url: String,
    pub author: String,
    /// Publication date, `YYYY-MM-DD`.
    pub published_at: String,
    pub source: String,
    pub tags: Vec<String>,
    pub reading_time_minutes: u64,
    pub positive_reactions_count: u64,
}
