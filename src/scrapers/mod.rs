//! Data-source scrapers. Each module contributes one task.
//!
//! Every scraper follows the same two-phase pattern:
//!
//! 1. **Fetching**: download a page or API payload with the shared client
//! 2. **Parsing**: a pure function turns the payload into [`crate::models`] types
//!
//! # Supported Sources
//!
//! | Task | Module | Method | Output |
//! |------|--------|--------|--------|
//! | `ai_news` | [`ai_news`] | HTML scraping | `ai-news/<YYYY>/<date>.{html,json}` |
//! | `hackernews` | [`hackernews`] | Firebase JSON API | `hackernews/<date>.json` |
//! | `producthunt` | [`producthunt`] | HTML scraping, sample fallback | `producthunt/<date>.json` |
//! | `techblogs` | [`techblogs`] | dev.to JSON API, sample fallback | `techblogs/<date>.json` |
//! | `github_trending` | [`github_trending`] | HTML scraping per language | `github-trending/<YYYY>/<date>.md` |
//!
//! Network and markup failures are logged and absorbed into `Ok(false)` (or
//! the documented fallback); only artifact write failures propagate.

pub mod ai_news;
pub mod github_trending;
pub mod hackernews;
pub mod producthunt;
pub mod techblogs;

use crate::config::SourceSettings;
use crate::error::{PipelineError, Result};
use crate::utils::truncate_for_log;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument};

/// GET `url` with browser-like headers and return the body as text.
///
/// Non-2xx answers become [`PipelineError::Status`].
#[instrument(level = "debug", skip(http, sources))]
pub(crate) async fn fetch_page(
    http: &reqwest::Client,
    sources: &SourceSettings,
    url: &str,
) -> Result<String> {
    let response = http
        .get(url)
        .header(USER_AGENT, &sources.user_agent)
        .header(
            ACCEPT,
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        )
        .header(ACCEPT_LANGUAGE, "zh-CN,zh;q=0.8,en;q=0.6")
        .timeout(Duration::from_secs(sources.request_timeout_secs))
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;
    debug!(status = status.as_u16(), bytes = body.len(), "Fetched page");
    if !status.is_success() {
        return Err(PipelineError::Status {
            url: url.to_string(),
            status: status.as_u16(),
            body: truncate_for_log(&body, 200),
        });
    }
    Ok(body)
}

/// GET `url` and decode a JSON body.
#[instrument(level = "debug", skip(http, sources))]
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    http: &reqwest::Client,
    sources: &SourceSettings,
    url: &str,
) -> Result<T> {
    let response = http
        .get(url)
        .header(USER_AGENT, &sources.user_agent)
        .header(ACCEPT, "application/json")
        .timeout(Duration::from_secs(sources.request_timeout_secs))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(PipelineError::Status {
            url: url.to_string(),
            status: status.as_u16(),
            body: truncate_for_log(&body, 200),
        });
    }
    Ok(response.json::<T>().await?)
}
