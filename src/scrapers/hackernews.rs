//! Hacker News top stories via the public Firebase API.
//!
//! `topstories.json` returns up to 500 ids; the first `hackernews_limit` are
//! fetched a few at a time. Stories without an outbound link and items that
//! fail to load are dropped; the task fails only when none could be stored.

use super::fetch_json;
use crate::error::Result;
use crate::models::HnStory;
use crate::runner::{Plugin, PluginContext, Task};
use crate::utils::ymd;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use tracing::{debug, error, info, instrument, warn};

const CONCURRENCY: usize = 8;

pub fn json_path(date: NaiveDate) -> String {
    format!("hackernews/{}.json", ymd(date))
}

/// Subset of the item payload we read.
#[derive(Debug, Default, Deserialize)]
pub struct HnItem {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub score: Option<u64>,
    #[serde(default)]
    pub descendants: Option<u64>,
    #[serde(default)]
    pub time: Option<i64>,
}

pub struct HackerNewsTask {
    ctx: PluginContext,
}

impl HackerNewsTask {
    pub const ID: &'static str = "hackernews";
    pub const PRIORITY: i32 = 15;

    pub fn new(ctx: PluginContext) -> Self {
        Self { ctx }
    }

    async fn fetch_item(&self, id: u64) -> Result<Option<HnItem>> {
        let sources = &self.ctx.settings.sources;
        let url = format!("{}/item/{id}.json", sources.hackernews_api);
        fetch_json::<Option<HnItem>>(&self.ctx.http, sources, &url).await
    }
}

#[async_trait]
impl Task for HackerNewsTask {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn priority(&self) -> i32 {
        Self::PRIORITY
    }

    #[instrument(level = "info", skip_all, fields(task = Self::ID))]
    async fn execute(&self) -> Result<bool> {
        let sources = &self.ctx.settings.sources;
        let top_url = format!("{}/topstories.json", sources.hackernews_api);

        let ids: Vec<u64> = match fetch_json(&self.ctx.http, sources, &top_url).await {
            Ok(ids) => ids,
            Err(e) => {
                error!(url = %top_url, error = %e, "Failed to fetch top story ids");
                return Ok(false);
            }
        };
        let limit = sources.hackernews_limit;
        let requested = ids.len().min(limit);
        info!(available = ids.len(), limit, "Fetching Hacker News top stories");

        // `buffered` keeps ranking order while fetching a few items at a time.
        let stories: Vec<HnStory> = stream::iter(ids.into_iter().take(limit))
            .map(|id| async move { (id, self.fetch_item(id).await) })
            .buffered(CONCURRENCY)
            .filter_map(|(id, fetched)| async move {
                match fetched {
                    Ok(Some(item)) => {
                        let story = story_from_item(id, item);
                        if story.is_none() {
                            debug!(id, "Skipping story without a link");
                        }
                        story
                    }
                    Ok(None) => {
                        debug!(id, "Item no longer exists");
                        None
                    }
                    Err(e) => {
                        warn!(id, error = %e, "Failed to fetch story; skipping");
                        None
                    }
                }
            })
            .collect()
            .await;

        if requested > 0 && stories.is_empty() {
            error!(requested, "No Hacker News story could be fetched");
            return Ok(false);
        }

        let path = json_path(self.ctx.today);
        self.ctx.output.write_json(&path, &stories).await?;
        info!(
            count = stories.len(),
            path = %self.ctx.output.path(&path).display(),
            "Hacker News stories saved"
        );
        Ok(true)
    }
}

pub fn load(ctx: &PluginContext) -> Result<Vec<Plugin>> {
    Ok(vec![Plugin::task(HackerNewsTask::new(ctx.clone()))])
}

/// Turn an API item into a stored story. Items without a `url` yield `None`.
pub fn story_from_item(id: u64, item: HnItem) -> Option<HnStory> {
    let url = item.url.filter(|u| !u.is_empty())?;
    let posted_at = DateTime::from_timestamp(item.time.unwrap_or(0), 0)
        .unwrap_or_default()
        .naive_utc()
        .format("%Y-%m-%dT%H:%M:%S")
        .to_string();
    Some(HnStory {
        title: item.title.unwrap_or_default(),
        url,
        points: item.score.unwrap_or(0),
        comments_count: item.descendants.unwrap_or(0),
        posted_at,
        source: "hackernews".to_string(),
        hn_id: id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubServer;

    #[test]
    fn test_story_from_item() {
        let item: HnItem = serde_json::from_str(
            r#"{"by":"pg","descendants":71,"id":8863,"score":104,"time":1175714200,
                "title":"My YC app: Dropbox","type":"story","url":"http://www.getdropbox.com/u/2/screencast.html"}"#,
        )
        .unwrap();
        let story = story_from_item(8863, item).unwrap();
        assert_eq!(story.title, "My YC app: Dropbox");
        assert_eq!(story.points, 104);
        assert_eq!(story.comments_count, 71);
        assert_eq!(story.posted_at, "2007-04-04T19:16:40");
        assert_eq!(story.source, "hackernews");
        assert_eq!(story.hn_id, 8863);
    }

    #[test]
    fn test_text_posts_are_dropped() {
        let item: HnItem =
            serde_json::from_str(r#"{"id":1,"title":"Ask HN: anything?","text":"..."}"#).unwrap();
        assert!(story_from_item(1, item).is_none());

        let item = HnItem {
            url: Some(String::new()),
            ..HnItem::default()
        };
        assert!(story_from_item(2, item).is_none());
    }

    #[test]
    fn test_missing_counters_default_to_zero() {
        let item = HnItem {
            url: Some("https://example.com".into()),
            ..HnItem::default()
        };
        let story = story_from_item(3, item).unwrap();
        assert_eq!(story.points, 0);
        assert_eq!(story.comments_count, 0);
        assert_eq!(story.posted_at, "1970-01-01T00:00:00");
    }

    #[test]
    fn test_deleted_item_decodes_as_none() {
        let item: Option<HnItem> = serde_json::from_str("null").unwrap();
        assert!(item.is_none());
    }

    fn task_against(api: &str, dir: &std::path::Path) -> (HackerNewsTask, PluginContext) {
        let mut ctx = PluginContext::for_tests(dir);
        let mut settings = (*ctx.settings).clone();
        settings.sources.hackernews_api = api.to_string();
        settings.sources.hackernews_limit = 3;
        ctx.settings = std::sync::Arc::new(settings);
        (HackerNewsTask::new(ctx.clone()), ctx)
    }

    #[tokio::test]
    async fn test_all_item_fetches_failing_is_a_failure() {
        let api = StubServer::start(|req| match req.path.as_str() {
            "/topstories.json" => (200, "[1,2,3,4]".to_string()),
            _ => (503, "{}".to_string()),
        })
        .await;
        let dir = tempfile::tempdir().unwrap();
        let (task, ctx) = task_against(&api.url, dir.path());

        assert!(!task.execute().await.unwrap());
        assert!(!ctx.output.exists(&json_path(ctx.today)).await);
        assert_eq!(api.requests().len(), 4);
    }

    #[tokio::test]
    async fn test_failed_items_are_skipped_in_rank_order() {
        let api = StubServer::start(|req| match req.path.as_str() {
            "/topstories.json" => (200, "[10,20,30]".to_string()),
            "/item/10.json" => (
                200,
                r#"{"id":10,"title":"First","url":"https://a.example/1","score":5,"time":0}"#
                    .to_string(),
            ),
            "/item/30.json" => (
                200,
                r#"{"id":30,"title":"Third","url":"https://c.example/3","score":1,"time":0}"#
                    .to_string(),
            ),
            _ => (500, "{}".to_string()),
        })
        .await;
        let dir = tempfile::tempdir().unwrap();
        let (task, ctx) = task_against(&api.url, dir.path());

        assert!(task.execute().await.unwrap());
        let stored: Vec<HnStory> = ctx.output.read_json(&json_path(ctx.today)).await.unwrap().unwrap();
        let ids: Vec<u64> = stored.iter().map(|s| s.hn_id).collect();
        assert_eq!(ids, vec![10, 30]);
    }

    #[tokio::test]
    async fn test_empty_top_list_writes_empty_listing() {
        let api = StubServer::start(|_| (200, "[]".to_string())).await;
        let dir = tempfile::tempdir().unwrap();
        let (task, ctx) = task_against(&api.url, dir.path());

        assert!(task.execute().await.unwrap());
        let stored: Vec<HnStory> = ctx.output.read_json(&json_path(ctx.today)).await.unwrap().unwrap();
        assert!(stored.is_empty());
    }

    #[test]
    fn test_json_path() {
        let d = NaiveDate::from_ymd_opt(2025, 5, 6).unwrap();
        assert_eq!(json_path(d), "hackernews/2025-05-06.json");
    }
}
