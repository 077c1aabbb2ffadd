//! GitHub trending repositories, one section per language.
//!
//! Output is a Markdown file:
//!
//! ```text
//! ## 2025-05-06
//!
//! #### python
//! * [owner / repo](https://github.com/owner/repo):description
//! ```

use super::fetch_page;
use crate::error::{PipelineError, Result};
use crate::runner::{Plugin, PluginContext, Task};
use crate::utils::{collapse_whitespace, year, ymd};
use async_trait::async_trait;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::fmt::Write as _;
use tracing::{info, instrument, warn};
use url::Url;

static ROW: Lazy<Selector> =
    Lazy::new(|| Selector::parse("article.Box-row").expect("static selector"));
static TITLE_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".lh-condensed a, h2 a").expect("static selector"));
static DESCRIPTION: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p.col-9").expect("static selector"));

/// Raw trending listing for `date`.
pub fn markdown_path(date: NaiveDate) -> String {
    format!("github-trending/{}/{}.md", year(date), ymd(date))
}

/// LLM analysis of the listing for `date`.
pub fn analysis_path(date: NaiveDate) -> String {
    format!("github-trending/{}/{}-analysis.md", year(date), ymd(date))
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendingRepo {
    pub title: String,
    pub url: String,
    pub description: String,
}

pub struct GithubTrendingTask {
    ctx: PluginContext,
}

impl GithubTrendingTask {
    pub const ID: &'static str = "github_trending";
    pub const PRIORITY: i32 = 20;

    pub fn new(ctx: PluginContext) -> Self {
        Self { ctx }
    }

    #[instrument(level = "info", skip(self))]
    async fn scrape_language(&self, language: &str) -> Result<Vec<TrendingRepo>> {
        let sources = &self.ctx.settings.sources;
        let url = format!(
            "{}/trending/{}",
            sources.github_base_url.trim_end_matches('/'),
            urlencoding::encode(language)
        );
        let html = fetch_page(&self.ctx.http, sources, &url).await?;
        let repos = parse_trending(&html, &sources.github_base_url);
        if repos.is_empty() {
            return Err(PipelineError::Markup(format!("no repository rows at {url}")));
        }
        info!(count = repos.len(), "Parsed trending repositories");
        Ok(repos)
    }
}

#[async_trait]
impl Task for GithubTrendingTask {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn priority(&self) -> i32 {
        Self::PRIORITY
    }

    #[instrument(level = "info", skip_all, fields(task = Self::ID))]
    async fn execute(&self) -> Result<bool> {
        let languages = &self.ctx.settings.sources.trending_languages;
        let mut sections = Vec::with_capacity(languages.len());

        for language in languages {
            match self.scrape_language(language).await {
                Ok(repos) => sections.push((language.as_str(), repos)),
                Err(e) => warn!(%language, error = %e, "Trending page failed; skipping language"),
            }
        }

        if sections.is_empty() {
            warn!("No trending language could be fetched");
            return Ok(false);
        }

        let path = markdown_path(self.ctx.today);
        let markdown = render_markdown(&self.ctx.date(), &sections);
        self.ctx.output.write_text(&path, &markdown).await?;
        info!(
            languages = sections.len(),
            path = %self.ctx.output.path(&path).display(),
            "GitHub trending saved"
        );
        Ok(true)
    }
}

pub fn load(ctx: &PluginContext) -> Result<Vec<Plugin>> {
    Ok(vec![Plugin::task(GithubTrendingTask::new(ctx.clone()))])
}

pub fn parse_trending(html: &str, base_url: &str) -> Vec<TrendingRepo> {
    let document = Html::parse_document(html);
    let base = Url::parse(base_url).ok();

    document
        .select(&ROW)
        .filter_map(|row| {
            let link = row.select(&TITLE_LINK).next()?;
            let href = link.value().attr("href")?;
            let url = base
                .as_ref()
                .and_then(|b| b.join(href).ok())
                .map(|u| u.to_string())
                .unwrap_or_else(|| href.to_string());
            Some(TrendingRepo {
                title: text_of(link),
                url,
                description: row.select(&DESCRIPTION).next().map(text_of).unwrap_or_default(),
            })
        })
        .collect()
}

pub fn render_markdown(date: &str, sections: &[(&str, Vec<TrendingRepo>)]) -> String {
    let mut out = format!("## {date}\n");
    for (language, repos) in sections {
        let _ = write!(out, "\n#### {language}\n");
        for repo in repos {
            let _ = writeln!(out, "* [{}]({}):{}", repo.title, repo.url, repo.description);
        }
    }
    out
}

fn text_of(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <div class="Box">
          <article class="Box-row">
            <h2 class="h3 lh-condensed">
              <a href="/astral-sh/uv">
                <span class="text-normal">astral-sh /</span>
                uv
              </a>
            </h2>
            <p class="col-9 color-fg-muted my-1 pr-4">
              An extremely fast Python package manager.
            </p>
          </article>
          <article class="Box-row">
            <h2 class="h3"><a href="/owner/no-description">owner / no-description</a></h2>
          </article>
          <article class="Box-row"><p class="col-9">orphan</p></article>
        </div>
    "#;

    #[test]
    fn test_parse_trending() {
        let repos = parse_trending(PAGE, "https://github.com");
        assert_eq!(repos.len(), 2);
        assert_eq!(repos[0].title, "astral-sh / uv");
        assert_eq!(repos[0].url, "https://github.com/astral-sh/uv");
        assert_eq!(repos[0].description, "An extremely fast Python package manager.");
        assert_eq!(repos[1].description, "");
    }

    #[test]
    fn test_render_markdown() {
        let repos = parse_trending(PAGE, "https://github.com");
        let md = render_markdown(
            "2025-05-06",
            &[("python", repos), ("go", Vec::new())],
        );
        assert!(md.starts_with("## 2025-05-06\n\n#### python\n"));
        assert!(md.contains(
            "* [astral-sh / uv](https://github.com/astral-sh/uv):An extremely fast Python package manager.\n"
        ));
        assert!(md.ends_with("\n#### go\n"));
    }

    #[test]
    fn test_paths() {
        let d = NaiveDate::from_ymd_opt(2025, 5, 6).unwrap();
        assert_eq!(markdown_path(d), "github-trending/2025/2025-05-06.md");
        assert_eq!(analysis_path(d), "github-trending/2025/2025-05-06-analysis.md");
    }

    #[tokio::test]
    async fn test_all_languages_failing_is_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = PluginContext::for_tests(dir.path());
        let mut settings = (*ctx.settings).clone();
        settings.sources.github_base_url = "http://127.0.0.1:9".to_string();
        settings.sources.trending_languages = vec!["rust".to_string()];
        settings.sources.request_timeout_secs = 2;
        ctx.settings = std::sync::Arc::new(settings);

        let task = GithubTrendingTask::new(ctx.clone());
        assert!(!task.execute().await.unwrap());
        assert!(!ctx.output.exists(&markdown_path(ctx.today)).await);
    }
}
