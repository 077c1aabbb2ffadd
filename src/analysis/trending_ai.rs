//! LLM commentary on today's GitHub trending listing.

use super::sync_report;
use crate::error::Result;
use crate::llm::{ChatClient, ChatPrompt, ask_with_backoff};
use crate::runner::{Plugin, PluginContext, Task};
use crate::scrapers::github_trending::{analysis_path, markdown_path};
use async_trait::async_trait;
use tracing::{error, info, instrument, warn};

const SYSTEM_PROMPT: &str = "你是一位资深技术专家，长期关注开源生态与工程实践。\
请用简洁、准确、有洞察力的语言解读 GitHub 项目，说明其核心价值、技术特点与潜在影响。";

pub struct TrendingAiTask {
    ctx: PluginContext,
}

impl TrendingAiTask {
    pub const ID: &'static str = "trending_ai";
    pub const PRIORITY: i32 = 30;

    pub fn new(ctx: PluginContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Task for TrendingAiTask {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn priority(&self) -> i32 {
        Self::PRIORITY
    }

    #[instrument(level = "info", skip_all, fields(task = Self::ID))]
    async fn execute(&self) -> Result<bool> {
        let source = markdown_path(self.ctx.today);
        let Some(trending) = self.ctx.output.read_text(&source).await? else {
            warn!(path = %self.ctx.output.path(&source).display(), "No trending data for today");
            return Ok(false);
        };

        let Some(client) = ChatClient::from_settings(&self.ctx.settings.llm, self.ctx.http.clone())
        else {
            warn!("LLM_API_KEY / VOLCENGINE_API_KEY not set; skipping AI analysis");
            return Ok(false);
        };

        info!(model = client.model(), bytes = trending.len(), "Requesting trending analysis");
        let prompt = ChatPrompt::new(SYSTEM_PROMPT, build_prompt(&trending));
        let analysis = match ask_with_backoff(&client, &prompt).await {
            Ok(answer) => answer,
            Err(e) => {
                error!(error = %e, "AI analysis failed");
                return Ok(false);
            }
        };

        let path = analysis_path(self.ctx.today);
        let report = render_report(&self.ctx.date(), &analysis);
        self.ctx.output.write_text(&path, &report).await?;
        info!(path = %self.ctx.output.path(&path).display(), "Trending analysis saved");

        sync_report(&self.ctx, Self::ID, &analysis).await;
        Ok(true)
    }
}

pub fn load(ctx: &PluginContext) -> Result<Vec<Plugin>> {
    Ok(vec![Plugin::task(TrendingAiTask::new(ctx.clone()))])
}

pub fn build_prompt(trending: &str) -> String {
    format!(
        "请分析以下 GitHub Trending 数据：\n\n\
         1. **趋势概览**：今天整体有哪些突出的技术方向？\n\
         2. **热门项目**：挑选 3-5 个最值得关注的项目，介绍特点、价值与应用场景\n\
         3. **技术趋势**：从这些项目中归纳当前的技术趋势\n\
         4. **推荐关注**：列出值得开发者学习的项目\n\n\
         请用中文、Markdown 格式回答，专业但易懂。\n\n\
         ---\nGitHub Trending 数据:\n{trending}\n"
    )
}

/// Title and analysis-date header followed by the model's answer.
pub fn render_report(date: &str, analysis: &str) -> String {
    format!("# GitHub Trending AI 分析报告\n\n> 分析日期: {date}\n\n---\n\n{analysis}")
}
