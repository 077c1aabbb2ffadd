//! Runtime configuration.
//!
//! Settings are assembled once at startup and threaded into every plugin
//! through the [`PluginContext`](crate::runner::PluginContext). Sources, in
//! increasing precedence:
//!
//! 1. built-in defaults
//! 2. an optional YAML file (`--config settings.yaml`)
//! 3. process environment (after `.env` has been loaded)
//!
//! Secrets (API keys, webhook URLs) are only ever read from the environment.
//!
//! # Environment
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `LLM_API_KEY` / `VOLCENGINE_API_KEY` | bearer token for the chat-completions endpoint |
//! | `LLM_MODEL` / `VOLCENGINE_MODEL` | model or endpoint id |
//! | `LLM_ENDPOINT` | chat-completions URL |
//! | `WECOM_WEBHOOK_URL` | chat webhook for notifications |
//! | `NOTION_ENABLED` | turn document sync on (default off) |
//! | `NOTION_API_KEY` | integration token, ignored while sync is disabled |
//! | `NOTION_DEBUG` / `NOTION_DRY_RUN` | verbose sync logging / no network |
//! | `NOTION_DELETE_DUPLICATES` | archive same-date pages before creating (default on) |
//! | `NOTION_DB_<TASK_ID>` | target database for a task, e.g. `NOTION_DB_TECH_INSIGHTS` |

use crate::error::{PipelineError, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

const NOTION_DB_PREFIX: &str = "NOTION_DB_";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Root of the dated artifact tree.
    pub output_dir: PathBuf,
    pub llm: LlmSettings,
    pub wecom: WecomSettings,
    pub notion: NotionSettings,
    pub sources: SourceSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            llm: LlmSettings::default(),
            wecom: WecomSettings::default(),
            notion: NotionSettings::default(),
            sources: SourceSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub endpoint: String,
    pub model: String,
    #[serde(skip)]
    pub api_key: Option<String>,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    /// Retries after the first attempt, for transient failures only.
    pub max_retries: usize,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://ark.cn-beijing.volces.com/api/v3/chat/completions".to_string(),
            model: "ep-20250215154848-djsgr".to_string(),
            api_key: None,
            max_tokens: 2000,
            timeout_secs: 120,
            max_retries: 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WecomSettings {
    #[serde(skip)]
    pub webhook_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for WecomSettings {
    fn default() -> Self {
        Self {
            webhook_url: None,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotionSettings {
    pub enabled: bool,
    #[serde(skip)]
    pub api_key: Option<String>,
    pub debug: bool,
    pub dry_run: bool,
    pub delete_duplicates: bool,
    pub api_base: String,
    pub api_version: String,
    /// Name of the title property in target databases.
    pub title_property: String,
    /// Legacy JSON file consulted for database ids when no env var is set.
    pub legacy_config_path: PathBuf,
    /// `task_id -> database id` from `NOTION_DB_*` variables.
    #[serde(skip)]
    pub databases: BTreeMap<String, String>,
    /// `task_id -> database id` from the legacy file.
    #[serde(skip)]
    pub legacy_databases: BTreeMap<String, String>,
}

impl Default for NotionSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            debug: false,
            dry_run: false,
            delete_duplicates: true,
            api_base: "https://api.notion.com/v1".to_string(),
            api_version: "2022-06-28".to_string(),
            title_property: "Name".to_string(),
            legacy_config_path: PathBuf::from("config/notion_config.json"),
            databases: BTreeMap::new(),
            legacy_databases: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    pub ai_news_url: String,
    pub github_base_url: String,
    pub trending_languages: Vec<String>,
    pub hackernews_api: String,
    pub hackernews_limit: usize,
    pub producthunt_url: String,
    pub producthunt_limit: usize,
    pub devto_api: String,
    pub devto_top_days: u32,
    pub devto_per_page: u32,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            ai_news_url: "https://ai-bot.cn/daily-ai-news/".to_string(),
            github_base_url: "https://github.com".to_string(),
            trending_languages: ["python", "javascript", "go", "java"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            hackernews_api: "https://hacker-news.firebaseio.com/v0".to_string(),
            hackernews_limit: 30,
            producthunt_url: "https://www.producthunt.com".to_string(),
            producthunt_limit: 20,
            devto_api: "https://dev.to/api/articles".to_string(),
            devto_top_days: 7,
            devto_per_page: 15,
            request_timeout_secs: 10,
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36".to_string(),
        }
    }
}

/// Shape of the obsolete `config/notion_config.json`.
#[derive(Debug, Default, Deserialize)]
struct LegacyNotionConfig {
    #[serde(default)]
    databases: BTreeMap<String, String>,
}

impl Settings {
    /// Build settings from defaults, an optional YAML file and the process environment.
    #[instrument(level = "info", skip_all, fields(config = ?config_path))]
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let base = match config_path {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        let mut settings = base.with_env(std::env::vars());
        settings.notion.legacy_databases =
            load_legacy_notion_databases(&settings.notion.legacy_config_path);
        info!(
            output_dir = %settings.output_dir.display(),
            llm = settings.llm.api_key.is_some(),
            wecom = settings.wecom.webhook_url.is_some(),
            notion = settings.notion.enabled,
            "Settings loaded"
        );
        Ok(settings)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Overlay environment variables on top of `self`.
    pub fn with_env<I>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let env: HashMap<String, String> = vars.into_iter().collect();
        let get = |key: &str| env.get(key).filter(|v| !v.trim().is_empty()).cloned();
        let flag = |key: &str, default: bool| {
            env.get(key)
                .map(|v| v.trim().eq_ignore_ascii_case("true"))
                .unwrap_or(default)
        };

        self.llm.api_key = get("LLM_API_KEY").or_else(|| get("VOLCENGINE_API_KEY"));
        if let Some(model) = get("LLM_MODEL").or_else(|| get("VOLCENGINE_MODEL")) {
            self.llm.model = model;
        }
        if let Some(endpoint) = get("LLM_ENDPOINT") {
            self.llm.endpoint = endpoint;
        }

        self.wecom.webhook_url = get("WECOM_WEBHOOK_URL");

        let notion = &mut self.notion;
        notion.enabled = flag("NOTION_ENABLED", notion.enabled);
        notion.api_key = if notion.enabled {
            get("NOTION_API_KEY")
        } else {
            None
        };
        notion.debug = flag("NOTION_DEBUG", notion.debug);
        notion.dry_run = flag("NOTION_DRY_RUN", notion.dry_run);
        notion.delete_duplicates = flag("NOTION_DELETE_DUPLICATES", notion.delete_duplicates);
        notion.databases = env
            .iter()
            .filter_map(|(key, value)| {
                let task = key.strip_prefix(NOTION_DB_PREFIX)?;
                let value = value.trim();
                (!task.is_empty() && !value.is_empty())
                    .then(|| (task.to_ascii_lowercase(), value.to_string()))
            })
            .collect();

        self
    }
}

/// Read database ids from the legacy JSON file, if it is still around.
fn load_legacy_notion_databases(path: &Path) -> BTreeMap<String, String> {
    if !path.exists() {
        debug!(path = %path.display(), "No legacy Notion config");
        return BTreeMap::new();
    }
    warn!(
        path = %path.display(),
        "WARNING: config/notion_config.json is no longer used as primary configuration. \
         Please use environment variables instead (NOTION_DB_<TASK_ID>)"
    );
    match std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|raw| serde_json::from_str::<LegacyNotionConfig>(&raw).map_err(|e| e.to_string()))
    {
        Ok(legacy) => legacy.databases,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read legacy Notion config");
            BTreeMap::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.output_dir, PathBuf::from("output"));
        assert_eq!(s.sources.hackernews_limit, 30);
        assert_eq!(s.sources.trending_languages, vec!["python", "javascript", "go", "java"]);
        assert!(!s.notion.enabled);
        assert!(s.notion.delete_duplicates);
        assert!(s.llm.api_key.is_none());
    }

    #[test]
    fn test_llm_key_prefers_generic_variable() {
        let s = Settings::default().with_env(vars(&[
            ("VOLCENGINE_API_KEY", "volc"),
            ("LLM_API_KEY", "generic"),
        ]));
        assert_eq!(s.llm.api_key.as_deref(), Some("generic"));

        let s = Settings::default().with_env(vars(&[("VOLCENGINE_API_KEY", "volc")]));
        assert_eq!(s.llm.api_key.as_deref(), Some("volc"));
    }

    #[test]
    fn test_blank_values_count_as_unset() {
        let s = Settings::default().with_env(vars(&[("WECOM_WEBHOOK_URL", "  ")]));
        assert!(s.wecom.webhook_url.is_none());
    }

    #[test]
    fn test_notion_env_loading() {
        let s = Settings::default().with_env(vars(&[
            ("NOTION_ENABLED", "true"),
            ("NOTION_API_KEY", "test_key_123"),
            ("NOTION_DEBUG", "TRUE"),
            ("NOTION_DRY_RUN", "false"),
            ("NOTION_DELETE_DUPLICATES", "false"),
            ("NOTION_DB_TECH_INSIGHTS", "abc123def456"),
            ("NOTION_DB_TRENDING_AI", "xyz789"),
        ]));
        assert!(s.notion.enabled);
        assert_eq!(s.notion.api_key.as_deref(), Some("test_key_123"));
        assert!(s.notion.debug);
        assert!(!s.notion.dry_run);
        assert!(!s.notion.delete_duplicates);
        assert_eq!(s.notion.databases.get("tech_insights").map(String::as_str), Some("abc123def456"));
        assert_eq!(s.notion.databases.get("trending_ai").map(String::as_str), Some("xyz789"));
    }

    #[test]
    fn test_notion_api_key_ignored_when_disabled() {
        let s = Settings::default().with_env(vars(&[("NOTION_API_KEY", "should_not_load")]));
        assert!(!s.notion.enabled);
        assert!(s.notion.api_key.is_none());
    }

    #[test]
    fn test_yaml_overrides_defaults() {
        let yaml = r#"
output_dir: /srv/digest
llm:
  model: glm-4
  max_tokens: 1024
sources:
  trending_languages: [rust, go]
  hackernews_limit: 10
"#;
        let s = Settings::from_yaml_str(yaml).unwrap();
        assert_eq!(s.output_dir, PathBuf::from("/srv/digest"));
        assert_eq!(s.llm.model, "glm-4");
        assert_eq!(s.llm.max_tokens, 1024);
        assert_eq!(s.llm.timeout_secs, 120);
        assert_eq!(s.sources.trending_languages, vec!["rust", "go"]);
        assert_eq!(s.sources.hackernews_limit, 10);
        assert_eq!(s.sources.producthunt_limit, 20);
    }

    #[test]
    fn test_env_model_overrides_yaml() {
        let s = Settings::from_yaml_str("llm:\n  model: from-yaml\n")
            .unwrap()
            .with_env(vars(&[("LLM_MODEL", "from-env")]));
        assert_eq!(s.llm.model, "from-env");
    }

    #[test]
    fn test_legacy_notion_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notion_config.json");
        let mut f = std::fs::File::create(&path).unwrap();
        write!(
            f,
            r#"{{"databases": {{"ai_news": "legacy-db"}}, "settings": {{"enabled": true}}}}"#
        )
        .unwrap();

        let dbs = load_legacy_notion_databases(&path);
        assert_eq!(dbs.get("ai_news").map(String::as_str), Some("legacy-db"));
        assert!(load_legacy_notion_databases(&dir.path().join("missing.json")).is_empty());
    }

    #[test]
    fn test_malformed_legacy_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notion_config.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(load_legacy_notion_databases(&path).is_empty());
    }
}
