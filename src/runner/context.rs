//! Construction-time context handed to plugin loaders.

use crate::config::Settings;
use crate::outputs::OutputTree;
use crate::utils::ymd;
use chrono::NaiveDate;
use std::sync::Arc;

/// Everything a plugin may capture when it is built.
///
/// Plugins clone what they need; nothing here is mutated during a run.
#[derive(Debug, Clone)]
pub struct PluginContext {
    pub settings: Arc<Settings>,
    /// One connection pool shared by all collaborators.
    pub http: reqwest::Client,
    pub output: OutputTree,
    /// Date every artifact of this run is keyed by.
    pub today: NaiveDate,
}

impl PluginContext {
    pub fn new(settings: Arc<Settings>, http: reqwest::Client, today: NaiveDate) -> Self {
        let output = OutputTree::new(settings.output_dir.clone());
        Self {
            settings,
            http,
            output,
            today,
        }
    }

    /// `YYYY-MM-DD` for [`Self::today`].
    pub fn date(&self) -> String {
        ymd(self.today)
    }

    #[cfg(test)]
    pub fn for_tests(root: &std::path::Path) -> Self {
        let settings = crate::config::Settings {
            output_dir: root.to_path_buf(),
            ..Default::default()
        };
        Self::new(
            Arc::new(settings),
            reqwest::Client::new(),
            NaiveDate::from_ymd_opt(2025, 5, 6).expect("valid date"),
        )
    }
}
