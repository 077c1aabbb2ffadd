//! The compiled-in plugin catalogue.
//!
//! Discovery order is the order below. Execution order is decided by each
//! task's priority, so a new source only needs a line here.

use crate::analysis::{tech_insights, trending_ai};
use crate::notifiers::wecom;
use crate::runner::Catalog;
use crate::scrapers::{ai_news, github_trending, hackernews, producthunt, techblogs};

pub fn catalog() -> Catalog {
    Catalog::new()
        .module("ai_news", ai_news::load)
        .module("github_trending", github_trending::load)
        .module("hackernews", hackernews::load)
        .module("producthunt", producthunt::load)
        .module("techblogs", techblogs::load)
        .module("tech_insights", tech_insights::load)
        .module("trending_ai", trending_ai::load)
        .module("wecom_robot", wecom::load)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{PluginContext, TaskRunner};

    #[test]
    fn test_catalog_discovers_every_plugin() {
        let dir = tempfile::tempdir().unwrap();
        let mut runner = TaskRunner::new(catalog(), PluginContext::for_tests(dir.path()));
        runner.discover().unwrap();

        assert_eq!(runner.tasks().len(), 7);
        assert_eq!(runner.notifiers().ids().collect::<Vec<_>>(), vec!["wecom"]);

        let order: Vec<_> = runner
            .execution_order()
            .into_iter()
            .map(|(id, task)| (id.to_string(), task.priority()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("ai_news".to_string(), 10),
                ("hackernews".to_string(), 15),
                ("producthunt".to_string(), 16),
                ("techblogs".to_string(), 17),
                ("github_trending".to_string(), 20),
                ("trending_ai".to_string(), 30),
                ("tech_insights".to_string(), 40),
            ]
        );
    }

    #[test]
    fn test_only_filter_keeps_named_tasks() {
        let dir = tempfile::tempdir().unwrap();
        let mut runner = TaskRunner::new(catalog(), PluginContext::for_tests(dir.path()))
            .only(vec!["hackernews".to_string(), "tech_insights".to_string()]);
        runner.discover().unwrap();
        assert_eq!(
            runner.tasks().ids().collect::<Vec<_>>(),
            vec!["hackernews", "tech_insights"]
        );
        assert_eq!(runner.notifiers().len(), 1);
    }
}
