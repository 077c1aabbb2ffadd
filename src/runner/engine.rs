//! Discovery, prioritized execution, notifier fan-out and summary.

use super::context::PluginContext;
use super::contracts::{Notifier, Plugin, Task};
use super::registry::{Catalog, Registry};
use super::results::TaskResults;
use crate::error::{PipelineError, Result};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;
use tracing::{error, info, instrument, warn};

/// Loads plugins from a [`Catalog`] and drives one run.
pub struct TaskRunner {
    catalog: Catalog,
    ctx: PluginContext,
    only: Vec<String>,
    tasks: Registry<dyn Task>,
    notifiers: Registry<dyn Notifier>,
}

/// Totals for a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl Summary {
    pub fn from_results(results: &TaskResults) -> Self {
        let total = results.len();
        let succeeded = results.succeeded();
        Self {
            total,
            succeeded,
            failed: total - succeeded,
        }
    }

    /// `0` when every task succeeded, `1` otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.failed > 0 { 1 } else { 0 }
    }
}

impl TaskRunner {
    pub fn new(catalog: Catalog, ctx: PluginContext) -> Self {
        Self {
            catalog,
            ctx,
            only: Vec::new(),
            tasks: Registry::new(),
            notifiers: Registry::new(),
        }
    }

    /// Restrict the run to the given task ids. Notifiers are unaffected.
    pub fn only(mut self, ids: Vec<String>) -> Self {
        self.only = ids;
        self
    }

    pub fn tasks(&self) -> &Registry<dyn Task> {
        &self.tasks
    }

    pub fn notifiers(&self) -> &Registry<dyn Notifier> {
        &self.notifiers
    }

    /// Load every catalogue module and register what it provides.
    ///
    /// A module that errors or panics while loading is skipped with a warning.
    /// The only error returned is a configuration error: `--only` naming a
    /// task no module provides.
    #[instrument(level = "info", skip_all, fields(modules = self.catalog.len()))]
    pub fn discover(&mut self) -> Result<()> {
        if self.catalog.is_empty() {
            warn!("Plugin catalogue is empty");
        }
        for module in self.catalog.modules() {
            let loaded = std::panic::catch_unwind(AssertUnwindSafe(|| module.load(&self.ctx)));
            let plugins = match loaded {
                Ok(Ok(plugins)) => plugins,
                Ok(Err(e)) => {
                    warn!(module = module.name(), error = %e, "Failed to load plugin module; skipping");
                    continue;
                }
                Err(panic) => {
                    warn!(
                        module = module.name(),
                        error = %panic_message(panic.as_ref()),
                        "Plugin module panicked while loading; skipping"
                    );
                    continue;
                }
            };

            for plugin in plugins {
                let id = plugin.id();
                if id.is_empty() {
                    warn!(module = module.name(), "Plugin has an empty id; ignoring");
                    continue;
                }
                match plugin {
                    Plugin::Task(task) => {
                        let priority = task.priority();
                        if self.tasks.insert(id, task).is_some() {
                            warn!(task = id, module = module.name(), "Duplicate task id; later registration replaces earlier one");
                        }
                        info!(task = id, priority, module = module.name(), "Discovered task");
                    }
                    Plugin::Notifier(notifier) => {
                        let subscriptions = notifier.subscriptions().join(",");
                        if self.notifiers.insert(id, notifier).is_some() {
                            warn!(notifier = id, module = module.name(), "Duplicate notifier id; later registration replaces earlier one");
                        }
                        info!(notifier = id, %subscriptions, module = module.name(), "Discovered notifier");
                    }
                }
            }
        }

        if !self.only.is_empty() {
            let unknown: Vec<&str> = self
                .only
                .iter()
                .map(String::as_str)
                .filter(|id| !self.tasks.contains(id))
                .collect();
            if !unknown.is_empty() {
                return Err(PipelineError::Config(format!(
                    "unknown task id(s): {}",
                    unknown.join(", ")
                )));
            }
            let only = &self.only;
            self.tasks.retain(|id| only.iter().any(|o| o == id));
        }

        info!(
            tasks = self.tasks.len(),
            notifiers = self.notifiers.len(),
            "Discovery complete"
        );
        Ok(())
    }

    /// Tasks sorted by ascending priority; ties keep discovery order.
    pub fn execution_order(&self) -> Vec<(&str, &dyn Task)> {
        let mut ordered: Vec<(&str, &dyn Task)> = self.tasks.iter().collect();
        ordered.sort_by_key(|(_, task)| task.priority());
        ordered
    }

    /// Run every task once, in priority order, and collect their outcomes.
    pub async fn run_tasks(&self) -> TaskResults {
        let mut results = TaskResults::new();
        if self.tasks.is_empty() {
            warn!("No tasks discovered; nothing to run");
            return results;
        }

        let ordered = self.execution_order();
        for (position, (id, task)) in ordered.iter().enumerate() {
            let order = position + 1;
            info!(order, task = *id, priority = task.priority(), "Planned");
        }

        for (id, task) in ordered {
            info!(task = id, "Task started");
            let t0 = Instant::now();
            let outcome = AssertUnwindSafe(task.execute()).catch_unwind().await;
            let elapsed_ms = t0.elapsed().as_millis() as u64;
            let success = match outcome {
                Ok(Ok(true)) => {
                    info!(task = id, elapsed_ms, "Task succeeded");
                    true
                }
                Ok(Ok(false)) => {
                    warn!(task = id, elapsed_ms, "Task failed");
                    false
                }
                Ok(Err(e)) => {
                    error!(task = id, elapsed_ms, error = %e, "Task raised an error");
                    false
                }
                Err(panic) => {
                    error!(task = id, elapsed_ms, error = %panic_message(panic.as_ref()), "Task panicked");
                    false
                }
            };
            results.insert(id, success);
        }

        results
    }

    /// Hand the full result map to every notifier, in discovery order.
    ///
    /// Returns each notifier's delivery outcome; an error or panic counts as
    /// `false` and never stops the remaining notifiers.
    pub async fn run_notifiers(&self, results: &TaskResults) -> TaskResults {
        let mut delivered = TaskResults::new();
        if self.notifiers.is_empty() {
            info!("No notifiers discovered; skipping notifications");
            return delivered;
        }

        for (id, notifier) in self.notifiers.iter() {
            info!(notifier = id, "Sending notifications");
            let outcome = AssertUnwindSafe(notifier.send(results)).catch_unwind().await;
            let success = match outcome {
                Ok(Ok(true)) => {
                    info!(notifier = id, "Notification sent");
                    true
                }
                Ok(Ok(false)) => {
                    warn!(notifier = id, "Notification failed");
                    false
                }
                Ok(Err(e)) => {
                    error!(notifier = id, error = %e, "Notifier raised an error");
                    false
                }
                Err(panic) => {
                    error!(notifier = id, error = %panic_message(panic.as_ref()), "Notifier panicked");
                    false
                }
            };
            delivered.insert(id, success);
        }

        delivered
    }

    /// Log per-task outcomes and the totals.
    pub fn print_summary(results: &TaskResults) -> Summary {
        let summary = Summary::from_results(results);
        for (id, ok) in results.iter() {
            let status = if ok { "ok" } else { "failed" };
            info!(task = id, status, "Result");
        }
        info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Run summary"
        );
        summary
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
