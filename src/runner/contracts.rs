//! The two capabilities the runner depends on.
//!
//! Identity, priority and subscriptions are fixed per implementation type.
//! Implementations declare them as associated constants and return them from
//! the trait methods.

use super::results::TaskResults;
use crate::error::Result;
use async_trait::async_trait;

/// Priority assumed when an implementation does not pick one.
pub const DEFAULT_PRIORITY: i32 = 100;

/// One unit of data-gathering or analysis work.
#[async_trait]
pub trait Task: Send + Sync {
    /// Stable, unique identifier. Tasks with an empty id are not registered.
    fn id(&self) -> &'static str;

    /// Lower runs earlier.
    fn priority(&self) -> i32 {
        DEFAULT_PRIORITY
    }

    /// Perform the work.
    ///
    /// Expected failures (network, missing input, bad markup) should come back
    /// as `Ok(false)`. An `Err` or a panic is also recorded as a failure, but
    /// is logged as an exception by the runner.
    async fn execute(&self) -> Result<bool>;
}

/// Reacts to the outcome of a whole run.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn id(&self) -> &'static str;

    /// Task ids this notifier reports on.
    ///
    /// Informational only: the runner hands every notifier the full result
    /// map and the notifier filters for itself.
    fn subscriptions(&self) -> &'static [&'static str] {
        &[]
    }

    /// Deliver the notification. The returned flag describes the delivery
    /// itself, not the tasks being reported on.
    async fn send(&self, results: &TaskResults) -> Result<bool>;
}

/// Anything a plugin module can contribute.
pub enum Plugin {
    Task(Box<dyn Task>),
    Notifier(Box<dyn Notifier>),
}

impl Plugin {
    pub fn task(task: impl Task + 'static) -> Self {
        Self::Task(Box::new(task))
    }

    pub fn notifier(notifier: impl Notifier + 'static) -> Self {
        Self::Notifier(Box::new(notifier))
    }

    pub fn id(&self) -> &'static str {
        match self {
            Self::Task(t) => t.id(),
            Self::Notifier(n) => n.id(),
        }
    }
}
