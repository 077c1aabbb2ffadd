//! Plugin runner: the pipeline's core.
//!
//! Tasks and notifiers are plugged in through an explicit [`Catalog`] built at
//! startup instead of being discovered on disk. A run is four steps:
//!
//! 1. **Discovery**: every [`registry::PluginModule`] in the catalogue is loaded; a
//!    module that fails to load is logged and skipped.
//! 2. **Execution**: tasks run one after another in ascending priority
//!    (stable for ties). Errors and panics become `false` results.
//! 3. **Fan-out**: every notifier receives the complete [`TaskResults`].
//! 4. **Summary**: totals derived from the results decide the exit code.
//!
//! # Submodules
//!
//! - [`contracts`]: the [`Task`] and [`Notifier`] traits
//! - [`context`]: what plugins may capture at construction
//! - [`registry`]: catalogue and id-keyed registries
//! - [`results`]: the ordered result map
//! - [`engine`]: the [`TaskRunner`] itself

pub mod context;
pub mod contracts;
pub mod engine;
pub mod registry;
pub mod results;

pub use context::PluginContext;
pub use contracts::{Notifier, Plugin, Task};
pub use engine::TaskRunner;
pub use registry::Catalog;
pub use results::TaskResults;
