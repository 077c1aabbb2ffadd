//! # Trend Digest
//!
//! A daily tech-trend pipeline. It scrapes a handful of sources, optionally
//! asks an LLM to analyse them, writes dated Markdown/JSON artifacts and
//! pushes the results to a WeCom group (and optionally Notion).
//!
//! ## Usage
//!
//! ```sh
//! trend_digest -o ./output
//! ```
//!
//! ## Architecture
//!
//! The binary is a thin shell around the [`runner`]:
//! 1. **Discovery**: the compiled-in [`catalog`] builds every task and notifier
//! 2. **Execution**: tasks run sequentially by priority; failures are isolated
//! 3. **Fan-out**: every notifier receives the full result map
//! 4. **Summary**: the process exits 0 only when every task succeeded

use chrono::Local;
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod analysis;
mod catalog;
mod cli;
mod config;
mod error;
mod llm;
mod models;
mod notifiers;
mod notion;
mod outputs;
mod runner;
mod scrapers;
#[cfg(test)]
mod testing;
mod utils;

use cli::Cli;
use config::Settings;
use runner::{PluginContext, TaskRunner};
use utils::ensure_writable_dir;

#[tokio::main]
async fn main() -> ExitCode {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("trend_digest starting up");

    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "Loaded .env"),
        Err(e) if e.not_found() => debug!("No .env file"),
        Err(e) => warn!(error = %e, "Failed to read .env; continuing with process environment"),
    }

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    // ---- Configuration (fatal on error) ----
    let mut settings = match Settings::load(args.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "Failed to load settings");
            return ExitCode::FAILURE;
        }
    };
    if let Some(dir) = args.output_dir {
        settings.output_dir = dir;
    }

    if let Err(e) = ensure_writable_dir(&settings.output_dir).await {
        error!(
            path = %settings.output_dir.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return ExitCode::FAILURE;
    }

    let http = match reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "Failed to build HTTP client");
            return ExitCode::FAILURE;
        }
    };

    let today = Local::now().date_naive();
    let ctx = PluginContext::new(Arc::new(settings), http, today);
    info!(date = %ctx.date(), output = %ctx.output.root().display(), "Run context ready");

    // ---- Discovery ----
    let mut runner = TaskRunner::new(catalog::catalog(), ctx).only(args.only);
    if let Err(e) = runner.discover() {
        error!(error = %e, "Discovery failed");
        return ExitCode::FAILURE;
    }

    if args.list {
        for (position, (id, task)) in runner.execution_order().into_iter().enumerate() {
            println!("{:>2}. {id} (priority {})", position + 1, task.priority());
        }
        for (id, notifier) in runner.notifiers().iter() {
            println!("notifier {id} -> {}", notifier.subscriptions().join(", "));
        }
        return ExitCode::SUCCESS;
    }

    // ---- Run ----
    let results = runner.run_tasks().await;
    let deliveries = runner.run_notifiers(&results).await;
    debug!(delivered = deliveries.succeeded(), failed = deliveries.failed(), "Notifier outcomes");

    let summary = TaskRunner::print_summary(&results);

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        exit_code = summary.exit_code(),
        "Execution complete"
    );

    ExitCode::from(summary.exit_code())
}
