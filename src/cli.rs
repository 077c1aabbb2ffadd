//! Command-line interface definitions.
//!
//! Every option can also come from the environment (or `.env`), which is how
//! the scheduled job is usually configured.

use clap::Parser;
use std::path::PathBuf;

/// Scrape the day's tech sources, analyse them and notify the team.
///
/// # Examples
///
/// ```sh
/// # Full run into ./output
/// trend_digest
///
/// # Only two tasks, custom output root and settings
/// trend_digest -o /srv/digest -c settings.yaml --only hackernews --only tech_insights
///
/// # Show what would run
/// trend_digest --list
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Root of the dated artifact tree (overrides the settings file)
    #[arg(short, long, env = "OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Optional path to a YAML settings file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Run only these task ids (repeatable); notifiers always run
    #[arg(long, value_name = "TASK_ID")]
    pub only: Vec<String>,

    /// Print discovered tasks and notifiers in execution order, then exit
    #[arg(long)]
    pub list: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "trend_digest",
            "--output-dir",
            "./out",
            "--config",
            "settings.yaml",
        ]);

        assert_eq!(cli.output_dir, Some(PathBuf::from("./out")));
        assert_eq!(cli.config, Some(PathBuf::from("settings.yaml")));
        assert!(cli.only.is_empty());
        assert!(!cli.list);
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from(["trend_digest", "-o", "/tmp/digest", "-c", "/etc/digest.yaml"]);

        assert_eq!(cli.output_dir, Some(PathBuf::from("/tmp/digest")));
        assert_eq!(cli.config, Some(PathBuf::from("/etc/digest.yaml")));
    }

    #[test]
    fn test_cli_only_is_repeatable() {
        let cli = Cli::parse_from([
            "trend_digest",
            "--only",
            "hackernews",
            "--only",
            "tech_insights",
            "--list",
        ]);

        assert_eq!(cli.only, vec!["hackernews", "tech_insights"]);
        assert!(cli.list);
    }
}
