//! Dated artifact tree shared by all tasks.
//!
//! Each task writes under its own subdirectory keyed by task and date, so
//! tasks never touch each other's files:
//!
//! ```text
//! output/
//! ├── ai-news/2025/2025-05-06.{html,json}
//! ├── github-trending/2025/2025-05-06.md
//! ├── github-trending/2025/2025-05-06-analysis.md
//! ├── hackernews/2025-05-06.json
//! ├── producthunt/2025-05-06.json
//! ├── techblogs/2025-05-06.json
//! └── tech-insights/2025-05-06.md
//! ```
//!
//! # Submodules
//!
//! - [`json`]: typed JSON artifacts
//! - [`markdown`]: Markdown and raw text artifacts

pub mod json;
pub mod markdown;

use crate::error::{PipelineError, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Handle on the output root. Cheap to clone.
#[derive(Debug, Clone)]
pub struct OutputTree {
    root: PathBuf,
}

impl OutputTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute (root-joined) location of a relative artifact path.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Resolve `relative` and make sure its parent directories exist.
    pub async fn prepare(&self, relative: &str) -> Result<PathBuf> {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| PipelineError::io(parent, e))?;
        }
        debug!(path = %path.display(), "Prepared artifact path");
        Ok(path)
    }

    #[cfg(test)]
    pub async fn exists(&self, relative: &str) -> bool {
        fs::try_exists(self.path(relative)).await.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_prepare_creates_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        let tree = OutputTree::new(dir.path());
        let path = tree.prepare("test/subdir/file.json").await.unwrap();
        assert!(path.ends_with("test/subdir/file.json"));
        assert!(dir.path().join("test/subdir").is_dir());
        assert!(!tree.exists("test/subdir/file.json").await);
    }
}
