//! Markdown and raw-text artifacts.

use super::OutputTree;
use crate::error::{PipelineError, Result};
use tokio::fs;
use tracing::{info, instrument};

impl OutputTree {
    /// Write (truncate) a text artifact.
    #[instrument(level = "info", skip_all, fields(%relative, bytes = content.len()))]
    pub async fn write_text(&self, relative: &str, content: &str) -> Result<()> {
        let path = self.prepare(relative).await?;
        fs::write(&path, content)
            .await
            .map_err(|e| PipelineError::io(&path, e))?;
        info!(path = %path.display(), "Wrote text artifact");
        Ok(())
    }

    /// Read a text artifact; `Ok(None)` when the file does not exist.
    pub async fn read_text(&self, relative: &str) -> Result<Option<String>> {
        let path = self.path(relative);
        match fs::read_to_string(&path).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PipelineError::io(&path, e)),
        }
    }
}
