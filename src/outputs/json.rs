//! JSON artifacts.
//!
//! Scraper tasks persist their listings as pretty-printed JSON; downstream
//! tasks and the notifier read them back as typed values.

use super::OutputTree;
use crate::error::{PipelineError, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::fs;
use tracing::{info, instrument};

impl OutputTree {
    /// Serialize `value` to `relative`, creating directories as needed.
    #[instrument(level = "info", skip_all, fields(%relative))]
    pub async fn write_json<T: Serialize + ?Sized>(&self, relative: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        let path = self.prepare(relative).await?;
        fs::write(&path, json)
            .await
            .map_err(|e| PipelineError::io(&path, e))?;
        info!(path = %path.display(), "Wrote JSON artifact");
        Ok(())
    }

    /// Read `relative` back; `Ok(None)` when the file does not exist.
    pub async fn read_json<T: DeserializeOwned>(&self, relative: &str) -> Result<Option<T>> {
        let path = self.path(relative);
        match fs::read_to_string(&path).await {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PipelineError::io(&path, e)),
        }
    }
}
