//! Error type shared by the runner and every collaborator.
//!
//! Collaborators propagate [`PipelineError`] with `?` up to their task's
//! `execute`, where the runner turns any error into a `false` result. Only
//! errors raised before the first task runs terminate the process.

use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Invalid or missing configuration detected at startup.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote answered with a non-2xx status.
    #[error("{url} answered HTTP {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Page markup did not contain what the scraper expects.
    #[error("unexpected page structure: {0}")]
    Markup(String),

    /// Malformed or empty answer from the chat-completions endpoint.
    #[error("LLM error: {0}")]
    Llm(String),

    /// The chat webhook accepted the request but rejected the message.
    #[error("webhook rejected message (errcode {errcode}): {errmsg}")]
    Webhook { errcode: i64, errmsg: String },

    #[error("Notion error: {0}")]
    Notion(String),
}

impl PipelineError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether retrying the same request may succeed.
    ///
    /// Rate limits, server errors and transport failures are transient;
    /// authentication and request errors are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Status { status, .. } => matches!(*status, 408 | 429) || *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> PipelineError {
        PipelineError::Status {
            url: "https://example.com".to_string(),
            status: code,
            body: String::new(),
        }
    }

    #[test]
    fn test_rate_limit_and_server_errors_are_retryable() {
        assert!(status(408).is_retryable());
        assert!(status(429).is_retryable());
        assert!(status(500).is_retryable());
        assert!(status(503).is_retryable());
    }

    #[test]
    fn test_client_errors_are_not_retryable() {
        assert!(!status(400).is_retryable());
        assert!(!status(401).is_retryable());
        assert!(!PipelineError::Llm("empty choices".into()).is_retryable());
        assert!(!PipelineError::Config("missing".into()).is_retryable());
    }

    #[test]
    fn test_io_error_mentions_path() {
        let err = PipelineError::io(
            "/tmp/out/x.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/tmp/out/x.json"));
        assert!(msg.contains("denied"));
    }
}
