use std::time::Duration;

use thiserror::Error;

/// Application-wide error types for tickerfeed.
#[derive(Error, Debug)]
pub enum AppError {
    /// The page failed to load.
    #[error("Navigation error: {0}")]
    NavigationError(String),

    /// The feed container did not appear within the wait budget.
    #[error("Timed out after {0} seconds waiting for the feed container")]
    Timeout(u64),

    /// The rendered page lacks the nested container we capture.
    #[error("Extraction failure: {0}")]
    ExtractionFailure(String),

    /// The browser session could not be launched or driven.
    #[error("Browser error: {0}")]
    BrowserError(String),

    /// Invalid run configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The run was cancelled before this URL reached a result.
    #[error("Run cancelled")]
    Cancelled,

    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Timeout for a wait budget, in whole seconds rounded up so a
    /// sub-second budget never reads as zero.
    pub fn timeout_after(budget: Duration) -> Self {
        let secs = budget.as_secs() + u64::from(budget.subsec_nanos() > 0);
        AppError::Timeout(secs)
    }

    /// Short, stable label for log lines and failure summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NavigationError(_) => "navigation",
            AppError::Timeout(_) => "timeout",
            AppError::ExtractionFailure(_) => "extraction",
            AppError::BrowserError(_) => "browser",
            AppError::ConfigError(_) => "config",
            AppError::Cancelled => "cancelled",
            AppError::Io(_) => "io",
            AppError::Generic(_) => "generic",
        }
    }
}
