//! Crawl events and the reporters that record them.
//!
//! The orchestrator and renderers never log through a global; they emit
//! [`CrawlEvent`]s to a [`CrawlReporter`] handed to them by the caller.

use std::fmt;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use chrono::Local;

use crate::error::AppError;

/// Everything worth a log line during a run.
#[derive(Debug, Clone)]
pub enum CrawlEvent<'a> {
    RunStarted {
        urls: usize,
        concurrency_limit: usize,
    },
    AttemptStarted {
        url: &'a str,
        attempt: u32,
        max_attempts: u32,
    },
    AttemptFailed {
        url: &'a str,
        attempt: u32,
        max_attempts: u32,
        error: &'a AppError,
    },
    RetryScheduled {
        url: &'a str,
        delay: Duration,
    },
    SessionStarted {
        url: &'a str,
    },
    PageLoaded {
        url: &'a str,
    },
    Scrolling {
        url: &'a str,
        step: u32,
        total: u32,
    },
    MarkupCaptured {
        url: &'a str,
        bytes: usize,
    },
    RenderFailed {
        url: &'a str,
        error: &'a AppError,
    },
    UrlSucceeded {
        url: &'a str,
        attempts: u32,
        records: usize,
    },
    UrlFailed {
        url: &'a str,
        attempts: u32,
        reason: &'a str,
    },
    RunCompleted {
        succeeded: usize,
        failed: usize,
        records: usize,
    },
}

impl fmt::Display for CrawlEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrawlEvent::RunStarted {
                urls,
                concurrency_limit,
            } => write!(
                f,
                "Starting data fetching for {urls} URLs (concurrency {concurrency_limit})"
            ),
            CrawlEvent::AttemptStarted {
                url,
                attempt,
                max_attempts,
            } => write!(f, "Attempt {attempt}/{max_attempts} started for {url}"),
            CrawlEvent::AttemptFailed {
                url,
                attempt,
                max_attempts,
                error,
            } => write!(
                f,
                "Attempt {attempt}/{max_attempts} failed for {url}: {error}"
            ),
            CrawlEvent::RetryScheduled { url, delay } => {
                write!(f, "Retrying {url} in {} ms", delay.as_millis())
            }
            CrawlEvent::SessionStarted { url } => {
                write!(f, "Initializing browser session for URL: {url}")
            }
            CrawlEvent::PageLoaded { url } => write!(f, "Page loaded for: {url}"),
            CrawlEvent::Scrolling { url, step, total } => {
                write!(f, "Scrolling down ({step}/{total}) for: {url}")
            }
            CrawlEvent::MarkupCaptured { url, bytes } => {
                write!(f, "HTML content extracted for: {url} ({bytes} bytes)")
            }
            CrawlEvent::RenderFailed { url, error } => {
                write!(f, "Error extracting content for {url}: {error}")
            }
            CrawlEvent::UrlSucceeded {
                url,
                attempts,
                records,
            } => write!(
                f,
                "Data parsing complete for URL: {url}. {records} items found (attempts: {attempts})"
            ),
            CrawlEvent::UrlFailed {
                url,
                attempts,
                reason,
            } => write!(f, "Giving up on {url} after {attempts} attempts: {reason}"),
            CrawlEvent::RunCompleted {
                succeeded,
                failed,
                records,
            } => write!(
                f,
                "Data fetching complete for all URLs: {succeeded} succeeded, {failed} failed, {records} records"
            ),
        }
    }
}

/// Receives crawl events (decoupled logging).
pub trait CrawlReporter: Send + Sync {
    fn report(&self, event: CrawlEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl CrawlReporter for TracingReporter {
    fn report(&self, event: CrawlEvent<'_>) {
        match event {
            CrawlEvent::RunStarted {
                urls,
                concurrency_limit,
            } => {
                tracing::info!(%urls, %concurrency_limit, "Crawl started");
            }
            CrawlEvent::AttemptStarted {
                url,
                attempt,
                max_attempts,
            } => {
                tracing::info!(%url, %attempt, %max_attempts, "Attempt started");
            }
            CrawlEvent::AttemptFailed {
                url,
                attempt,
                max_attempts,
                error,
            } => {
                tracing::warn!(%url, %attempt, %max_attempts, kind = error.kind(), %error, "Attempt failed");
            }
            CrawlEvent::RetryScheduled { url, delay } => {
                tracing::info!(%url, delay_ms = %delay.as_millis(), "Retry scheduled");
            }
            CrawlEvent::SessionStarted { url } => {
                tracing::debug!(%url, "Browser session started");
            }
            CrawlEvent::PageLoaded { url } => {
                tracing::debug!(%url, "Page loaded");
            }
            CrawlEvent::Scrolling { url, step, total } => {
                tracing::debug!(%url, %step, %total, "Scrolling");
            }
            CrawlEvent::MarkupCaptured { url, bytes } => {
                tracing::debug!(%url, %bytes, "Markup captured");
            }
            CrawlEvent::RenderFailed { url, error } => {
                tracing::warn!(%url, kind = error.kind(), %error, "Render failed");
            }
            CrawlEvent::UrlSucceeded {
                url,
                attempts,
                records,
            } => {
                tracing::info!(%url, %attempts, %records, "URL succeeded");
            }
            CrawlEvent::UrlFailed {
                url,
                attempts,
                reason,
            } => {
                tracing::error!(%url, %attempts, %reason, "URL failed");
            }
            CrawlEvent::RunCompleted {
                succeeded,
                failed,
                records,
            } => {
                tracing::info!(%succeeded, %failed, %records, "Crawl completed");
            }
        }
    }
}

/// Append-only, timestamped run log kept in memory.
///
/// Every event is also forwarded to [`TracingReporter`]. The whole log can
/// be read back with [`get_logs`](Self::get_logs) or written out with
/// [`save_to_file`](Self::save_to_file) once the run is over.
#[derive(Debug, Default)]
pub struct InMemoryLog {
    lines: Mutex<Vec<String>>,
}

impl InMemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a free-form message with the current local timestamp.
    pub fn log(&self, message: impl AsRef<str>) {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let line = format!("[{timestamp}] {}", message.as_ref());
        // Lines are append-only, so a poisoned lock is still usable.
        let mut lines = self.lines.lock().unwrap_or_else(|e| e.into_inner());
        lines.push(line);
    }

    /// All lines, newline separated.
    pub fn get_logs(&self) -> String {
        let lines = self.lines.lock().unwrap_or_else(|e| e.into_inner());
        lines.join("\n")
    }

    pub fn len(&self) -> usize {
        self.lines.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lines.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), AppError> {
        std::fs::write(path.as_ref(), self.get_logs())?;
        tracing::info!(path = %path.as_ref().display(), "Logs saved");
        Ok(())
    }
}

impl CrawlReporter for InMemoryLog {
    fn report(&self, event: CrawlEvent<'_>) {
        self.log(event.to_string());
        TracingReporter.report(event);
    }
}
