//! Run configuration for a crawl.
//!
//! [`CrawlConfig`] carries the orchestration knobs (concurrency bound,
//! attempt budget, backoff window); [`RenderOptions`] carries what the
//! page renderer needs for a single attempt.

use std::path::PathBuf;
use std::time::Duration;

use rand::Rng;
use tokio::sync::Semaphore;
use url::Url;

use crate::error::AppError;

/// Browser-side options for one render attempt.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Number of scroll-to-bottom passes used to trigger lazy loading.
    pub scroll_count: u32,
    /// Pause after each scroll pass.
    pub scroll_delay: Duration,
    /// How long to wait for the feed container to appear.
    pub element_wait_timeout: Duration,
    /// Browser executable. `None` lets the renderer discover one.
    pub driver_path: Option<PathBuf>,
    /// CSS selector of the outer feed container.
    pub container_selector: String,
    /// CSS selector of the item holder, relative to the container.
    pub holder_selector: String,
    pub headless: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            scroll_count: 3,
            scroll_delay: Duration::from_secs(2),
            element_wait_timeout: Duration::from_secs(20),
            driver_path: None,
            container_selector: ".news-stream".to_string(),
            holder_selector: ".holder".to_string(),
            headless: true,
        }
    }
}

impl RenderOptions {
    pub fn with_scrolls(mut self, count: u32, delay: Duration) -> Self {
        self.scroll_count = count;
        self.scroll_delay = delay;
        self
    }

    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.element_wait_timeout = timeout;
        self
    }

    pub fn with_driver_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.driver_path = Some(path.into());
        self
    }
}

/// Orchestration settings for a whole run.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Maximum number of attempts in flight at once.
    pub concurrency_limit: usize,
    /// Total attempts allowed per URL, the first one included.
    pub max_retries: u32,
    /// Lower bound of the jittered wait between attempts.
    pub backoff_min: Duration,
    /// Upper bound of the jittered wait between attempts.
    pub backoff_max: Duration,
    pub render: RenderOptions,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: 2,
            max_retries: 3,
            backoff_min: Duration::from_secs(5),
            backoff_max: Duration::from_secs(10),
            render: RenderOptions::default(),
        }
    }
}

impl CrawlConfig {
    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = limit;
        self
    }

    pub fn with_max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }

    pub fn with_backoff(mut self, min: Duration, max: Duration) -> Self {
        self.backoff_min = min;
        self.backoff_max = max;
        self
    }

    pub fn with_render_options(mut self, render: RenderOptions) -> Self {
        self.render = render;
        self
    }

    /// Check the settings before any task is started.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.concurrency_limit == 0 {
            return Err(AppError::ConfigError(
                "concurrency_limit must be at least 1".into(),
            ));
        }
        if self.concurrency_limit > Semaphore::MAX_PERMITS {
            return Err(AppError::ConfigError(format!(
                "concurrency_limit {} exceeds the maximum of {}",
                self.concurrency_limit,
                Semaphore::MAX_PERMITS
            )));
        }
        if self.max_retries == 0 {
            return Err(AppError::ConfigError(
                "max_retries must be at least 1".into(),
            ));
        }
        if self.backoff_min > self.backoff_max {
            return Err(AppError::ConfigError(format!(
                "backoff range is inverted: {:?} > {:?}",
                self.backoff_min, self.backoff_max
            )));
        }
        if self.render.container_selector.trim().is_empty()
            || self.render.holder_selector.trim().is_empty()
        {
            return Err(AppError::ConfigError(
                "container and holder selectors must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Draw a backoff duration uniformly from `[backoff_min, backoff_max]`.
    pub fn backoff_delay(&self) -> Duration {
        let min = whole_nanos(self.backoff_min);
        let max = whole_nanos(self.backoff_max);
        if max <= min {
            return self.backoff_min;
        }
        Duration::from_nanos(rand::rng().random_range(min..=max))
    }
}

/// Nanoseconds, saturating at roughly 584 years.
fn whole_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

/// Reject anything that is not an absolute http(s) URL.
pub fn validate_urls(urls: &[String]) -> Result<(), AppError> {
    for raw in urls {
        let parsed = Url::parse(raw)
            .map_err(|e| AppError::ConfigError(format!("Invalid URL '{raw}': {e}")))?;
        match parsed.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(AppError::ConfigError(format!(
                    "URL scheme '{scheme}' is not allowed for '{raw}' (only http/https)"
                )));
            }
        }
    }
    Ok(())
}
