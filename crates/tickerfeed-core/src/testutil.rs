//! Test utilities: mock implementations of the core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::RenderOptions;
use crate::error::AppError;
use crate::models::{NO_TIME_INFO, NewsRecord};
use crate::reporter::CrawlReporter;
use crate::traits::{Extractor, PageRenderer};

// ---------------------------------------------------------------------------
// MockRenderer
// ---------------------------------------------------------------------------

/// Mock renderer with a scripted response queue per URL.
///
/// Each call pops the next response for its URL; an exhausted (or missing)
/// script yields an empty markup string. Tracks calls per URL, the global
/// call order, and the highest number of renders in flight at once.
#[derive(Clone, Default)]
pub struct MockRenderer {
    scripts: Arc<Mutex<HashMap<String, VecDeque<Result<String, AppError>>>>>,
    delays: Arc<Mutex<HashMap<String, Duration>>>,
    default_delay: Duration,
    calls: Arc<Mutex<Vec<String>>>,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl MockRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the responses for one URL, in attempt order.
    pub fn with_script(self, url: &str, responses: Vec<Result<String, AppError>>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(url.to_string(), responses.into());
        self
    }

    /// Make every render of `url` take `delay`.
    pub fn with_delay(self, url: &str, delay: Duration) -> Self {
        self.delays.lock().unwrap().insert(url.to_string(), delay);
        self
    }

    /// Make every render without a specific delay take `delay`.
    pub fn with_default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    pub fn calls_for(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// URLs in the order their renders started.
    pub fn call_order(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl PageRenderer for MockRenderer {
    async fn render(
        &self,
        url: &str,
        _options: &RenderOptions,
        _reporter: &dyn CrawlReporter,
    ) -> Result<String, AppError> {
        self.calls.lock().unwrap().push(url.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let delay = self
            .delays
            .lock()
            .unwrap()
            .get(url)
            .copied()
            .unwrap_or(self.default_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let response = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| Ok(String::new()));

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        response
    }
}

// ---------------------------------------------------------------------------
// MockExtractor
// ---------------------------------------------------------------------------

/// Mock extractor: every non-empty markup line becomes one record whose
/// title is the trimmed line.
#[derive(Clone, Default)]
pub struct MockExtractor {
    error: Arc<Mutex<Option<AppError>>>,
}

impl MockExtractor {
    pub fn lines() -> Self {
        Self::default()
    }

    /// Fails the next extraction with `error`, then behaves like `lines()`.
    pub fn with_error(error: AppError) -> Self {
        Self {
            error: Arc::new(Mutex::new(Some(error))),
        }
    }
}

impl Extractor for MockExtractor {
    fn extract(&self, markup: &str) -> Result<Vec<NewsRecord>, AppError> {
        if let Some(e) = self.error.lock().unwrap().take() {
            return Err(e);
        }
        Ok(markup
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|title| NewsRecord {
                title: title.to_string(),
                link: format!("https://example.com/{title}"),
                content: format!("{title} content"),
                release_time: NO_TIME_INFO.to_string(),
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Markup that `MockExtractor` turns into records titled `titles`.
pub fn markup_for(titles: &[&str]) -> String {
    titles.join("\n")
}

pub fn titles(records: &[NewsRecord]) -> Vec<&str> {
    records.iter().map(|r| r.title.as_str()).collect()
}
