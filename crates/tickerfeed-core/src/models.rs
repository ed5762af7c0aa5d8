use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Placeholder written when an item has no footer timestamp.
pub const NO_TIME_INFO: &str = "No Time Info";
/// Placeholder for a missing title.
pub const NO_TITLE: &str = "No Title";
/// Placeholder for a missing link.
pub const NO_LINK: &str = "No Link";

/// One news item scraped from a ticker's feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsRecord {
    pub title: String,
    pub link: String,
    pub content: String,
    pub release_time: String,
}

/// Result of a single render+extract attempt.
///
/// "No qualifying items" is a normal outcome and is kept apart from
/// failures so callers never have to guess from an empty vector.
#[derive(Debug)]
pub enum AttemptOutcome {
    Success(Vec<NewsRecord>),
    EmptyResult,
    Failure(AppError),
}

impl AttemptOutcome {
    pub fn from_records(records: Vec<NewsRecord>) -> Self {
        if records.is_empty() {
            AttemptOutcome::EmptyResult
        } else {
            AttemptOutcome::Success(records)
        }
    }
}

impl From<Result<Vec<NewsRecord>, AppError>> for AttemptOutcome {
    fn from(result: Result<Vec<NewsRecord>, AppError>) -> Self {
        match result {
            Ok(records) => AttemptOutcome::from_records(records),
            Err(e) => AttemptOutcome::Failure(e),
        }
    }
}

/// Terminal outcome for one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlResult {
    /// Records in page document order (possibly empty).
    Success(Vec<NewsRecord>),
    /// Every attempt failed; the reason is the last error seen.
    Failure { reason: String },
}

impl CrawlResult {
    pub fn is_success(&self) -> bool {
        matches!(self, CrawlResult::Success(_))
    }

    pub fn records(&self) -> &[NewsRecord] {
        match self {
            CrawlResult::Success(records) => records,
            CrawlResult::Failure { .. } => &[],
        }
    }
}

/// A URL together with its terminal result and the attempts it consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlOutcome {
    pub url: String,
    pub attempts: u32,
    pub result: CrawlResult,
}

/// Per-URL line of the run report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlReport {
    pub url: String,
    pub attempts: u32,
    pub records: usize,
    /// `None` when the URL succeeded.
    pub failure: Option<String>,
}

/// The final, ordered dataset of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregatedDataset {
    /// Records concatenated in input URL order, page order within a URL.
    pub records: Vec<NewsRecord>,
    /// One entry per input URL, in input order.
    pub reports: Vec<UrlReport>,
}

impl AggregatedDataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.reports.iter().filter(|r| r.failure.is_none()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.reports.iter().filter(|r| r.failure.is_some()).count()
    }

    /// Failed URLs with their reasons, in input order.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.reports
            .iter()
            .filter_map(|r| r.failure.as_deref().map(|f| (r.url.as_str(), f)))
    }
}
