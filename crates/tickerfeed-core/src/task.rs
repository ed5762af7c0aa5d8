use std::fmt;

use crate::error::AppError;
use crate::models::{CrawlResult, NewsRecord, UrlOutcome};

/// Lifecycle of one URL's fetch task.
///
/// `Pending → Attempting → {Succeeded, RetryWait, Failed}`, and
/// `RetryWait → Attempting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Attempting,
    RetryWait,
    Succeeded,
    Failed,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Pending => "pending",
            TaskState::Attempting => "attempting",
            TaskState::RetryWait => "retry_wait",
            TaskState::Succeeded => "succeeded",
            TaskState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Succeeded | TaskState::Failed)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-URL retry state machine, owned by exactly one orchestrator future.
#[derive(Debug)]
pub struct FetchTask {
    pub url: String,
    pub attempts: u32,
    pub max_attempts: u32,
    state: TaskState,
    records: Vec<NewsRecord>,
    last_error: Option<String>,
}

impl FetchTask {
    pub fn new(url: impl Into<String>, max_attempts: u32) -> Self {
        Self {
            url: url.into(),
            attempts: 0,
            max_attempts,
            state: TaskState::Pending,
            records: Vec::new(),
            last_error: None,
        }
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn can_retry(&self) -> bool {
        self.attempts < self.max_attempts
    }

    /// Enter `Attempting` and count the attempt. Returns its 1-based number.
    pub fn begin_attempt(&mut self) -> u32 {
        debug_assert!(matches!(
            self.state,
            TaskState::Pending | TaskState::RetryWait
        ));
        self.attempts += 1;
        self.state = TaskState::Attempting;
        self.attempts
    }

    pub fn succeed(&mut self, records: Vec<NewsRecord>) {
        self.records = records;
        self.state = TaskState::Succeeded;
    }

    /// Record a failed attempt; moves to `RetryWait` while budget remains,
    /// otherwise to `Failed`.
    pub fn fail_attempt(&mut self, error: &AppError) -> TaskState {
        self.last_error = Some(error.to_string());
        self.state = if self.can_retry() {
            TaskState::RetryWait
        } else {
            TaskState::Failed
        };
        self.state
    }

    /// Stop without further attempts (e.g. the run was cancelled).
    pub fn abandon(&mut self, error: &AppError) {
        self.last_error = Some(error.to_string());
        self.state = TaskState::Failed;
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Consume a terminal task into its outcome.
    pub fn into_outcome(self) -> UrlOutcome {
        let result = match self.state {
            TaskState::Succeeded => CrawlResult::Success(self.records),
            _ => CrawlResult::Failure {
                reason: self
                    .last_error
                    .unwrap_or_else(|| format!("task ended in state {}", self.state)),
            },
        };
        UrlOutcome {
            url: self.url,
            attempts: self.attempts,
            result,
        }
    }
}
