pub mod aggregate;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod reporter;
pub mod task;
pub mod traits;
pub mod util;

#[cfg(test)]
mod testutil;

pub use aggregate::aggregate;
pub use config::{CrawlConfig, RenderOptions};
pub use error::AppError;
pub use models::{AggregatedDataset, AttemptOutcome, CrawlResult, NewsRecord, UrlOutcome};
pub use orchestrator::Orchestrator;
pub use reporter::{CrawlEvent, CrawlReporter, InMemoryLog, TracingReporter};
pub use task::{FetchTask, TaskState};
pub use traits::{Extractor, PageRenderer};
