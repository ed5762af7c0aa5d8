//! Bounded, retrying crawl over a list of feed URLs.
//!
//! One logical task per URL runs concurrently on the caller's runtime.
//! A counting semaphore caps the number of *attempts* in flight: a task
//! takes a slot right before it renders and gives it back as soon as the
//! attempt is over, so tasks queued for a slot or sleeping in backoff never
//! count against the limit. Markup parsing is moved onto tokio's blocking
//! pool so the scheduler threads never run it.

use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::aggregate::aggregate;
use crate::config::{CrawlConfig, validate_urls};
use crate::error::AppError;
use crate::models::{AggregatedDataset, AttemptOutcome, CrawlResult, UrlOutcome};
use crate::reporter::{CrawlEvent, CrawlReporter};
use crate::task::{FetchTask, TaskState};
use crate::traits::{Extractor, PageRenderer};

/// Runs render+extract for every URL and aggregates the results.
///
/// Generic over the renderer and extractor so the whole retry/bounding
/// logic can be exercised without a browser.
pub struct Orchestrator<R, E>
where
    R: PageRenderer,
    E: Extractor,
{
    renderer: R,
    extractor: E,
    config: CrawlConfig,
}

impl<R, E> Orchestrator<R, E>
where
    R: PageRenderer,
    E: Extractor,
{
    pub fn new(renderer: R, extractor: E, config: CrawlConfig) -> Self {
        Self {
            renderer,
            extractor,
            config,
        }
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Crawl `urls` to completion.
    ///
    /// Misconfiguration is returned before any task starts. After that the
    /// run always yields a dataset: URLs that exhaust their attempts are
    /// reported in it and contribute no records.
    pub async fn run(
        &self,
        urls: &[String],
        reporter: &dyn CrawlReporter,
    ) -> Result<AggregatedDataset, AppError> {
        self.run_with_cancel(urls, reporter, CancellationToken::new())
            .await
    }

    /// Like [`run`](Self::run), but stops scheduling work once `cancel`
    /// fires. Tasks waiting for a slot or in backoff end as failed with
    /// [`AppError::Cancelled`]; an attempt already rendering is let finish.
    pub async fn run_with_cancel(
        &self,
        urls: &[String],
        reporter: &dyn CrawlReporter,
        cancel: CancellationToken,
    ) -> Result<AggregatedDataset, AppError> {
        self.config.validate()?;
        validate_urls(urls)?;

        reporter.report(CrawlEvent::RunStarted {
            urls: urls.len(),
            concurrency_limit: self.config.concurrency_limit,
        });

        let slots = Semaphore::new(self.config.concurrency_limit);
        // join_all keeps input order regardless of completion order.
        let outcomes = join_all(
            urls.iter()
                .map(|url| self.drive(url, &slots, reporter, &cancel)),
        )
        .await;

        let dataset = aggregate(outcomes);
        reporter.report(CrawlEvent::RunCompleted {
            succeeded: dataset.success_count(),
            failed: dataset.failure_count(),
            records: dataset.len(),
        });
        Ok(dataset)
    }

    /// Drive one URL's task to a terminal state.
    async fn drive(
        &self,
        url: &str,
        slots: &Semaphore,
        reporter: &dyn CrawlReporter,
        cancel: &CancellationToken,
    ) -> UrlOutcome {
        let mut task = FetchTask::new(url, self.config.max_retries);

        while !task.state().is_terminal() {
            let permit = tokio::select! {
                biased;
                () = cancel.cancelled() => Err(AppError::Cancelled),
                permit = slots.acquire() => permit
                    .map_err(|e| AppError::Generic(format!("Concurrency gate closed: {e}"))),
            };
            let permit = match permit {
                Ok(permit) => permit,
                Err(e) => {
                    task.abandon(&e);
                    break;
                }
            };

            let attempt = task.begin_attempt();
            reporter.report(CrawlEvent::AttemptStarted {
                url,
                attempt,
                max_attempts: task.max_attempts,
            });
            let outcome = self.attempt(url, reporter).await;
            drop(permit);

            match outcome {
                AttemptOutcome::Success(records) => task.succeed(records),
                AttemptOutcome::EmptyResult => task.succeed(Vec::new()),
                AttemptOutcome::Failure(error) => {
                    reporter.report(CrawlEvent::AttemptFailed {
                        url,
                        attempt,
                        max_attempts: task.max_attempts,
                        error: &error,
                    });
                    if task.fail_attempt(&error) == TaskState::RetryWait {
                        let delay = self.config.backoff_delay();
                        reporter.report(CrawlEvent::RetryScheduled { url, delay });
                        tokio::select! {
                            biased;
                            () = cancel.cancelled() => task.abandon(&AppError::Cancelled),
                            () = tokio::time::sleep(delay) => {}
                        }
                    }
                }
            }
        }

        let outcome = task.into_outcome();
        match &outcome.result {
            CrawlResult::Success(records) => {
                reporter.report(CrawlEvent::UrlSucceeded {
                    url,
                    attempts: outcome.attempts,
                    records: records.len(),
                })
            }
            CrawlResult::Failure { reason } => {
                reporter.report(CrawlEvent::UrlFailed {
                    url,
                    attempts: outcome.attempts,
                    reason,
                })
            }
        }
        outcome
    }

    /// One render+extract cycle.
    async fn attempt(&self, url: &str, reporter: &dyn CrawlReporter) -> AttemptOutcome {
        let markup = match self
            .renderer
            .render(url, &self.config.render, reporter)
            .await
        {
            Ok(markup) => markup,
            Err(e) => return AttemptOutcome::Failure(e),
        };

        let extractor = self.extractor.clone();
        let extracted = tokio::task::spawn_blocking(move || extractor.extract(&markup)).await;
        match extracted {
            Ok(result) => result.into(),
            Err(e) => AttemptOutcome::Failure(AppError::Generic(format!(
                "Extraction task failed: {e}"
            ))),
        }
    }
}
