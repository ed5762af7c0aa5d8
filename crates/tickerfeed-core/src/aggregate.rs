use crate::models::{AggregatedDataset, CrawlResult, UrlOutcome, UrlReport};

/// Fold per-URL outcomes into the final dataset.
///
/// `outcomes` must already be in input URL order; records are appended in
/// that order and failed URLs add nothing but their report line.
pub fn aggregate(outcomes: Vec<UrlOutcome>) -> AggregatedDataset {
    let mut dataset = AggregatedDataset {
        records: Vec::new(),
        reports: Vec::with_capacity(outcomes.len()),
    };

    for outcome in outcomes {
        let records = outcome.result.records().len();
        let failure = match outcome.result {
            CrawlResult::Success(records) => {
                dataset.records.extend(records);
                None
            }
            CrawlResult::Failure { reason } => Some(reason),
        };
        dataset.reports.push(UrlReport {
            url: outcome.url,
            attempts: outcome.attempts,
            records,
            failure,
        });
    }

    dataset
}
