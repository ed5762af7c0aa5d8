use std::time::Duration;

use tickerfeed_client::FeedExtractor;
use tickerfeed_core::{CrawlConfig, InMemoryLog, Orchestrator, RenderOptions};

use crate::integration::common::{FixtureRenderer, LATEST_NEWS, holder_with};

const TSLA: &str = "https://finance.yahoo.com/quote/TSLA/latest-news/";
const RKLB: &str = "https://finance.yahoo.com/quote/RKLB/latest-news/";
const NVDA: &str = "https://finance.yahoo.com/quote/NVDA/latest-news/";

fn config() -> CrawlConfig {
    CrawlConfig::default()
        .with_backoff(Duration::from_millis(1), Duration::from_millis(3))
        .with_render_options(RenderOptions::default().with_scrolls(0, Duration::ZERO))
}

fn urls(list: &[&str]) -> Vec<String> {
    list.iter().map(|u| u.to_string()).collect()
}

#[tokio::test]
async fn failing_feed_yields_partial_dataset() {
    let rklb = holder_with(&["first", "second"]);
    let renderer = FixtureRenderer::new(&[(RKLB, rklb.as_str())], &[TSLA]);
    let orchestrator =
        Orchestrator::new(renderer.clone(), FeedExtractor::new().unwrap(), config());
    let log = InMemoryLog::new();

    let dataset = orchestrator.run(&urls(&[TSLA, RKLB]), &log).await.unwrap();

    let titles: Vec<&str> = dataset.records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["first", "second"]);
    assert!(dataset.records.iter().all(|r| r.release_time == "1 hour ago"));
    assert_eq!(dataset.failure_count(), 1);
    assert_eq!(dataset.success_count(), 1);
    assert_eq!(renderer.attempts(TSLA), 3);
    assert_eq!(renderer.attempts(RKLB), 1);

    let logs = log.get_logs();
    assert_eq!(logs.matches(&format!("failed for {TSLA}")).count(), 3);
    assert_eq!(
        logs.matches(&format!("Data parsing complete for URL: {RKLB}"))
            .count(),
        1
    );
}

#[tokio::test]
async fn real_extractor_drops_ads_across_feeds_and_keeps_order() {
    let nvda = holder_with(&["nvda-1"]);
    let renderer = FixtureRenderer::new(&[(TSLA, LATEST_NEWS), (NVDA, nvda.as_str())], &[]);
    let orchestrator = Orchestrator::new(renderer, FeedExtractor::new().unwrap(), config());

    let dataset = orchestrator
        .run(&urls(&[NVDA, TSLA]), &InMemoryLog::new())
        .await
        .unwrap();

    let titles: Vec<&str> = dataset.records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "nvda-1",
            "Tesla deliveries beat estimates",
            "Rocket Lab wins launch contract",
            "Nvidia unveils new data-center chip",
        ]
    );
    assert!(dataset.records.iter().all(|r| r.title != "Refinance today"));
    assert_eq!(dataset.reports[1].records, 3);
}

#[tokio::test]
async fn empty_feed_is_not_retried() {
    let renderer = FixtureRenderer::new(&[], &[]);
    let orchestrator =
        Orchestrator::new(renderer.clone(), FeedExtractor::new().unwrap(), config());

    let dataset = orchestrator
        .run(&urls(&[TSLA]), &InMemoryLog::new())
        .await
        .unwrap();

    assert!(dataset.is_empty());
    assert_eq!(dataset.success_count(), 1);
    assert_eq!(renderer.attempts(TSLA), 1);
}
