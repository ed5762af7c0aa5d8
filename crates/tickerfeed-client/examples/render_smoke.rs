/// Smoke-test for `BrowserRenderer` + `FeedExtractor`.
///
/// Launches a headless Chromium, renders one ticker's news feed, and prints
/// the records extracted from it.
///
/// Run with:
///   cargo run -p tickerfeed-client --example render_smoke -- TSLA
use tickerfeed_client::{BrowserRenderer, FeedExtractor};
use tickerfeed_core::util::{DEFAULT_URL_TEMPLATE, feed_url};
use tickerfeed_core::{Extractor, InMemoryLog, PageRenderer, RenderOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .init();

    let ticker = std::env::args().nth(1).unwrap_or_else(|| "TSLA".to_string());
    let url = feed_url(DEFAULT_URL_TEMPLATE, &ticker)?;
    let log = InMemoryLog::new();

    println!("Rendering {url} …");
    let html = BrowserRenderer::new()
        .render(&url, &RenderOptions::default(), &log)
        .await?;

    let records = FeedExtractor::new()?.extract(&html)?;
    assert!(
        !records.is_empty(),
        "No records extracted; selectors may have drifted"
    );

    for record in &records {
        println!("{} | {} | {}", record.release_time, record.title, record.link);
    }
    println!("OK: {} records from {} bytes of HTML", records.len(), html.len());
    println!("\n{}", log.get_logs());
    Ok(())
}
