mod export;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use tickerfeed_client::{BrowserRenderer, FeedExtractor};
use tickerfeed_core::traits::Extractor;
use tickerfeed_core::util::{DEFAULT_URL_TEMPLATE, feed_urls};
use tickerfeed_core::{AggregatedDataset, CrawlConfig, InMemoryLog, Orchestrator, RenderOptions};

const DEFAULT_TICKERS: [&str; 4] = ["TSLA", "RKLB", "RGTI", "NVDA"];

#[derive(Parser)]
#[command(name = "tickerfeed", version, about = "Ticker news-feed crawler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl ticker news feeds and write the records to CSV
    Crawl(CrawlArgs),

    /// Run the record extractor over saved feed markup and print JSON
    Extract {
        /// HTML file holding the captured item holder (or a whole page)
        #[arg(short, long)]
        file: PathBuf,

        /// Pretty-print the JSON output
        #[arg(long, default_value_t = false)]
        pretty: bool,
    },
}

#[derive(Args)]
struct CrawlArgs {
    /// Comma-separated tickers (defaults to TSLA,RKLB,RGTI,NVDA when no --url is given)
    #[arg(short, long, env = "TICKERFEED_TICKERS", value_delimiter = ',')]
    tickers: Vec<String>,

    /// Explicit feed URL; may be repeated
    #[arg(short, long = "url")]
    urls: Vec<String>,

    /// Feed URL template; `{ticker}` is replaced by each ticker
    #[arg(long, env = "TICKERFEED_URL_TEMPLATE", default_value = DEFAULT_URL_TEMPLATE)]
    url_template: String,

    /// Directory receiving the CSV and the log file
    #[arg(short, long, env = "TICKERFEED_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Base name of the CSV file; a timestamp is appended
    #[arg(long, env = "TICKERFEED_OUTPUT_NAME", default_value = "yahoo_news")]
    output_name: String,

    /// Log file name, written inside the output directory
    #[arg(long, env = "TICKERFEED_LOG_FILE", default_value = "process_log.txt")]
    log_file: String,

    /// Maximum number of attempts in flight at once
    #[arg(short, long, env = "TICKERFEED_CONCURRENCY", default_value_t = 2)]
    concurrency: usize,

    /// Total attempts per URL
    #[arg(long, env = "TICKERFEED_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Lower bound of the retry backoff, in seconds
    #[arg(long, env = "TICKERFEED_BACKOFF_MIN", default_value_t = 5)]
    backoff_min: u64,

    /// Upper bound of the retry backoff, in seconds
    #[arg(long, env = "TICKERFEED_BACKOFF_MAX", default_value_t = 10)]
    backoff_max: u64,

    /// Scroll-to-bottom steps per page
    #[arg(long, env = "TICKERFEED_SCROLL_COUNT", default_value_t = 3)]
    scroll_count: u32,

    /// Pause after each scroll, in milliseconds
    #[arg(long, env = "TICKERFEED_SCROLL_DELAY_MS", default_value_t = 2000)]
    scroll_delay_ms: u64,

    /// How long to wait for the feed container, in seconds
    #[arg(long, env = "TICKERFEED_WAIT_TIMEOUT", default_value_t = 20)]
    wait_timeout: u64,

    /// Chrome/Chromium executable to launch
    #[arg(long, env = "TICKERFEED_DRIVER_PATH")]
    driver_path: Option<PathBuf>,

    /// Show the browser window instead of running headless
    #[arg(long, default_value_t = false)]
    headful: bool,
}

impl CrawlArgs {
    fn crawl_config(&self) -> CrawlConfig {
        let mut render = RenderOptions::default()
            .with_scrolls(self.scroll_count, Duration::from_millis(self.scroll_delay_ms))
            .with_wait_timeout(Duration::from_secs(self.wait_timeout));
        if let Some(path) = &self.driver_path {
            render = render.with_driver_path(path);
        }
        render.headless = !self.headful;

        CrawlConfig::default()
            .with_concurrency_limit(self.concurrency)
            .with_max_retries(self.max_retries)
            .with_backoff(
                Duration::from_secs(self.backoff_min),
                Duration::from_secs(self.backoff_max),
            )
            .with_render_options(render)
    }

    /// Ticker URLs first, then explicit URLs, in the order given.
    fn target_urls(&self) -> Result<Vec<String>> {
        let tickers: Vec<&str> = if self.tickers.is_empty() && self.urls.is_empty() {
            DEFAULT_TICKERS.to_vec()
        } else {
            self.tickers.iter().map(String::as_str).collect()
        };

        let mut urls = feed_urls(&self.url_template, &tickers)?;
        urls.extend(self.urls.iter().cloned());
        Ok(urls)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("tickerfeed=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Crawl(args) => cmd_crawl(&args).await?,
        Commands::Extract { file, pretty } => cmd_extract(&file, pretty)?,
    }

    Ok(())
}

async fn cmd_crawl(args: &CrawlArgs) -> Result<()> {
    std::fs::create_dir_all(&args.output_dir).with_context(|| {
        format!(
            "Failed to create output directory {}",
            args.output_dir.display()
        )
    })?;

    let log = InMemoryLog::new();
    log.log("Starting the program...");

    let result = crawl(args, &log).await;
    match &result {
        Ok(path) => {
            log.log(format!("Data saved to {}", path.display()));
            log.log("Process completed successfully!");
        }
        Err(e) => log.log(format!("An error occurred: {e:#}")),
    }

    let log_path = args.output_dir.join(&args.log_file);
    log.save_to_file(&log_path)
        .with_context(|| format!("Failed to save log to {}", log_path.display()))?;
    eprintln!("Log written to {}", log_path.display());

    let path = result?;
    println!("{}", path.display());
    Ok(())
}

async fn crawl(args: &CrawlArgs, log: &InMemoryLog) -> Result<PathBuf> {
    let urls = args.target_urls()?;
    let orchestrator = Orchestrator::new(
        BrowserRenderer::new(),
        FeedExtractor::new()?,
        args.crawl_config(),
    );

    let graceful = CancellationToken::new();
    let abort = CancellationToken::new();
    let watcher = tokio::spawn(escalate_interrupts(
        || async { tokio::signal::ctrl_c().await.is_ok() },
        graceful.clone(),
        abort.clone(),
    ));

    let dataset = tokio::select! {
        dataset = orchestrator.run_with_cancel(&urls, log, graceful) => dataset,
        () = abort.cancelled() => {
            watcher.abort();
            anyhow::bail!("Interrupted twice; attempts in flight abandoned");
        }
    };
    watcher.abort();
    let dataset = dataset?;

    summarize(&dataset, log);
    export::write_csv(&dataset, &args.output_name, &args.output_dir)
}

/// First interrupt cancels `graceful` so in-flight attempts can finish and
/// partial results get written; a second one cancels `abort`.
async fn escalate_interrupts<F, Fut>(
    mut interrupted: F,
    graceful: CancellationToken,
    abort: CancellationToken,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    if !interrupted().await {
        return;
    }
    tracing::warn!(
        "Interrupted; finishing attempts in flight and writing partial results (Ctrl-C again to abort)"
    );
    graceful.cancel();

    if !interrupted().await {
        return;
    }
    tracing::warn!("Interrupted again; abandoning attempts in flight");
    abort.cancel();
}

fn summarize(dataset: &AggregatedDataset, log: &InMemoryLog) {
    log.log(format!(
        "{} records from {} feeds ({} failed)",
        dataset.len(),
        dataset.success_count(),
        dataset.failure_count()
    ));
    for (url, reason) in dataset.failures() {
        log.log(format!("No data for {url}: {reason}"));
    }
}

fn cmd_extract(file: &Path, pretty: bool) -> Result<()> {
    let markup = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let records = FeedExtractor::new()?.extract(&markup)?;
    tracing::info!(records = records.len(), "Extraction complete");

    let json = if pretty {
        serde_json::to_string_pretty(&records)?
    } else {
        serde_json::to_string(&records)?
    };
    println!("{json}");
    Ok(())
}
