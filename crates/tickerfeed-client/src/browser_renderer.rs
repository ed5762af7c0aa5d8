use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::{Browser, BrowserConfig, Element, Page};
use futures::StreamExt;
use tickerfeed_core::config::RenderOptions;
use tickerfeed_core::error::AppError;
use tickerfeed_core::reporter::{CrawlEvent, CrawlReporter};
use tickerfeed_core::traits::PageRenderer;
use tokio::task::JoinHandle;

const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight);";
const POLL_INTERVAL: Duration = Duration::from_millis(250);
/// How long a closed browser gets to exit before it is killed.
const EXIT_GRACE: Duration = Duration::from_secs(5);

/// Headless-browser renderer using Chromium via the Chrome DevTools Protocol.
///
/// Every [`PageRenderer::render`] call launches its own Chromium process,
/// so attempts share no cookies, cache, or tabs. The page is scrolled to
/// the bottom a few times to trigger lazy loading, then the item holder
/// inside the feed container is captured as HTML.
///
/// # Example
///
/// ```rust,no_run
/// use tickerfeed_client::BrowserRenderer;
/// use tickerfeed_core::{PageRenderer, RenderOptions, TracingReporter};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let renderer = BrowserRenderer::new();
/// let html = renderer
///     .render(
///         "https://finance.yahoo.com/quote/TSLA/latest-news/",
///         &RenderOptions::default(),
///         &TracingReporter,
///     )
///     .await?;
/// println!("{}", &html[..200]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct BrowserRenderer;

impl BrowserRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Tries to locate the real Chrome/Chromium binary.
    ///
    /// An explicit `driver_path` wins, then `$CHROME_BIN`, then well-known
    /// install locations. On Ubuntu the snap wrapper at `/snap/bin/chromium`
    /// strips unknown CLI flags, so the binary inside the snap is preferred.
    /// `None` lets `chromiumoxide` do its own lookup.
    fn find_chrome_binary(options: &RenderOptions) -> Option<PathBuf> {
        if let Some(path) = &options.driver_path {
            return Some(path.clone());
        }

        if let Ok(p) = std::env::var("CHROME_BIN") {
            let path = PathBuf::from(&p);
            if path.exists() {
                return Some(path);
            }
        }

        let candidates: &[&str] = &[
            // Snap (Ubuntu default)
            "/snap/chromium/current/usr/lib/chromium-browser/chrome",
            // Flatpak
            "/var/lib/flatpak/exports/bin/org.chromium.Chromium",
            // Common apt / manual installs
            "/usr/bin/google-chrome-stable",
            "/usr/bin/google-chrome",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
        ];

        candidates
            .iter()
            .map(PathBuf::from)
            .find(|p| p.exists())
    }

    fn browser_config(options: &RenderOptions) -> Result<BrowserConfig, AppError> {
        let mut builder = BrowserConfig::builder();
        builder = builder.no_sandbox().disable_default_args();

        if let Some(bin) = Self::find_chrome_binary(options) {
            tracing::debug!("Using Chrome binary: {}", bin.display());
            builder = builder.chrome_executable(bin);
        }

        builder = if options.headless {
            builder.arg("--headless=new")
        } else {
            builder.with_head()
        };

        builder
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-popup-blocking")
            .arg("--disable-translate")
            .arg("--no-first-run")
            .arg("--disable-blink-features=AutomationControlled")
            .build()
            .map_err(|e| AppError::BrowserError(format!("Browser config error: {e}")))
    }

    /// One attempt against an already launched session.
    async fn capture(
        browser: &Browser,
        url: &str,
        options: &RenderOptions,
        reporter: &dyn CrawlReporter,
    ) -> Result<String, AppError> {
        let page = browser
            .new_page(url)
            .await
            .map_err(|e| AppError::NavigationError(format!("Failed to navigate to {url}: {e}")))?;
        reporter.report(CrawlEvent::PageLoaded { url });

        let result = Self::capture_from_page(&page, url, options, reporter).await;
        let _ = page.close().await;
        result
    }

    async fn capture_from_page(
        page: &Page,
        url: &str,
        options: &RenderOptions,
        reporter: &dyn CrawlReporter,
    ) -> Result<String, AppError> {
        wait_for_element(
            page,
            &options.container_selector,
            options.element_wait_timeout,
        )
        .await?;

        for step in 1..=options.scroll_count {
            reporter.report(CrawlEvent::Scrolling {
                url,
                step,
                total: options.scroll_count,
            });
            page.evaluate(SCROLL_TO_BOTTOM)
                .await
                .map_err(|e| AppError::BrowserError(format!("Scroll failed on {url}: {e}")))?;
            tokio::time::sleep(options.scroll_delay).await;
        }

        let container = page
            .find_element(options.container_selector.as_str())
            .await
            .map_err(|e| {
                AppError::ExtractionFailure(format!(
                    "Feed container '{}' not found on {url}: {e}",
                    options.container_selector
                ))
            })?;
        let holder = container
            .find_element(options.holder_selector.as_str())
            .await
            .map_err(|e| {
                AppError::ExtractionFailure(format!(
                    "Item holder '{}' not found on {url}: {e}",
                    options.holder_selector
                ))
            })?;

        let html = holder
            .outer_html()
            .await
            .map_err(|e| AppError::ExtractionFailure(format!("Failed to read holder HTML: {e}")))?
            .ok_or_else(|| {
                AppError::ExtractionFailure(format!("Item holder on {url} has no HTML"))
            })?;

        reporter.report(CrawlEvent::MarkupCaptured {
            url,
            bytes: html.len(),
        });
        Ok(html)
    }
}

impl PageRenderer for BrowserRenderer {
    async fn render(
        &self,
        url: &str,
        options: &RenderOptions,
        reporter: &dyn CrawlReporter,
    ) -> Result<String, AppError> {
        reporter.report(CrawlEvent::SessionStarted { url });

        let result = match BrowserSession::launch(options).await {
            Ok(mut session) => {
                let result = Self::capture(&session.browser, url, options, reporter).await;
                session.close().await;
                result
            }
            Err(e) => Err(e),
        };

        if let Err(error) = &result {
            reporter.report(CrawlEvent::RenderFailed { url, error });
        }
        result
    }
}

/// One Chromium process plus the task polling its CDP connection.
///
/// `close` shuts it down cleanly; if the session is dropped without that
/// (panic, cancelled future) the handler task is aborted and chromiumoxide
/// kills the child process when `Browser` drops.
struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl BrowserSession {
    async fn launch(options: &RenderOptions) -> Result<Self, AppError> {
        let config = BrowserRenderer::browser_config(options)?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| AppError::BrowserError(format!("Failed to launch browser: {e}")))?;

        // The CDP handler must be polled continuously for the connection to work.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    tracing::warn!("Browser CDP handler error: {event:?}");
                    break;
                }
            }
        });

        Ok(Self { browser, handler })
    }

    async fn close(&mut self) {
        shut_down(&mut self.browser, EXIT_GRACE).await;
        self.handler.abort();
    }
}

/// Process-level calls used to tear a browser down.
trait BrowserProcess {
    /// Ask the browser to close over CDP.
    async fn request_close(&mut self) -> Result<(), String>;
    /// Wait for the child process to exit.
    async fn wait_exit(&mut self) -> Result<(), String>;
    async fn force_kill(&mut self) -> Result<(), String>;
}

impl BrowserProcess for Browser {
    async fn request_close(&mut self) -> Result<(), String> {
        Browser::close(self).await.map(|_| ()).map_err(|e| e.to_string())
    }

    async fn wait_exit(&mut self) -> Result<(), String> {
        Browser::wait(self).await.map(|_| ()).map_err(|e| e.to_string())
    }

    async fn force_kill(&mut self) -> Result<(), String> {
        match Browser::kill(self).await {
            Some(result) => result.map_err(|e| e.to_string()),
            None => Ok(()),
        }
    }
}

/// Close the browser, killing it when the close request cannot be
/// delivered or the process outlives `grace`.
async fn shut_down(process: &mut impl BrowserProcess, grace: Duration) {
    if let Err(e) = process.request_close().await {
        // No CDP connection left, so nothing will tell the process to exit.
        tracing::debug!(error = %e, "Browser close failed; killing process");
        if let Err(e) = process.force_kill().await {
            tracing::warn!(error = %e, "Failed to kill browser process");
        }
        return;
    }

    match tokio::time::timeout(grace, process.wait_exit()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::debug!(error = %e, "Browser wait failed"),
        Err(_) => {
            tracing::warn!(grace = ?grace, "Browser did not exit after close; killing process");
            if let Err(e) = process.force_kill().await {
                tracing::warn!(error = %e, "Failed to kill browser process");
            }
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

/// Poll for `selector` until it appears or `timeout` elapses.
async fn wait_for_element(
    page: &Page,
    selector: &str,
    timeout: Duration,
) -> Result<Element, AppError> {
    tokio::time::timeout(timeout, async {
        loop {
            if let Ok(element) = page.find_element(selector).await {
                return element;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    })
    .await
    .map_err(|_| AppError::timeout_after(timeout))
}
