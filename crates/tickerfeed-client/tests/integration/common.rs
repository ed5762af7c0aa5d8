use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tickerfeed_core::{AppError, CrawlReporter, PageRenderer, RenderOptions};

/// Rendered holder markup for a TSLA feed: five items, three of them usable.
pub const LATEST_NEWS: &str = include_str!("../fixtures/latest_news.html");

/// Renderer that serves canned markup instead of driving a browser.
///
/// URLs listed in `failing` always fail with a timeout; every other URL
/// gets the markup registered for it (or an empty holder).
#[derive(Clone, Default)]
pub struct FixtureRenderer {
    pages: Arc<HashMap<String, String>>,
    failing: Arc<Vec<String>>,
    attempts: Arc<Mutex<HashMap<String, u32>>>,
}

impl FixtureRenderer {
    pub fn new(pages: &[(&str, &str)], failing: &[&str]) -> Self {
        Self {
            pages: Arc::new(
                pages
                    .iter()
                    .map(|(url, html)| (url.to_string(), html.to_string()))
                    .collect(),
            ),
            failing: Arc::new(failing.iter().map(|u| u.to_string()).collect()),
            attempts: Arc::default(),
        }
    }

    pub fn attempts(&self, url: &str) -> u32 {
        self.attempts.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

impl PageRenderer for FixtureRenderer {
    async fn render(
        &self,
        url: &str,
        options: &RenderOptions,
        _reporter: &dyn CrawlReporter,
    ) -> Result<String, AppError> {
        *self
            .attempts
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default() += 1;

        if self.failing.iter().any(|u| u == url) {
            return Err(AppError::Timeout(options.element_wait_timeout.as_secs()));
        }
        Ok(self
            .pages
            .get(url)
            .cloned()
            .unwrap_or_else(|| "<div class=\"holder\"><ul></ul></div>".to_string()))
    }
}

/// Holder markup with one complete item per title, in order.
pub fn holder_with(titles: &[&str]) -> String {
    let items: String = titles
        .iter()
        .map(|t| {
            format!(
                r#"<li><div class="content"><a title="{t}" href="https://example.com/{t}">{t}</a><p>{t} summary</p><div class="footer"><i>&bull;</i> 1 hour ago</div></div></li>"#
            )
        })
        .collect();
    format!("<div class=\"holder\"><ul>{items}</ul></div>")
}
