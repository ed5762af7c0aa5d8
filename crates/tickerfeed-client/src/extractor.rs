use std::sync::Arc;

use scraper::{ElementRef, Html, Selector};
use tickerfeed_core::error::AppError;
use tickerfeed_core::models::{NO_LINK, NO_TIME_INFO, NO_TITLE, NewsRecord};
use tickerfeed_core::traits::Extractor;

/// CSS selectors describing the feed markup, evaluated per list item.
///
/// `content_block` and `footer` are matched among the item's descendants
/// only; the field selectors then run inside those blocks. Keep the field
/// selectors free of ancestor parts, since scraper would match those
/// against the whole document rather than the item.
#[derive(Debug, Clone)]
pub struct FeedSelectors {
    /// One candidate news item.
    pub item: String,
    /// Elements whose own text may carry the ad marker.
    pub ad_marker: String,
    /// Text that marks an item as sponsored.
    pub ad_text: String,
    /// Block holding the headline anchor and the summary.
    pub content_block: String,
    /// Anchor carrying the headline in its `title` attribute.
    pub title: String,
    /// Anchor carrying the article URL in its `href` attribute.
    pub link: String,
    /// Summary paragraph.
    pub content: String,
    /// Block holding the timestamp.
    pub footer: String,
    /// Icon in the footer; the timestamp is the text right after it.
    pub time_icon: String,
}

impl Default for FeedSelectors {
    fn default() -> Self {
        Self {
            item: "li".into(),
            ad_marker: "span".into(),
            ad_text: "Ad".into(),
            content_block: "div[class*='content']".into(),
            title: "a[title]".into(),
            link: "a[href]".into(),
            content: "p".into(),
            footer: "div[class*='footer']".into(),
            time_icon: "i".into(),
        }
    }
}

struct Compiled {
    item: Selector,
    ad_marker: Selector,
    ad_text: String,
    content_block: Selector,
    title: Selector,
    link: Selector,
    content: Selector,
    footer: Selector,
    time_icon: Selector,
}

/// News-feed record extractor built on `scraper`.
///
/// Walks every list item in document order, drops sponsored ones, and
/// keeps an item only when it has a title, a link, and summary text.
#[derive(Clone)]
pub struct FeedExtractor {
    selectors: Arc<Compiled>,
}

impl FeedExtractor {
    pub fn new() -> Result<Self, AppError> {
        Self::with_selectors(&FeedSelectors::default())
    }

    pub fn with_selectors(selectors: &FeedSelectors) -> Result<Self, AppError> {
        Ok(Self {
            selectors: Arc::new(Compiled {
                item: parse_selector(&selectors.item)?,
                ad_marker: parse_selector(&selectors.ad_marker)?,
                ad_text: selectors.ad_text.clone(),
                content_block: parse_selector(&selectors.content_block)?,
                title: parse_selector(&selectors.title)?,
                link: parse_selector(&selectors.link)?,
                content: parse_selector(&selectors.content)?,
                footer: parse_selector(&selectors.footer)?,
                time_icon: parse_selector(&selectors.time_icon)?,
            }),
        })
    }

    fn is_ad(&self, item: ElementRef<'_>) -> bool {
        item.select(&self.selectors.ad_marker).any(|marker| {
            marker
                .children()
                .filter_map(|child| child.value().as_text())
                .any(|text| text.trim() == self.selectors.ad_text)
        })
    }

    fn record_for(&self, item: ElementRef<'_>) -> Option<NewsRecord> {
        let s = &self.selectors;
        let blocks = || item.select(&s.content_block);

        let title = blocks().find_map(|block| first_attr(block, &s.title, "title"));
        let link = blocks().find_map(|block| first_attr(block, &s.link, "href"));
        let content = blocks()
            .flat_map(|block| block.select(&s.content))
            .map(|p| p.text().collect::<String>().trim().to_string())
            .find(|text| !text.is_empty());
        let release_time = item
            .select(&s.footer)
            .flat_map(|footer| footer.select(&s.time_icon))
            .find_map(text_after);

        if title.is_none() || link.is_none() || content.is_none() {
            return None;
        }

        Some(NewsRecord {
            title: title.unwrap_or_else(|| NO_TITLE.to_string()),
            link: link.unwrap_or_else(|| NO_LINK.to_string()),
            content: content.unwrap_or_default(),
            release_time: release_time.unwrap_or_else(|| NO_TIME_INFO.to_string()),
        })
    }
}

impl Extractor for FeedExtractor {
    fn extract(&self, markup: &str) -> Result<Vec<NewsRecord>, AppError> {
        let fragment = Html::parse_fragment(markup);
        let records: Vec<NewsRecord> = fragment
            .select(&self.selectors.item)
            .filter(|item| !self.is_ad(*item))
            .filter_map(|item| self.record_for(item))
            .collect();
        tracing::debug!(records = records.len(), bytes = markup.len(), "Extracted feed items");
        Ok(records)
    }
}

fn parse_selector(css: &str) -> Result<Selector, AppError> {
    Selector::parse(css)
        .map_err(|e| AppError::ConfigError(format!("Invalid CSS selector '{css}': {e}")))
}

/// First non-blank value of `attr` among elements under `scope` matching `selector`.
fn first_attr(scope: ElementRef<'_>, selector: &Selector, attr: &str) -> Option<String> {
    scope
        .select(selector)
        .filter_map(|el| el.value().attr(attr))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

/// First non-blank text node that follows `el` among its siblings.
fn text_after(el: ElementRef<'_>) -> Option<String> {
    el.next_siblings()
        .filter_map(|node| node.value().as_text())
        .map(|text| text.trim())
        .find(|text| !text.is_empty())
        .map(str::to_string)
}
