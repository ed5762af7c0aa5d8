#[cfg(feature = "browser")]
pub mod browser_renderer;
pub mod extractor;

#[cfg(feature = "browser")]
pub use browser_renderer::BrowserRenderer;
pub use extractor::{FeedExtractor, FeedSelectors};
