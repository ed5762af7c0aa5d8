use std::future::Future;

use crate::config::RenderOptions;
use crate::error::AppError;
use crate::models::NewsRecord;
use crate::reporter::CrawlReporter;

/// Renders one feed URL in a browser and returns the item-holder markup.
///
/// Every call is an isolated attempt: implementations must not share a
/// session between calls and must release it on every exit path.
pub trait PageRenderer: Send + Sync + Clone {
    fn render(
        &self,
        url: &str,
        options: &RenderOptions,
        reporter: &dyn CrawlReporter,
    ) -> impl Future<Output = Result<String, AppError>> + Send;
}

/// Turns rendered markup into news records.
///
/// Must be pure: identical markup always yields identical records, in
/// document order.
pub trait Extractor: Send + Sync + Clone + 'static {
    fn extract(&self, markup: &str) -> Result<Vec<NewsRecord>, AppError>;
}
