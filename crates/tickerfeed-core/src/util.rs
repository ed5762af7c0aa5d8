use url::Url;

use crate::error::AppError;

/// Default feed page for a ticker.
pub const DEFAULT_URL_TEMPLATE: &str = "https://finance.yahoo.com/quote/{ticker}/latest-news/";

/// Build a feed URL by substituting `{ticker}` into `template`.
///
/// The ticker is trimmed and uppercased.
/// Example: `feed_url(DEFAULT_URL_TEMPLATE, "tsla")` →
/// `"https://finance.yahoo.com/quote/TSLA/latest-news/"`
pub fn feed_url(template: &str, ticker: &str) -> Result<String, AppError> {
    let ticker = ticker.trim();
    if ticker.is_empty() {
        return Err(AppError::ConfigError("ticker must not be empty".into()));
    }
    if !template.contains("{ticker}") {
        return Err(AppError::ConfigError(format!(
            "URL template '{template}' has no {{ticker}} placeholder"
        )));
    }

    let raw = template.replace("{ticker}", &ticker.to_uppercase());
    let url = Url::parse(&raw)
        .map_err(|e| AppError::ConfigError(format!("Invalid feed URL '{raw}': {e}")))?;
    Ok(url.to_string())
}

/// Build feed URLs for every ticker, preserving order.
pub fn feed_urls<S: AsRef<str>>(template: &str, tickers: &[S]) -> Result<Vec<String>, AppError> {
    tickers
        .iter()
        .map(|t| feed_url(template, t.as_ref()))
        .collect()
}
