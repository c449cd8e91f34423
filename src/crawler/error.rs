use std::time::Duration;
use thiserror::Error;

/// Why a page could not be fetched
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("timed out after {timeout:?} waiting for {url}")]
    Timeout { url: String, timeout: Duration },

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("browser error: {0}")]
    Browser(String),
}

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("invalid base url {url}: {source}")]
    BaseUrl {
        url: String,
        source: url::ParseError,
    },

    #[error(transparent)]
    Fetch(#[from] FetchError),
}
