//! Page sources: where rendered HTML comes from.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use scraper::Html;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::{CrawlError, FetchError};
use crate::config::CrawlerConfig;

/// Poll interval while waiting for the document root
const ROOT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Anything that can turn a URL into rendered HTML
#[async_trait]
pub trait PageSource {
    async fn fetch_html(&mut self, url: &str) -> Result<String, FetchError>;
}

/// Fetch and parse a page. Failures are logged and yield `None`.
pub async fn fetch_page<S: PageSource + ?Sized>(source: &mut S, url: &str) -> Option<Html> {
    info!("Fetching page: {}", url);
    match source.fetch_html(url).await {
        Ok(html) => Some(Html::parse_document(&html)),
        Err(e) => {
            error!("Error fetching page: {}", e);
            None
        }
    }
}

/// A single headless Chromium tab driven over CDP.
///
/// Call [`close`](Self::close) when done; the browser process is also killed
/// if the session is dropped without closing.
pub struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    page: Page,
    timeout: Duration,
}

impl BrowserSession {
    pub async fn launch(config: &CrawlerConfig) -> Result<Self, CrawlError> {
        let timeout = config.page_timeout();

        let mut builder = BrowserConfig::builder().request_timeout(timeout);
        if !config.headless {
            builder = builder.with_head();
        }
        let browser_config = builder.build().map_err(CrawlError::Launch)?;

        let (mut browser, mut events) = Browser::launch(browser_config)
            .await
            .map_err(|e| CrawlError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let Err(e) = event {
                    debug!("Browser handler error: {}", e);
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(p) => p,
            Err(e) => {
                let _ = browser.close().await;
                let _ = browser.wait().await;
                handler.abort();
                return Err(CrawlError::Launch(e.to_string()));
            }
        };

        info!("Browser session started");

        Ok(Self {
            browser,
            handler,
            page,
            timeout,
        })
    }

    async fn wait_for_root(&self) -> Result<(), FetchError> {
        loop {
            match self.page.find_element("html").await {
                Ok(_) => return Ok(()),
                Err(e) => {
                    debug!("Document root not ready: {}", e);
                    tokio::time::sleep(ROOT_POLL_INTERVAL).await;
                }
            }
        }
    }

    /// Shut the browser down and wait for its event handler to finish.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("Error closing browser: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            warn!("Error waiting for browser exit: {}", e);
        }
        if tokio::time::timeout(Duration::from_secs(5), &mut self.handler)
            .await
            .is_err()
        {
            self.handler.abort();
        }
        info!("Browser session closed");
    }
}

#[async_trait]
impl PageSource for BrowserSession {
    async fn fetch_html(&mut self, url: &str) -> Result<String, FetchError> {
        let work = async {
            self.page
                .goto(url)
                .await
                .map_err(|e| FetchError::Navigation {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;
            self.wait_for_root().await?;
            self.page
                .content()
                .await
                .map_err(|e| FetchError::Browser(e.to_string()))
        };

        tokio::time::timeout(self.timeout, work)
            .await
            .map_err(|_| FetchError::Timeout {
                url: url.to_string(),
                timeout: self.timeout,
            })?
    }
}
