//! Incremental crawl over the decision listing.

use tracing::{info, warn};
use url::Url;

use super::{
    extract_decision_links, extract_table_data, fetch_page, CrawlError, CursorStore,
    DecisionLink, DecisionRecord, PageSource,
};
use crate::config::CrawlerConfig;

/// Counters for one crawl pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    pub listing_fetched: bool,
    pub new_links: usize,
    pub pages_visited: usize,
    pub pages_skipped: usize,
    pub records: usize,
}

pub struct Crawler {
    base_url: Url,
    listing_url: String,
    cursor: CursorStore,
}

impl Crawler {
    pub fn new(config: &CrawlerConfig) -> Result<Self, CrawlError> {
        let base_url = Url::parse(&config.base_url).map_err(|source| CrawlError::BaseUrl {
            url: config.base_url.clone(),
            source,
        })?;
        Ok(Self::with_parts(
            base_url,
            config.listing_url(),
            CursorStore::new(&config.cursor_file),
        ))
    }

    pub fn with_parts(base_url: Url, listing_url: String, cursor: CursorStore) -> Self {
        Self {
            base_url,
            listing_url,
            cursor,
        }
    }

    pub fn cursor(&self) -> &CursorStore {
        &self.cursor
    }

    /// Crawl new decision pages, logging each record as JSON.
    pub async fn run<S: PageSource + ?Sized>(&self, source: &mut S) -> CrawlSummary {
        self.run_with(source, |_, record| match serde_json::to_string_pretty(record) {
            Ok(json) => info!("{}", json),
            Err(e) => warn!("Could not serialize record: {}", e),
        })
        .await
    }

    /// Crawl new decision pages oldest first, handing every record to `emit`.
    ///
    /// The cursor is advanced after each page, so an interrupted run resumes
    /// just after the last page it finished.
    pub async fn run_with<S, F>(&self, source: &mut S, mut emit: F) -> CrawlSummary
    where
        S: PageSource + ?Sized,
        F: FnMut(&DecisionLink, &DecisionRecord),
    {
        let mut summary = CrawlSummary::default();
        let cursor = self.cursor.load();

        let links = match fetch_page(source, &self.listing_url).await {
            Some(doc) => extract_decision_links(&doc, &self.base_url, cursor.as_deref()),
            None => {
                warn!("Listing page unavailable, nothing to crawl");
                return summary;
            }
        };
        summary.listing_fetched = true;
        summary.new_links = links.len();

        if links.is_empty() {
            info!("No new links to visit since the last check.");
            return summary;
        }

        for link in &links {
            let records = match fetch_page(source, &link.url).await {
                Some(doc) => {
                    summary.pages_visited += 1;
                    extract_table_data(&doc)
                }
                None => {
                    summary.pages_skipped += 1;
                    Vec::new()
                }
            };

            info!(url = %link.url, title = %link.title, records = records.len(), "Processed decision page");
            for record in &records {
                emit(link, record);
            }
            summary.records += records.len();

            self.cursor.save(&link.url);
        }

        info!(
            "Extracted data from {} decision links ({} skipped)",
            summary.pages_visited, summary.pages_skipped
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::browser::tests::StaticPages;

    const BASE: &str = "https://ised-isde.canada.ca";
    const LISTING: &str = "https://ised-isde.canada.ca/listing";

    fn listing_html(paths: &[&str]) -> String {
        let rows: String = paths
            .iter()
            .map(|p| format!(r#"<tr role="row"><td><a href="{}">{}</a></td></tr>"#, p, p))
            .collect();
        format!("<html><body><table><tbody>{}</tbody></table></body></html>", rows)
    }

    fn decision_html(licence: &str) -> String {
        format!(
            r#"<html><body><table class="table-bordered">
                <caption class="bg-primary">Transfer</caption>
                <tr><th>Licence number</th><th>Frequency range (MHz)</th></tr>
                <tr><td>{}</td><td>470/ 512</td></tr>
            </table></body></html>"#,
            licence
        )
    }

    fn crawler(dir: &tempfile::TempDir) -> Crawler {
        Crawler::with_parts(
            Url::parse(BASE).unwrap(),
            LISTING.to_string(),
            CursorStore::new(dir.path().join("last_visited.json")),
        )
    }

    #[tokio::test]
    async fn test_first_run_processes_all_oldest_first() {
        let dir = tempfile::tempdir().unwrap();
        let crawler = crawler(&dir);
        let mut pages = StaticPages::default()
            .with(LISTING, &listing_html(&["/d/2", "/d/1"]))
            .with("https://ised-isde.canada.ca/d/1", &decision_html("L1"))
            .with("https://ised-isde.canada.ca/d/2", &decision_html("L2"));

        let mut seen = Vec::new();
        let summary = crawler
            .run_with(&mut pages, |_, r| {
                seen.push(r.get("Licence number").unwrap_or_default().to_string())
            })
            .await;

        assert_eq!(seen, vec!["L1", "L2"]);
        assert_eq!(summary.pages_visited, 2);
        assert_eq!(summary.records, 2);
        assert_eq!(
            crawler.cursor().load().as_deref(),
            Some("https://ised-isde.canada.ca/d/2")
        );
    }

    #[tokio::test]
    async fn test_second_run_resumes_after_cursor() {
        let dir = tempfile::tempdir().unwrap();
        let crawler = crawler(&dir);
        crawler.cursor().save("https://ised-isde.canada.ca/d/2");

        let mut pages = StaticPages::default()
            .with(LISTING, &listing_html(&["/d/3", "/d/2", "/d/1"]))
            .with("https://ised-isde.canada.ca/d/3", &decision_html("L3"));

        let summary = crawler.run_with(&mut pages, |_, _| {}).await;

        assert_eq!(summary.new_links, 1);
        assert_eq!(
            pages.requested,
            vec![LISTING, "https://ised-isde.canada.ca/d/3"]
        );
        assert_eq!(
            crawler.cursor().load().as_deref(),
            Some("https://ised-isde.canada.ca/d/3")
        );
    }

    #[tokio::test]
    async fn test_failed_page_skipped_and_cursor_advances() {
        let dir = tempfile::tempdir().unwrap();
        let crawler = crawler(&dir);
        let mut pages = StaticPages::default()
            .with(LISTING, &listing_html(&["/d/2", "/d/1"]))
            .with("https://ised-isde.canada.ca/d/2", &decision_html("L2"));

        let summary = crawler.run_with(&mut pages, |_, _| {}).await;

        assert_eq!(summary.pages_skipped, 1);
        assert_eq!(summary.pages_visited, 1);
        assert_eq!(summary.records, 1);
        assert_eq!(
            crawler.cursor().load().as_deref(),
            Some("https://ised-isde.canada.ca/d/2")
        );
    }

    #[tokio::test]
    async fn test_missing_listing_leaves_cursor() {
        let dir = tempfile::tempdir().unwrap();
        let crawler = crawler(&dir);
        crawler.cursor().save("https://ised-isde.canada.ca/d/1");

        let mut pages = StaticPages::default();
        let summary = crawler.run(&mut pages).await;

        assert!(!summary.listing_fetched);
        assert_eq!(
            crawler.cursor().load().as_deref(),
            Some("https://ised-isde.canada.ca/d/1")
        );
    }
}
