//! Decision page crawler.
//!
//! Lists decision pages, skips the ones already seen according to a persisted
//! cursor, and extracts each new page's data table into records.

mod browser;
mod cursor;
mod error;
mod frequency;
mod listing;
mod record;
mod run;
mod table;

pub use browser::{fetch_page, BrowserSession, PageSource};
pub use cursor::CursorStore;
pub use error::{CrawlError, FetchError};
pub use frequency::format_frequency_range;
pub use listing::extract_decision_links;
pub use record::{DecisionLink, DecisionRecord};
pub use run::{CrawlSummary, Crawler};
pub use table::{extract_table_data, UNKNOWN_TABLE_TITLE};
