//! Decision page data table extraction.

use scraper::{Html, Selector};
use std::sync::LazyLock;
use tracing::debug;

use super::format_frequency_range;
use super::listing::stripped_text;
use super::DecisionRecord;

pub const UNKNOWN_TABLE_TITLE: &str = "Unknown Table Title";
pub const TABLE_TITLE_FIELD: &str = "Table Title";
pub const TIER_NUMBER_FIELD: &str = "Tier number";
pub const GEOGRAPHIC_AREA_FIELD: &str = "Geographic area of the licence";

/// Fields holding raw frequency ranges
const FREQUENCY_FIELDS: [&str; 3] = [
    "Frequency range (MHz)",
    "Frequency range (MHz) of the primary licence",
    "Frequency range (MHz) of the subordinate licence",
];

/// Fields combining tier number and geographic area
const TIER_AREA_FIELDS: [&str; 3] = [
    "Tier number and geographic area of the licence",
    "Tier number and geographic area of the subordinate licence",
    "Tier number and geographic area of the primary licence",
];

static TABLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table.table-bordered").expect("static selector"));
static CAPTION_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("caption.bg-primary").expect("static selector"));
static ROW_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("static selector"));
static HEADER_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("th").expect("static selector"));
static CELL_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td").expect("static selector"));

/// Extract one record per data row of the page's bordered table.
///
/// The first row supplies the headers. Returns nothing if the page has no
/// such table.
pub fn extract_table_data(document: &Html) -> Vec<DecisionRecord> {
    let Some(table) = document.select(&TABLE_SELECTOR).next() else {
        debug!("No data table found");
        return Vec::new();
    };

    let title = table
        .select(&CAPTION_SELECTOR)
        .next()
        .map(stripped_text)
        .unwrap_or_else(|| UNKNOWN_TABLE_TITLE.to_string());

    let mut rows = table.select(&ROW_SELECTOR);
    let Some(header_row) = rows.next() else {
        return Vec::new();
    };
    let headers: Vec<String> = header_row.select(&HEADER_SELECTOR).map(stripped_text).collect();

    rows.map(|row| {
        let mut record = DecisionRecord::new();
        for (header, cell) in headers.iter().zip(row.select(&CELL_SELECTOR)) {
            record.insert(header.as_str(), stripped_text(cell));
        }
        normalize_record(&mut record, &title);
        record
    })
    .collect()
}

/// Rewrite frequency fields, split combined tier/area fields and stamp the
/// table title.
fn normalize_record(record: &mut DecisionRecord, table_title: &str) {
    for field in FREQUENCY_FIELDS {
        if let Some(raw) = record.get(field) {
            let formatted = format_frequency_range(raw);
            record.insert(field, formatted);
        }
    }

    for field in TIER_AREA_FIELDS {
        if let Some(combined) = record.remove(field) {
            // Literal first-space split
            if let Some((tier, area)) = combined.split_once(' ') {
                record.insert(TIER_NUMBER_FIELD, tier);
                record.insert(GEOGRAPHIC_AREA_FIELD, area);
            }
        }
    }

    record.insert(TABLE_TITLE_FIELD, table_title);
}
