//! Decision listing page parsing.

use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::{info, warn};
use url::Url;

use super::DecisionLink;

static ROW_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"tbody tr[role="row"]"#).expect("static selector"));
static LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("static selector"));

/// Text of an element with each text node trimmed, empty nodes dropped,
/// and non-breaking spaces turned into plain spaces.
pub(crate) fn stripped_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<String>()
        .replace('\u{a0}', " ")
}

/// Collect decision links newer than `cursor`, oldest first.
///
/// The listing is ordered newest first, so scanning stops at the first link
/// equal to the cursor. With no cursor every row is returned.
pub fn extract_decision_links(
    document: &Html,
    base_url: &Url,
    cursor: Option<&str>,
) -> Vec<DecisionLink> {
    info!("Extracting decision links...");

    let rows: Vec<ElementRef<'_>> = document.select(&ROW_SELECTOR).collect();
    info!("Found {} rows", rows.len());

    let mut links = Vec::new();

    for row in rows {
        let Some(anchor) = row.select(&LINK_SELECTOR).next() else {
            continue;
        };
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };

        let url = match base_url.join(href.trim()) {
            Ok(u) => u.to_string(),
            Err(e) => {
                warn!("Skipping unresolvable link {:?}: {}", href, e);
                continue;
            }
        };

        if cursor == Some(url.as_str()) {
            info!("Reached the last visited link. Stopping extraction.");
            break;
        }

        links.push(DecisionLink {
            url,
            title: stripped_text(anchor),
        });
    }

    info!("Extracted {} new links", links.len());
    links.reverse();
    links
}
