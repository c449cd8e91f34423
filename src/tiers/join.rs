//! Left spatial join of a tier against its parent tier.

use geo::Intersects;
use rstar::{RTree, RTreeObject, AABB};
use tracing::{debug, info};

use super::{TierError, TierFeature, TierLayer};

/// Parent feature envelope for R-tree candidate lookup
struct IndexedParent {
    index: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedParent {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl IndexedParent {
    fn new(index: usize, feature: &TierFeature) -> Option<Self> {
        let (min_x, min_y, max_x, max_y) = feature.bbox()?;
        Some(Self {
            index,
            envelope: AABB::from_corners([min_x, min_y], [max_x, max_y]),
        })
    }
}

/// Name of the column holding the parent's area identifier
fn parent_column_name(parent_tier: u8, area_id_column: &str) -> String {
    format!("Tier{}_{}", parent_tier, area_id_column)
}

/// Annotate every `child` feature with the area id of each intersecting
/// `parent` feature.
///
/// A child with several matches is repeated once per match, in parent order;
/// a child with none is kept once with a null parent id.
pub fn spatial_join(
    child: TierLayer,
    parent: &TierLayer,
    area_id_column: &str,
) -> Result<TierLayer, TierError> {
    let parent_idx = parent
        .resolve_column(area_id_column)
        .ok_or_else(|| TierError::MissingColumn {
            tier: parent.tier,
            column: area_id_column.to_string(),
        })?;

    let tree = RTree::bulk_load(
        parent
            .features
            .iter()
            .enumerate()
            .filter_map(|(i, f)| IndexedParent::new(i, f))
            .collect(),
    );

    let mut columns = child.columns;
    let width = columns.len();
    columns.push(parent_column_name(parent.tier, &parent.columns[parent_idx]));

    let mut joined = TierLayer::new(child.tier, columns);
    let mut unmatched = 0usize;

    for feature in child.features {
        let matches = match (&feature.geometry, feature.bbox()) {
            (Some(geometry), Some((min_x, min_y, max_x, max_y))) => {
                let query = AABB::from_corners([min_x, min_y], [max_x, max_y]);
                let mut hits: Vec<usize> = tree
                    .locate_in_envelope_intersecting(&query)
                    .filter(|p| {
                        parent.features[p.index]
                            .geometry
                            .as_ref()
                            .is_some_and(|pg| geometry.intersects(pg))
                    })
                    .map(|p| p.index)
                    .collect();
                hits.sort_unstable();
                hits
            }
            _ => Vec::new(),
        };

        let mut attributes = feature.attributes;
        attributes.resize(width, None);

        if matches.is_empty() {
            unmatched += 1;
            attributes.push(None);
            joined.features.push(TierFeature::new(attributes, feature.geometry));
            continue;
        }

        for idx in matches {
            let parent_id = parent.features[idx]
                .attributes
                .get(parent_idx)
                .cloned()
                .flatten();
            let mut row = attributes.clone();
            row.push(parent_id);
            joined
                .features
                .push(TierFeature::new(row, feature.geometry.clone()));
        }
    }

    debug!("{} tier {} features had no parent", unmatched, joined.tier);
    info!(
        "Joined tier {} against tier {}: {} rows ({} without parent)",
        joined.tier,
        parent.tier,
        joined.len(),
        unmatched
    );

    Ok(joined)
}
