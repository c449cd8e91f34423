//! Shapefile tier reader.

use geo_types::Geometry;
use shapefile::dbase::{self, FieldValue};
use std::path::Path;
use tracing::{debug, info};

use super::{TierError, TierFeature, TierLayer};

/// Read a tier shapefile and its `.dbf` attributes into a layer.
///
/// Columns keep the order of the dbf header. Null shapes become features
/// without geometry.
pub fn read_tier_file(path: &Path, tier: u8) -> Result<TierLayer, TierError> {
    info!("Reading tier {} from {}", tier, path.display());

    let dbf_path = path.with_extension("dbf");
    let table = dbase::Reader::from_path(&dbf_path).map_err(|e| TierError::Attributes {
        path: dbf_path.clone(),
        reason: e.to_string(),
    })?;
    let columns: Vec<String> = table
        .fields()
        .iter()
        .map(|f| f.name().to_string())
        .collect();

    let shapes = shapefile::read(path).map_err(|source| TierError::Shapefile {
        path: path.to_path_buf(),
        source,
    })?;

    let mut layer = TierLayer::new(tier, columns);
    let mut without_geometry = 0usize;

    for (shape, record) in shapes {
        let geometry = match Geometry::<f64>::try_from(shape) {
            Ok(g) => Some(g),
            Err(e) => {
                debug!("Feature without usable geometry: {:?}", e);
                without_geometry += 1;
                None
            }
        };

        let attributes = layer
            .columns
            .iter()
            .map(|name| record.get(name).and_then(field_text))
            .collect();

        layer.features.push(TierFeature::new(attributes, geometry));
    }

    info!(
        "Tier {}: {} features, {} columns ({} without geometry)",
        tier,
        layer.len(),
        layer.columns.len(),
        without_geometry
    );
    Ok(layer)
}

/// Text form of a dbf value; empty values are null
fn field_text(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Character(v) => v.clone(),
        FieldValue::Memo(v) => Some(v.clone()),
        FieldValue::Numeric(v) => v.map(|n| n.to_string()),
        FieldValue::Float(v) => v.map(|n| n.to_string()),
        FieldValue::Logical(v) => v.map(|b| b.to_string()),
        FieldValue::Integer(v) => Some(v.to_string()),
        FieldValue::Double(v) => Some(v.to_string()),
        FieldValue::Currency(v) => Some(v.to_string()),
        FieldValue::Date(v) => v.map(|d| format!("{:04}-{:02}-{:02}", d.year(), d.month(), d.day())),
        other => Some(format!("{:?}", other)),
    }
}
