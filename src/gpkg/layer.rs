//! Store tables as geometry layers.

use geo_types::Geometry;
use tracing::{info, warn};
use wkt::TryFromWkt;

use super::ExportError;
use crate::store::{DuckStore, GEOMETRY_COLUMN};

#[derive(Debug, Clone, PartialEq)]
pub struct ExportRow {
    pub attributes: Vec<Option<String>>,
    pub geometry: Option<Geometry<f64>>,
}

/// A table read back from the store with its geometry reconstructed
#[derive(Debug, Clone, PartialEq)]
pub struct ExportLayer {
    pub name: String,
    /// Attribute columns, geometry excluded
    pub columns: Vec<String>,
    pub rows: Vec<ExportRow>,
    /// False when the table had no `Geometry` column
    pub has_geometry: bool,
    /// Rows whose WKT could not be parsed
    pub invalid_geometries: usize,
}

impl ExportLayer {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Parse a WKT cell. Blank cells are null without complaint.
pub fn parse_geometry(text: &str) -> Result<Option<Geometry<f64>>, String> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    Geometry::<f64>::try_from_wkt_str(text)
        .map(Some)
        .map_err(|e| e.to_string())
}

/// Read a whole table, turning its `Geometry` column back into shapes.
///
/// Unparseable WKT becomes a null geometry and is logged; the row's
/// attributes are kept.
pub fn load_table_as_layer(store: &DuckStore, name: &str) -> Result<ExportLayer, ExportError> {
    let data = store.read_table(name)?;
    let geometry_idx = data.column_index(GEOMETRY_COLUMN);

    let columns: Vec<String> = data
        .columns
        .iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != geometry_idx)
        .map(|(_, c)| c.clone())
        .collect();

    let mut invalid_geometries = 0usize;
    let mut rows = Vec::with_capacity(data.rows.len());

    for (row_idx, mut values) in data.rows.into_iter().enumerate() {
        let geometry = match geometry_idx {
            Some(idx) => {
                let cell = values.remove(idx);
                match cell.as_deref().map(parse_geometry) {
                    None | Some(Ok(None)) => None,
                    Some(Ok(geometry)) => geometry,
                    Some(Err(reason)) => {
                        warn!(table = %name, row = row_idx, %reason, "Invalid geometry, exporting row without it");
                        invalid_geometries += 1;
                        None
                    }
                }
            }
            None => None,
        };

        rows.push(ExportRow {
            attributes: values,
            geometry,
        });
    }

    info!(
        "Read {} rows from {} ({} invalid geometries)",
        rows.len(),
        name,
        invalid_geometries
    );

    Ok(ExportLayer {
        name: name.to_string(),
        columns,
        rows,
        has_geometry: geometry_idx.is_some(),
        invalid_geometries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_geometry() {
        assert!(matches!(
            parse_geometry("POLYGON((0 0,1 0,1 1,0 0))"),
            Ok(Some(Geometry::Polygon(_)))
        ));
        assert_eq!(parse_geometry("  "), Ok(None));
        assert!(parse_geometry("POLYGON((0 0,1").is_err());
    }

    #[test]
    fn test_invalid_wkt_becomes_null() {
        let store = DuckStore::open_in_memory().unwrap();
        store
            .connection()
            .execute_batch(
                r#"CREATE TABLE "Tier1_Areas" ("Service_Area_Zone_de_service" VARCHAR, "Geometry" VARCHAR);
                   INSERT INTO "Tier1_Areas" VALUES
                     ('1-001', 'POLYGON((0 0,1 0,1 1,0 0))'),
                     ('1-002', 'not wkt'),
                     ('1-003', NULL);"#,
            )
            .unwrap();

        let layer = load_table_as_layer(&store, "Tier1_Areas").unwrap();
        assert!(layer.has_geometry);
        assert_eq!(layer.columns, vec!["Service_Area_Zone_de_service"]);
        assert_eq!(layer.len(), 3);
        assert_eq!(layer.invalid_geometries, 1);
        assert!(layer.rows[0].geometry.is_some());
        assert!(layer.rows[1].geometry.is_none());
        assert_eq!(layer.rows[1].attributes, vec![Some("1-002".to_string())]);
        assert!(layer.rows[2].geometry.is_none());
    }

    #[test]
    fn test_table_without_geometry() {
        let store = DuckStore::open_in_memory().unwrap();
        store
            .connection()
            .execute_batch("CREATE TABLE notes (id INTEGER, body VARCHAR); INSERT INTO notes VALUES (1, 'a');")
            .unwrap();

        let layer = load_table_as_layer(&store, "notes").unwrap();
        assert!(!layer.has_geometry);
        assert_eq!(layer.columns, vec!["id", "body"]);
        assert_eq!(
            layer.rows[0].attributes,
            vec![Some("1".to_string()), Some("a".to_string())]
        );
    }
}
