//! GeoPackage file writer.

use geo::BoundingRect;
use geo_types::Rect;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use super::wkb::{encode_gpkg_geometry, geometry_type_name};
use super::{ExportError, ExportLayer};
use crate::store::{quote_ident, GEOMETRY_COLUMN};

/// `GPKG` as a big-endian integer
const GPKG_APPLICATION_ID: i32 = 0x4750_4B47;
/// GeoPackage 1.3.0
const GPKG_USER_VERSION: i32 = 10300;

const WGS84_DEFINITION: &str = r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0,AUTHORITY["EPSG","8901"]],UNIT["degree",0.0174532925199433,AUTHORITY["EPSG","9122"]],AUTHORITY["EPSG","4326"]]"#;

const CORE_TABLES: &str = r#"
CREATE TABLE gpkg_spatial_ref_sys (
    srs_name TEXT NOT NULL,
    srs_id INTEGER NOT NULL PRIMARY KEY,
    organization TEXT NOT NULL,
    organization_coordsys_id INTEGER NOT NULL,
    definition TEXT NOT NULL,
    description TEXT
);
CREATE TABLE gpkg_contents (
    table_name TEXT NOT NULL PRIMARY KEY,
    data_type TEXT NOT NULL,
    identifier TEXT UNIQUE,
    description TEXT DEFAULT '',
    last_change DATETIME NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now')),
    min_x DOUBLE,
    min_y DOUBLE,
    max_x DOUBLE,
    max_y DOUBLE,
    srs_id INTEGER,
    CONSTRAINT fk_gc_r_srs_id FOREIGN KEY (srs_id) REFERENCES gpkg_spatial_ref_sys(srs_id)
);
CREATE TABLE gpkg_geometry_columns (
    table_name TEXT NOT NULL,
    column_name TEXT NOT NULL,
    geometry_type_name TEXT NOT NULL,
    srs_id INTEGER NOT NULL,
    z TINYINT NOT NULL,
    m TINYINT NOT NULL,
    CONSTRAINT pk_geom_cols PRIMARY KEY (table_name, column_name),
    CONSTRAINT uk_gc_table_name UNIQUE (table_name),
    CONSTRAINT fk_gc_tn FOREIGN KEY (table_name) REFERENCES gpkg_contents(table_name),
    CONSTRAINT fk_gc_srs FOREIGN KEY (srs_id) REFERENCES gpkg_spatial_ref_sys(srs_id)
);
"#;

fn init_core_tables(conn: &Connection) -> Result<(), ExportError> {
    conn.pragma_update(None, "application_id", GPKG_APPLICATION_ID)?;
    conn.pragma_update(None, "user_version", GPKG_USER_VERSION)?;
    conn.execute_batch(CORE_TABLES)?;

    let mut insert = conn.prepare(
        "INSERT INTO gpkg_spatial_ref_sys \
         (srs_name, srs_id, organization, organization_coordsys_id, definition, description) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    insert.execute(params![
        "Undefined cartesian SRS",
        -1,
        "NONE",
        -1,
        "undefined",
        "undefined cartesian coordinate reference system"
    ])?;
    insert.execute(params![
        "Undefined geographic SRS",
        0,
        "NONE",
        0,
        "undefined",
        "undefined geographic coordinate reference system"
    ])?;
    insert.execute(params![
        "WGS 84 geodetic",
        4326,
        "EPSG",
        4326,
        WGS84_DEFINITION,
        "longitude/latitude coordinates in decimal degrees on the WGS 84 spheroid"
    ])?;
    Ok(())
}

/// Smallest rectangle covering every geometry in the layer
fn layer_extent(layer: &ExportLayer) -> Option<Rect<f64>> {
    layer
        .rows
        .iter()
        .filter_map(|r| r.geometry.as_ref()?.bounding_rect())
        .reduce(|a, b| {
            Rect::new(
                (a.min().x.min(b.min().x), a.min().y.min(b.min().y)),
                (a.max().x.max(b.max().x), a.max().y.max(b.max().y)),
            )
        })
}

/// Column type for `gpkg_geometry_columns`: the shared type when every
/// geometry agrees, otherwise the generic `GEOMETRY`
fn layer_geometry_type(layer: &ExportLayer) -> &'static str {
    let mut kinds = layer
        .rows
        .iter()
        .filter_map(|r| r.geometry.as_ref().map(geometry_type_name));
    match kinds.next() {
        Some(first) if kinds.all(|k| k == first) => first,
        _ => "GEOMETRY",
    }
}

/// Write `layer` as a single-table GeoPackage at `path`, replacing any
/// existing file.
pub fn export_layer(layer: &ExportLayer, path: &Path, srs_id: i32) -> Result<(), ExportError> {
    if path.exists() {
        fs::remove_file(path)?;
    }

    let mut conn = Connection::open(path)?;
    init_core_tables(&conn)?;

    let table = quote_ident(&layer.name);
    let mut columns_sql = vec!["fid INTEGER PRIMARY KEY AUTOINCREMENT".to_string()];
    if layer.has_geometry {
        columns_sql.push(format!("{} GEOMETRY", quote_ident(GEOMETRY_COLUMN)));
    }
    columns_sql.extend(layer.columns.iter().map(|c| format!("{} TEXT", quote_ident(c))));

    let mut insert_columns: Vec<String> = Vec::new();
    if layer.has_geometry {
        insert_columns.push(quote_ident(GEOMETRY_COLUMN));
    }
    insert_columns.extend(layer.columns.iter().map(|c| quote_ident(c)));
    let placeholders: Vec<String> = (1..=insert_columns.len()).map(|i| format!("?{}", i)).collect();

    let tx = conn.transaction()?;
    tx.execute_batch(&format!("CREATE TABLE {} ({})", table, columns_sql.join(", ")))?;

    {
        let mut insert = tx.prepare(&format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            insert_columns.join(", "),
            placeholders.join(", ")
        ))?;

        for row in &layer.rows {
            let mut values: Vec<Value> = Vec::with_capacity(insert_columns.len());
            if layer.has_geometry {
                values.push(match &row.geometry {
                    Some(g) => Value::Blob(encode_gpkg_geometry(g, srs_id)?),
                    None => Value::Null,
                });
            }
            values.extend(
                layer
                    .columns
                    .iter()
                    .enumerate()
                    .map(|(i, _)| match row.attributes.get(i).cloned().flatten() {
                        Some(text) => Value::Text(text),
                        None => Value::Null,
                    }),
            );
            insert.execute(params_from_iter(values))?;
        }
    }

    if layer.has_geometry {
        let extent = layer_extent(layer);
        tx.execute(
            "INSERT INTO gpkg_contents \
             (table_name, data_type, identifier, min_x, min_y, max_x, max_y, srs_id) \
             VALUES (?1, 'features', ?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                layer.name,
                extent.map(|r| r.min().x),
                extent.map(|r| r.min().y),
                extent.map(|r| r.max().x),
                extent.map(|r| r.max().y),
                srs_id
            ],
        )?;
        tx.execute(
            "INSERT INTO gpkg_geometry_columns \
             (table_name, column_name, geometry_type_name, srs_id, z, m) \
             VALUES (?1, ?2, ?3, ?4, 0, 0)",
            params![layer.name, GEOMETRY_COLUMN, layer_geometry_type(layer), srs_id],
        )?;
    } else {
        tx.execute(
            "INSERT INTO gpkg_contents (table_name, data_type, identifier) \
             VALUES (?1, 'attributes', ?1)",
            params![layer.name],
        )?;
    }

    tx.commit()?;
    debug!("Wrote {} features to {}", layer.len(), path.display());
    info!("Exported to {}", path.display());
    Ok(())
}
