//! GeoPackage export of stored tier tables.

mod layer;
mod wkb;
mod writer;

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::store::{DuckStore, StoreError};

pub use layer::{load_table_as_layer, parse_geometry, ExportLayer, ExportRow};
pub use wkb::{encode_gpkg_geometry, geometry_type_name, write_wkb};
pub use writer::export_layer;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("GeoPackage write failed: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Path of the GeoPackage written for `table`
fn output_path(output_dir: &Path, table: &str) -> PathBuf {
    output_dir.join(format!("{}.gpkg", table))
}

/// Export every table in the store to `{output_dir}/{table}.gpkg`.
///
/// Returns the written files in table order.
pub fn export_database(
    store: &DuckStore,
    output_dir: &Path,
    srs_id: i32,
) -> Result<Vec<PathBuf>, ExportError> {
    export_database_with(store, output_dir, srs_id, |_, _| {})
}

/// [`export_database`], calling `on_exported` with each layer and the file
/// it was written to.
pub fn export_database_with<F>(
    store: &DuckStore,
    output_dir: &Path,
    srs_id: i32,
    mut on_exported: F,
) -> Result<Vec<PathBuf>, ExportError>
where
    F: FnMut(&ExportLayer, &Path),
{
    fs::create_dir_all(output_dir)?;

    let tables = store.list_tables()?;
    if tables.is_empty() {
        warn!("Store has no tables to export");
    }

    let mut written = Vec::with_capacity(tables.len());
    for table in &tables {
        let layer = load_table_as_layer(store, table)?;
        let path = output_path(output_dir, table);
        export_layer(&layer, &path, srs_id)?;
        on_exported(&layer, &path);
        written.push(path);
    }

    info!("Exported {} tables to {}", written.len(), output_dir.display());
    Ok(written)
}
