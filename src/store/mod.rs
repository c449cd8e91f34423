//! Analytical store: DuckDB tables of tier areas with WKT geometry.

mod duck;
mod error;

pub use duck::{quote_ident, DuckStore, LoadedTable, TableData, GEOMETRY_COLUMN};
pub use error::StoreError;
