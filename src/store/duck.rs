//! DuckDB storage for tier tables.

use std::path::Path;

use duckdb::{Connection, ToSql};
use tracing::{debug, info};

use crate::store::StoreError;
use crate::tiers::TierLayer;

/// Text column holding each row's geometry as WKT
pub const GEOMETRY_COLUMN: &str = "Geometry";

/// Quote an identifier so mixed-case and spaced names survive
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Rows appended to one table by a load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedTable {
    pub table: String,
    pub created: bool,
    pub rows: usize,
}

/// A whole table read back as text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableData {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl TableData {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// DuckDB store for tier tables.
///
/// Each tier lives in `Tier{n}_Areas` with one `VARCHAR` per attribute plus
/// a `Geometry` WKT column. Loads append; nothing is deduplicated, so
/// reloading the same archive duplicates rows unless the table is dropped
/// first.
///
/// The connection closes when the store is dropped.
pub struct DuckStore {
    conn: Connection,
}

impl DuckStore {
    /// Open or create a persistent database at the given path.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        info!("Opened store at {}", path.display());
        Ok(Self { conn })
    }

    /// Open an in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    // ── Catalog ──

    pub fn table_exists(&self, name: &str) -> Result<bool, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT count(*) FROM information_schema.tables WHERE table_name = ?",
            [name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// All tables in the default schema, by name.
    pub fn list_tables(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT table_name FROM information_schema.tables \
             WHERE table_schema = 'main' ORDER BY table_name",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    /// Column names and declared types, in ordinal order.
    pub fn describe_table(&self, name: &str) -> Result<Vec<(String, String)>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT column_name, data_type FROM information_schema.columns \
             WHERE table_schema = 'main' AND table_name = ? ORDER BY ordinal_position",
        )?;
        let columns = stmt
            .query_map([name], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        if columns.is_empty() {
            return Err(StoreError::TableNotFound(name.to_string()));
        }
        Ok(columns)
    }

    pub fn count_rows(&self, name: &str) -> Result<usize, StoreError> {
        let sql = format!("SELECT count(*)::BIGINT FROM {}", quote_ident(name));
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn drop_table(&self, name: &str) -> Result<(), StoreError> {
        self.conn
            .execute_batch(&format!("DROP TABLE IF EXISTS {}", quote_ident(name)))?;
        info!("Dropped table {}", name);
        Ok(())
    }

    // ── Load ──

    /// Create a table of text columns plus the geometry column.
    fn create_text_table(&self, name: &str, columns: &[String]) -> Result<(), StoreError> {
        let schema: Vec<String> = columns
            .iter()
            .map(|c| format!("{} VARCHAR", quote_ident(c)))
            .chain(std::iter::once(format!(
                "{} VARCHAR",
                quote_ident(GEOMETRY_COLUMN)
            )))
            .collect();
        let sql = format!("CREATE TABLE {} ({})", quote_ident(name), schema.join(", "));
        debug!("{}", sql);
        self.conn.execute_batch(&sql)?;
        Ok(())
    }

    /// Append every layer to its `Tier{n}_Areas` table, creating it first if
    /// needed.
    pub fn load_layers(&self, layers: &[TierLayer]) -> Result<Vec<LoadedTable>, StoreError> {
        let mut loaded = Vec::with_capacity(layers.len());

        for layer in layers {
            let table = layer.table_name();
            let created = !self.table_exists(&table)?;
            if created {
                self.create_text_table(&table, &layer.columns)?;
            }

            let mut appender = self.conn.appender(&table)?;
            let mut rows = 0usize;
            for row in layer.stored_rows() {
                let params: Vec<&dyn ToSql> = row.iter().map(|v| v as &dyn ToSql).collect();
                appender.append_row(params.as_slice())?;
                rows += 1;
            }
            appender.flush()?;

            info!(table = %table, rows, created, "Loaded tier table");
            loaded.push(LoadedTable {
                table,
                created,
                rows,
            });
        }

        Ok(loaded)
    }

    // ── Read ──

    /// Read every row of a table, casting each value to text.
    pub fn read_table(&self, name: &str) -> Result<TableData, StoreError> {
        let columns: Vec<String> = self
            .describe_table(name)?
            .into_iter()
            .map(|(column, _)| column)
            .collect();

        let select: Vec<String> = columns
            .iter()
            .map(|c| format!("CAST({} AS VARCHAR)", quote_ident(c)))
            .collect();
        let sql = format!("SELECT {} FROM {}", select.join(", "), quote_ident(name));

        let width = columns.len();
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| {
                (0..width)
                    .map(|i| row.get::<_, Option<String>>(i))
                    .collect::<Result<Vec<_>, _>>()
            })?
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Read {} rows from {}", rows.len(), name);
        Ok(TableData { columns, rows })
    }

    /// Access the underlying DuckDB connection.
    #[cfg(test)]
    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }
}
