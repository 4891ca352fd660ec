//! # strata-warehouse
//!
//! `DuckDB` storage for the Strata layered warehouse.
//!
//! A single database file holds three schemas:
//! - `bronze`: raw extracts, loaded as-is (type casting only) by [`Warehouse::ingest`]
//! - `silver`: cleansed data (populated downstream)
//! - `gold`: modeled data (populated downstream)
//!
//! The bronze layer is reloaded in full on every ingest: each destination is
//! truncated and bulk-loaded inside one transaction, and every load is
//! recorded in the `bronze.etl_log` table.

pub mod error;
pub mod layout;
pub mod loader;
pub mod log_store;
pub mod orchestrator;
pub mod schemas;

pub use error::IngestError;
pub use layout::SourceLayout;
pub use loader::{LoadOptions, LoadStats};
pub use log_store::LoadLog;
pub use orchestrator::IngestOptions;

use duckdb::Connection;
use strata_core::Layer;

/// Handle on a warehouse database.
///
/// Owns the single connection every ingest runs on; `ingest` takes
/// `&mut self`, so a handle runs at most one batch at a time.
pub struct Warehouse {
    conn: Connection,
    log: LoadLog,
}

impl Warehouse {
    /// Open or create a `DuckDB` warehouse file.
    ///
    /// Does not create any schema; call [`Self::bootstrap`] for that.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::DuckDb`] if the file cannot be opened.
    pub fn open(path: &str) -> Result<Self, IngestError> {
        let conn = Connection::open(path)?;
        Ok(Self::from_connection(conn))
    }

    /// Open an in-memory warehouse (for testing).
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::DuckDb`] if `DuckDB` fails to start.
    pub fn open_in_memory() -> Result<Self, IngestError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self::from_connection(conn))
    }

    /// Wrap an existing connection, logging to the default log table.
    #[must_use]
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn,
            log: LoadLog::default(),
        }
    }

    /// Use a different load-log table inside `bronze`.
    #[must_use]
    pub fn with_log_table(mut self, table: impl Into<String>) -> Self {
        self.log = LoadLog::new(table);
        self
    }

    /// Access the underlying `DuckDB` connection.
    #[must_use]
    pub const fn conn(&self) -> &Connection {
        &self.conn
    }

    /// The load-log table this warehouse writes to.
    #[must_use]
    pub const fn log(&self) -> &LoadLog {
        &self.log
    }

    /// Create the layer schemas, the bronze tables, and the load-log table.
    ///
    /// Idempotent: existing schemas, tables, and rows are left alone.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::DuckDb`] if any DDL statement fails.
    pub fn bootstrap(&self) -> Result<(), IngestError> {
        self.conn.execute_batch(&schemas::bootstrap_ddl())?;
        self.log.ensure(&self.conn)?;
        tracing::info!(
            schemas = ?Layer::ALL.map(Layer::as_str),
            log_table = %self.log.qualified_name(),
            "warehouse bootstrapped"
        );
        Ok(())
    }

    /// Row count of a bronze table.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::DuckDb`] if the table does not exist.
    pub fn row_count(&self, table: &str) -> Result<i64, IngestError> {
        count_rows(&self.conn, Layer::Bronze.as_str(), table)
    }
}

/// `count(*)` of `schema.table`.
pub(crate) fn count_rows(
    conn: &Connection,
    schema: &str,
    table: &str,
) -> Result<i64, IngestError> {
    let count = conn.query_row(
        &format!("SELECT count(*) FROM {}", schemas::qualified(schema, table)),
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}
