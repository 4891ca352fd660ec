//! Append-only load-log table.
//!
//! The ingestion orchestrator only inserts. [`LoadLog::recent`] and
//! [`LoadLog::count`] exist for operators (`strata log`) and tests.

use chrono::DateTime;
use duckdb::{Connection, params};
use strata_core::{Layer, LoadLogRecord, LoadStatus, Operation};

use crate::IngestError;
use crate::schemas::qualified;

/// Default load-log table name inside the `bronze` schema.
pub const DEFAULT_LOG_TABLE: &str = "etl_log";

/// Handle on the load-log table. Holds no connection; every method takes the
/// connection (or transaction) to run on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadLog {
    table: String,
}

impl Default for LoadLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_TABLE)
    }
}

impl LoadLog {
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
        }
    }

    /// Table name without schema.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Quoted `"bronze"."<table>"`.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        qualified(Layer::Bronze.as_str(), &self.table)
    }

    /// Create the log table if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::DuckDb`] if the DDL fails (e.g. the `bronze`
    /// schema is missing).
    pub fn ensure(&self, conn: &Connection) -> Result<(), IngestError> {
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {} (
                table_name VARCHAR NOT NULL,
                operation VARCHAR NOT NULL,
                row_count BIGINT,
                duration_seconds DOUBLE,
                status VARCHAR NOT NULL,
                error_message VARCHAR,
                log_timestamp TIMESTAMP NOT NULL
            );",
            self.qualified_name()
        ))?;
        Ok(())
    }

    /// Append one record.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::DuckDb`] if the INSERT fails.
    pub fn append(&self, conn: &Connection, record: &LoadLogRecord) -> Result<(), IngestError> {
        let logged_at = record.logged_at.format("%Y-%m-%d %H:%M:%S%.6f").to_string();
        conn.execute(
            &format!(
                "INSERT INTO {} (table_name, operation, row_count, duration_seconds,
                                 status, error_message, log_timestamp)
                 VALUES (?, ?, ?, ?, ?, ?, CAST(? AS TIMESTAMP))",
                self.qualified_name()
            ),
            params![
                record.table_name,
                record.operation.as_str(),
                record.row_count,
                record.duration_seconds,
                record.status.as_str(),
                record.error_message,
                logged_at,
            ],
        )?;
        Ok(())
    }

    /// Most recent records first, at most `limit`.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::DuckDb`] if the query fails and
    /// [`IngestError::Core`] if a stored status or operation is unknown.
    pub fn recent(
        &self,
        conn: &Connection,
        limit: u32,
    ) -> Result<Vec<LoadLogRecord>, IngestError> {
        let mut stmt = conn.prepare(&format!(
            "SELECT table_name, operation, row_count, duration_seconds, status,
                    error_message, epoch_us(log_timestamp)
             FROM {}
             ORDER BY log_timestamp DESC, rowid DESC
             LIMIT ?",
            self.qualified_name()
        ))?;

        let rows = stmt
            .query_map(params![i64::from(limit)], |row| {
                Ok(RawRecord {
                    table_name: row.get(0)?,
                    operation: row.get(1)?,
                    row_count: row.get(2)?,
                    duration_seconds: row.get(3)?,
                    status: row.get(4)?,
                    error_message: row.get(5)?,
                    logged_at_us: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(RawRecord::into_record).collect()
    }

    /// Number of records, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::DuckDb`] if the query fails.
    pub fn count(
        &self,
        conn: &Connection,
        status: Option<LoadStatus>,
    ) -> Result<i64, IngestError> {
        let count = match status {
            Some(status) => conn.query_row(
                &format!(
                    "SELECT count(*) FROM {} WHERE status = ?",
                    self.qualified_name()
                ),
                params![status.as_str()],
                |row| row.get(0),
            )?,
            None => conn.query_row(
                &format!("SELECT count(*) FROM {}", self.qualified_name()),
                [],
                |row| row.get(0),
            )?,
        };
        Ok(count)
    }
}

/// Row as stored, before enum decoding.
struct RawRecord {
    table_name: String,
    operation: String,
    row_count: Option<i64>,
    duration_seconds: Option<f64>,
    status: String,
    error_message: Option<String>,
    logged_at_us: i64,
}

impl RawRecord {
    fn into_record(self) -> Result<LoadLogRecord, IngestError> {
        let logged_at = DateTime::from_timestamp_micros(self.logged_at_us).ok_or_else(|| {
            strata_core::CoreError::Validation(format!(
                "log timestamp out of range: {}",
                self.logged_at_us
            ))
        })?;
        Ok(LoadLogRecord {
            table_name: self.table_name,
            operation: self.operation.parse::<Operation>()?,
            row_count: self.row_count,
            duration_seconds: self.duration_seconds,
            status: self.status.parse::<LoadStatus>()?,
            error_message: self.error_message,
            logged_at,
        })
    }
}
