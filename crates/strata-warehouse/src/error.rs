//! Ingestion error types.

use std::path::PathBuf;

use thiserror::Error;

/// Code reported for DuckDB errors that carry no engine code.
const GENERIC_DUCKDB_CODE: i32 = 50_000;

/// Errors that can occur while bootstrapping or loading the warehouse.
///
/// Everything except [`IngestError::Transaction`] and [`IngestError::Rollback`]
/// is a load failure; those two mean the transaction machinery itself broke.
#[derive(Debug, Error)]
pub enum IngestError {
    /// `DuckDB` operation failed (truncate, append, cast, count).
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    /// The ingestion base path is missing, unreadable, or not a directory.
    #[error("Base path '{}' is not a readable directory: {reason}", path.display())]
    InvalidBasePath { path: PathBuf, reason: String },

    /// Filesystem error on a source or error-capture file.
    #[error("IO error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The delimited reader or the error-capture writer failed.
    #[error("CSV error on '{}': {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The destination table has no columns in `information_schema`.
    #[error("Destination table {schema}.{table} does not exist")]
    UnknownTable { schema: String, table: String },

    /// More malformed records than the loader tolerates.
    #[error("{table}: {rejected} malformed records exceed the limit of {max_errors}")]
    TooManyRejects {
        table: String,
        rejected: u64,
        max_errors: u64,
    },

    /// A load-log row could not be decoded.
    #[error("Invalid load-log row: {0}")]
    Core(#[from] strata_core::CoreError),

    /// Failure while processing one manifest entry.
    #[error("Loading {table} failed: {source}")]
    Entry {
        table: String,
        #[source]
        source: Box<IngestError>,
    },

    /// Beginning or committing the batch transaction failed.
    #[error("Transaction {action} failed: {source}")]
    Transaction {
        action: &'static str,
        #[source]
        source: duckdb::Error,
    },

    /// Rolling back after a failure failed too.
    #[error("Rollback failed ({source}) after: {cause}")]
    Rollback {
        cause: Box<IngestError>,
        #[source]
        source: duckdb::Error,
    },
}

impl IngestError {
    /// Numeric error code written to the failure log record.
    ///
    /// `DuckDB` failures report the engine's extended code; IO failures the OS
    /// error number; everything else a fixed code in the 50000 range.
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            Self::DuckDb(source)
            | Self::Transaction { source, .. }
            | Self::Rollback { source, .. } => duckdb_code(source),
            Self::InvalidBasePath { .. } => 50_001,
            Self::Io { source, .. } => source.raw_os_error().unwrap_or(50_002),
            Self::Csv { .. } => 50_003,
            Self::UnknownTable { .. } => 50_004,
            Self::TooManyRejects { .. } => 50_005,
            Self::Core(_) => 50_006,
            Self::Entry { source, .. } => source.code(),
        }
    }

    /// Short state code written to the failure log record.
    #[must_use]
    pub fn state(&self) -> &'static str {
        match self {
            Self::DuckDb(_) => "DUCKDB",
            Self::InvalidBasePath { .. } => "PATH",
            Self::Io { .. } => "IO",
            Self::Csv { .. } => "CSV",
            Self::UnknownTable { .. } => "TABLE",
            Self::TooManyRejects { .. } => "REJECTS",
            Self::Core(_) => "DECODE",
            Self::Transaction { .. } => "TXN",
            Self::Rollback { .. } => "ROLLBACK",
            Self::Entry { source, .. } => source.state(),
        }
    }

    /// Whether the transaction machinery failed, as opposed to a load.
    #[must_use]
    pub fn is_transaction_failure(&self) -> bool {
        match self {
            Self::Transaction { .. } | Self::Rollback { .. } => true,
            Self::Entry { source, .. } => source.is_transaction_failure(),
            _ => false,
        }
    }

    /// Table the failure happened on, if it happened inside an entry.
    #[must_use]
    pub fn table(&self) -> Option<&str> {
        match self {
            Self::Entry { table, .. } | Self::TooManyRejects { table, .. } => {
                Some(table.as_str())
            }
            Self::Rollback { cause, .. } => cause.table(),
            _ => None,
        }
    }

    /// Message recorded on the batch failure row: the error text plus its
    /// numeric code and state.
    #[must_use]
    pub fn failure_message(&self) -> String {
        format!("{self} (code {}, state {})", self.code(), self.state())
    }
}

fn duckdb_code(error: &duckdb::Error) -> i32 {
    match error {
        duckdb::Error::DuckDBFailure(failure, _) => failure.extended_code as i32,
        _ => GENERIC_DUCKDB_CODE,
    }
}
