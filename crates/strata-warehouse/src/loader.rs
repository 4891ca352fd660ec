//! Delimited-file bulk loader.
//!
//! Streams a CSV extract into a destination table through the `DuckDB`
//! [`Appender`](duckdb::Appender). Records whose shape does not match the
//! table are diverted to an error-capture file instead of aborting the load.
//! Values are appended as text and cast by `DuckDB` to the declared column
//! types, so a value that cannot be coerced fails the whole load.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use csv::{ByteRecord, ReaderBuilder, Writer, WriterBuilder};
use duckdb::{Connection, appender_params_from_iter, params};
use tracing::{debug, warn};

use crate::IngestError;

/// Malformed records tolerated per file before the load fails.
pub const DEFAULT_MAX_ERRORS: u64 = 10;

/// Format options for a bulk load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Field delimiter.
    pub delimiter: u8,
    /// Whether the first record is a header to skip.
    pub has_header: bool,
    /// Malformed records tolerated before the load fails.
    pub max_errors: u64,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_header: true,
            max_errors: DEFAULT_MAX_ERRORS,
        }
    }
}

/// One bulk-load target: destination table plus source and error-capture files.
#[derive(Debug, Clone, Copy)]
pub struct BulkLoad<'a> {
    pub schema: &'a str,
    pub table: &'a str,
    pub source: &'a Path,
    pub error_file: &'a Path,
}

/// Counters for a finished bulk load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Records handed to the appender.
    pub appended: u64,
    /// Records written to the error-capture file.
    pub rejected: u64,
}

/// Load `target.source` into `target.schema.target.table`.
///
/// The destination is not truncated here. A stale error-capture file from an
/// earlier run is removed before reading; a new one is only created when a
/// record is rejected.
///
/// # Errors
///
/// - [`IngestError::UnknownTable`] if the destination has no columns.
/// - [`IngestError::Csv`] / [`IngestError::Io`] if the source cannot be read
///   or the error-capture file cannot be written.
/// - [`IngestError::DuckDb`] if `DuckDB` rejects a value (e.g. a failed cast).
/// - [`IngestError::TooManyRejects`] if more than `options.max_errors`
///   records were malformed.
pub fn bulk_load(
    conn: &Connection,
    target: &BulkLoad<'_>,
    options: &LoadOptions,
) -> Result<LoadStats, IngestError> {
    let columns = column_count(conn, target.schema, target.table)?;
    remove_stale(target.error_file)?;

    let mut reader = ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(options.has_header)
        .flexible(true)
        .from_path(target.source)
        .map_err(|source| IngestError::Csv {
            path: target.source.to_path_buf(),
            source,
        })?;

    let mut appender = conn.appender_to_db(target.table, target.schema)?;
    let mut rejects = RejectSink::new(target.error_file, options.delimiter);
    let mut stats = LoadStats::default();
    let mut record = ByteRecord::new();

    loop {
        let more = reader
            .read_byte_record(&mut record)
            .map_err(|source| IngestError::Csv {
                path: target.source.to_path_buf(),
                source,
            })?;
        if !more {
            break;
        }

        match text_fields(&record, columns) {
            Ok(values) => {
                appender.append_row(appender_params_from_iter(values))?;
                stats.appended += 1;
            }
            Err(reason) => {
                let line = record.position().map_or(0, csv::Position::line);
                warn!(
                    table = target.table,
                    line,
                    reason = %reason,
                    "malformed record diverted to error file"
                );
                rejects.write(&record)?;
                stats.rejected += 1;
            }
        }
    }

    appender.flush()?;
    rejects.finish()?;

    debug!(
        table = target.table,
        appended = stats.appended,
        rejected = stats.rejected,
        "bulk load finished"
    );

    if stats.rejected > options.max_errors {
        return Err(IngestError::TooManyRejects {
            table: target.table.to_string(),
            rejected: stats.rejected,
            max_errors: options.max_errors,
        });
    }

    Ok(stats)
}

/// Number of columns declared on `schema.table`.
fn column_count(conn: &Connection, schema: &str, table: &str) -> Result<usize, IngestError> {
    let count: i64 = conn.query_row(
        "SELECT count(*) FROM information_schema.columns
         WHERE table_schema = ? AND table_name = ?",
        params![schema, table],
        |row| row.get(0),
    )?;
    match usize::try_from(count) {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(IngestError::UnknownTable {
            schema: schema.to_string(),
            table: table.to_string(),
        }),
    }
}

/// Borrow every field as text, mapping empty fields to `NULL`.
///
/// Returns the rejection reason for records with the wrong field count or
/// invalid UTF-8.
fn text_fields(record: &ByteRecord, columns: usize) -> Result<Vec<Option<&str>>, String> {
    if record.len() != columns {
        return Err(format!("expected {columns} fields, found {}", record.len()));
    }
    record
        .iter()
        .enumerate()
        .map(|(index, field)| match std::str::from_utf8(field) {
            Ok("") => Ok(None),
            Ok(text) => Ok(Some(text)),
            Err(_) => Err(format!("field {} is not valid UTF-8", index + 1)),
        })
        .collect()
}

fn remove_stale(path: &Path) -> Result<(), IngestError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(IngestError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Error-capture file, opened on the first rejected record.
struct RejectSink<'a> {
    path: &'a Path,
    delimiter: u8,
    writer: Option<Writer<File>>,
}

impl<'a> RejectSink<'a> {
    const fn new(path: &'a Path, delimiter: u8) -> Self {
        Self {
            path,
            delimiter,
            writer: None,
        }
    }

    fn write(&mut self, record: &ByteRecord) -> Result<(), IngestError> {
        let path = self.path;
        let csv_error = |source| IngestError::Csv {
            path: path.to_path_buf(),
            source,
        };

        if self.writer.is_none() {
            let writer = WriterBuilder::new()
                .delimiter(self.delimiter)
                .flexible(true)
                .from_path(path)
                .map_err(csv_error)?;
            self.writer = Some(writer);
        }
        if let Some(writer) = self.writer.as_mut() {
            writer.write_byte_record(record).map_err(csv_error)?;
        }
        Ok(())
    }

    fn finish(self) -> Result<(), IngestError> {
        if let Some(mut writer) = self.writer {
            writer.flush().map_err(|source| IngestError::Io {
                path: self.path.to_path_buf(),
                source,
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    fn conn_with_table() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE SCHEMA bronze;
             CREATE TABLE bronze.people (id INTEGER, name VARCHAR, born DATE);",
        )
        .unwrap();
        conn
    }

    fn load(
        conn: &Connection,
        dir: &TempDir,
        body: &str,
        options: &LoadOptions,
    ) -> Result<LoadStats, IngestError> {
        let source = dir.path().join("people.csv");
        fs::write(&source, body).unwrap();
        let error_file = dir.path().join("error_people.csv");
        bulk_load(
            conn,
            &BulkLoad {
                schema: "bronze",
                table: "people",
                source: &source,
                error_file: &error_file,
            },
            options,
        )
    }

    fn count(conn: &Connection) -> i64 {
        conn.query_row("SELECT count(*) FROM bronze.people", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn header_is_skipped_and_rows_appended() {
        let conn = conn_with_table();
        let dir = TempDir::new().unwrap();
        let stats = load(
            &conn,
            &dir,
            "id,name,born\n1,Ada,1815-12-10\n2,Alan,1912-06-23\n",
            &LoadOptions::default(),
        )
        .unwrap();

        assert_eq!(stats, LoadStats { appended: 2, rejected: 0 });
        assert_eq!(count(&conn), 2);
        assert!(!dir.path().join("error_people.csv").exists());
    }

    #[test]
    fn crlf_terminators_are_accepted() {
        let conn = conn_with_table();
        let dir = TempDir::new().unwrap();
        let body = "id,name,born\r\n1,Ada,1815-12-10\r\n";
        let stats = load(&conn, &dir, body, &LoadOptions::default()).unwrap();
        assert_eq!(stats.appended, 1);
        let name: String = conn
            .query_row("SELECT name FROM bronze.people", [], |row| row.get(0))
            .unwrap();
        assert_eq!(name, "Ada");
    }

    #[test]
    fn empty_fields_become_null() {
        let conn = conn_with_table();
        let dir = TempDir::new().unwrap();
        load(&conn, &dir, "id,name,born\n7,,\n", &LoadOptions::default()).unwrap();

        let (name, born): (Option<String>, Option<String>) = conn
            .query_row(
                "SELECT name, CAST(born AS VARCHAR) FROM bronze.people WHERE id = 7",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert!(name.is_none());
        assert!(born.is_none());
    }

    #[test]
    fn wrong_field_count_goes_to_error_file() {
        let conn = conn_with_table();
        let dir = TempDir::new().unwrap();
        let stats = load(
            &conn,
            &dir,
            "id,name,born\n1,Ada,1815-12-10\n2,Alan\n3,Grace,1906-12-09,extra\n",
            &LoadOptions::default(),
        )
        .unwrap();

        assert_eq!(stats, LoadStats { appended: 1, rejected: 2 });
        assert_eq!(count(&conn), 1);
        let captured = fs::read_to_string(dir.path().join("error_people.csv")).unwrap();
        assert_eq!(captured, "2,Alan\n3,Grace,1906-12-09,extra\n");
    }

    #[test]
    fn too_many_rejects_fails_the_load() {
        let conn = conn_with_table();
        let dir = TempDir::new().unwrap();
        let options = LoadOptions {
            max_errors: 0,
            ..LoadOptions::default()
        };
        let err = load(&conn, &dir, "id,name,born\n1,Ada\n", &options).unwrap_err();

        assert!(matches!(
            err,
            IngestError::TooManyRejects { rejected: 1, max_errors: 0, .. }
        ));
        assert!(dir.path().join("error_people.csv").exists());
    }

    #[test]
    fn uncoercible_value_is_a_load_failure() {
        let conn = conn_with_table();
        let dir = TempDir::new().unwrap();
        let body = "id,name,born\nabc,Ada,1815-12-10\n";
        let err = load(&conn, &dir, body, &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, IngestError::DuckDb(_)), "{err}");
    }

    #[test]
    fn stale_error_file_is_removed() {
        let conn = conn_with_table();
        let dir = TempDir::new().unwrap();
        let error_file = dir.path().join("error_people.csv");
        fs::write(&error_file, "old,reject\n").unwrap();

        let body = "id,name,born\n1,Ada,1815-12-10\n";
        load(&conn, &dir, body, &LoadOptions::default()).unwrap();
        assert!(!error_file.exists());
    }

    #[test]
    fn custom_delimiter() {
        let conn = conn_with_table();
        let dir = TempDir::new().unwrap();
        let options = LoadOptions {
            delimiter: b';',
            ..LoadOptions::default()
        };
        let stats = load(&conn, &dir, "id;name;born\n1;Ada;1815-12-10\n", &options).unwrap();
        assert_eq!(stats.appended, 1);
    }

    #[test]
    fn missing_table_is_reported() {
        let conn = Connection::open_in_memory().unwrap();
        let dir = TempDir::new().unwrap();
        let err = load(&conn, &dir, "id\n1\n", &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, IngestError::UnknownTable { .. }));
    }
}
