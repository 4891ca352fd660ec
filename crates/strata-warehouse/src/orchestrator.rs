//! Bronze-layer ingestion.
//!
//! Runs the load manifest in order inside one transaction:
//!
//! ```text
//! begin → for each entry: truncate → file check → (skip | bulk load → log) → commit
//!       ↘ on any error: rollback → failure record → return Err
//! ```
//!
//! A missing source file is not an error; its table is left truncated and no
//! log record is written for it. Success records are written inside the
//! transaction, so a rolled-back batch leaves only its single failure record.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use duckdb::Connection;
use strata_core::{
    BatchOutcome, Layer, LoadLogRecord, LoadManifestEntry, MANIFEST, SourceSystem, TableLoad,
};
use tracing::{debug, error, info, info_span, warn};

use crate::loader::{self, BulkLoad, LoadOptions};
use crate::schemas::qualified;
use crate::{IngestError, LoadLog, SourceLayout, Warehouse, count_rows};

/// Options for one ingest run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOptions {
    /// Write load-log records (success and failure).
    pub log_to_store: bool,
    /// Format options handed to the bulk loader.
    pub load: LoadOptions,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            log_to_store: true,
            load: LoadOptions::default(),
        }
    }
}

/// Per-entry working values, built fresh for every manifest entry.
struct EntryContext<'a> {
    entry: &'a LoadManifestEntry,
    source: PathBuf,
    error_file: PathBuf,
    started: Instant,
}

impl<'a> EntryContext<'a> {
    fn new(entry: &'a LoadManifestEntry, layout: &SourceLayout) -> Self {
        Self {
            entry,
            source: layout.source_path(entry),
            error_file: layout.error_path(entry),
            started: Instant::now(),
        }
    }
}

enum EntryOutcome {
    Loaded(TableLoad),
    Skipped,
}

/// Tables loaded and skipped by a batch, in manifest order.
type BatchLoads = (Vec<TableLoad>, Vec<String>);

impl Warehouse {
    /// Truncate and reload every bronze table from the extracts under
    /// `base_path`, as one transaction.
    ///
    /// `base_path` must contain `source_A/` and `source_B/`; files missing
    /// from them are skipped. The bronze tables and, when
    /// `options.log_to_store` is set, the load-log table must already exist
    /// (see [`Warehouse::bootstrap`]).
    ///
    /// # Errors
    ///
    /// Any failure rolls back every truncate and load of the batch, writes a
    /// single failed record (when logging is enabled), and is returned:
    /// - [`IngestError::InvalidBasePath`] before the transaction opens.
    /// - [`IngestError::Entry`] wrapping the load failure of one table.
    /// - [`IngestError::Transaction`] / [`IngestError::Rollback`] if the
    ///   transaction itself fails.
    pub fn ingest(
        &mut self,
        base_path: impl AsRef<Path>,
        options: &IngestOptions,
    ) -> Result<BatchOutcome, IngestError> {
        self.ingest_manifest(base_path.as_ref(), &MANIFEST, options)
    }

    fn ingest_manifest(
        &mut self,
        base_path: &Path,
        manifest: &[LoadManifestEntry],
        options: &IngestOptions,
    ) -> Result<BatchOutcome, IngestError> {
        let started_at = Utc::now();
        let started = Instant::now();
        info!(
            base_path = %base_path.display(),
            "================ loading bronze layer ================"
        );

        let result = SourceLayout::resolve(base_path)
            .and_then(|layout| self.run_batch(&layout, manifest, options));

        match result {
            Ok((loaded, skipped)) => {
                let outcome = BatchOutcome {
                    started_at,
                    finished_at: Utc::now(),
                    loaded,
                    skipped,
                };
                info!(
                    loaded = outcome.loaded.len(),
                    skipped = outcome.skipped.len(),
                    rows = outcome.total_rows(),
                    duration_secs = started.elapsed().as_secs_f64(),
                    "================ bronze layer loaded ================"
                );
                Ok(outcome)
            }
            Err(err) => {
                error!(
                    error = %err,
                    code = err.code(),
                    state = err.state(),
                    "bronze load failed; batch rolled back"
                );
                if options.log_to_store {
                    let record = LoadLogRecord::batch_failure(err.failure_message());
                    if let Err(log_err) = self.log.append(&self.conn, &record) {
                        error!(error = %log_err, "could not record batch failure");
                    }
                }
                Err(err)
            }
        }
    }

    /// Open the transaction, load every entry, and release the transaction
    /// exactly once: commit on success, explicit rollback on failure.
    fn run_batch(
        &mut self,
        layout: &SourceLayout,
        manifest: &[LoadManifestEntry],
        options: &IngestOptions,
    ) -> Result<BatchLoads, IngestError> {
        debug!(root = %layout.root().display(), "source layout resolved");
        for dir in missing_source_dirs(layout) {
            warn!(
                path = %dir.display(),
                "source directory missing; its tables will be skipped"
            );
        }

        let log = options.log_to_store.then_some(&self.log);
        let tx = self
            .conn
            .transaction()
            .map_err(|source| IngestError::Transaction {
                action: "begin",
                source,
            })?;

        match load_entries(&tx, layout, manifest, &options.load, log) {
            Ok(loads) => {
                tx.commit().map_err(|source| IngestError::Transaction {
                    action: "commit",
                    source,
                })?;
                Ok(loads)
            }
            Err(err) => {
                warn!(error = %err, "rolling back bronze batch");
                match tx.rollback() {
                    Ok(()) => Err(err),
                    Err(source) => Err(IngestError::Rollback {
                        cause: Box::new(err),
                        source,
                    }),
                }
            }
        }
    }
}

fn load_entries(
    conn: &Connection,
    layout: &SourceLayout,
    manifest: &[LoadManifestEntry],
    options: &LoadOptions,
    log: Option<&LoadLog>,
) -> Result<BatchLoads, IngestError> {
    let mut loaded = Vec::with_capacity(manifest.len());
    let mut skipped = Vec::new();

    for entry in manifest {
        let ctx = EntryContext::new(entry, layout);
        let outcome =
            load_entry(conn, &ctx, options, log).map_err(|source| IngestError::Entry {
                table: entry.table.to_string(),
                source: Box::new(source),
            })?;
        match outcome {
            EntryOutcome::Loaded(load) => loaded.push(load),
            EntryOutcome::Skipped => skipped.push(entry.table.to_string()),
        }
    }

    Ok((loaded, skipped))
}

fn load_entry(
    conn: &Connection,
    ctx: &EntryContext<'_>,
    options: &LoadOptions,
    log: Option<&LoadLog>,
) -> Result<EntryOutcome, IngestError> {
    let schema = Layer::Bronze.as_str();
    let table = ctx.entry.table;
    let _span = info_span!("entry", table).entered();

    info!(">> truncating table");
    conn.execute_batch(&format!("TRUNCATE {};", qualified(schema, table)))?;

    if !source_exists(&ctx.source)? {
        info!(path = %ctx.source.display(), "source file absent; skipped");
        return Ok(EntryOutcome::Skipped);
    }

    info!(path = %ctx.source.display(), ">> inserting data");
    let stats = loader::bulk_load(
        conn,
        &BulkLoad {
            schema,
            table,
            source: &ctx.source,
            error_file: &ctx.error_file,
        },
        options,
    )?;

    let rows = count_rows(conn, schema, table)?;
    let duration_seconds = ctx.started.elapsed().as_secs_f64();
    if stats.rejected > 0 {
        warn!(
            rejected = stats.rejected,
            error_file = %ctx.error_file.display(),
            "malformed records captured"
        );
    }
    info!(rows, duration_secs = duration_seconds, ">> load duration");

    if let Some(log) = log {
        log.append(conn, &LoadLogRecord::success(table, rows, duration_seconds))?;
    }

    Ok(EntryOutcome::Loaded(TableLoad {
        table: table.to_string(),
        rows,
        rejected: stats.rejected,
        duration_seconds,
    }))
}

/// Source-system directories that do not exist under the layout root.
fn missing_source_dirs(layout: &SourceLayout) -> Vec<PathBuf> {
    SourceSystem::ALL
        .into_iter()
        .map(|system| layout.source_dir(system))
        .filter(|dir| !dir.is_dir())
        .collect()
}

/// Whether the source is a regular file. Only "not found" counts as absent;
/// other metadata errors (permission denied) fail the entry.
fn source_exists(path: &Path) -> Result<bool, IngestError> {
    match fs::metadata(path) {
        Ok(metadata) => Ok(metadata.is_file()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(IngestError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use strata_core::manifest::entry_for_table;
    use tempfile::TempDir;

    use super::*;

    const CUST_HEADER: &str = "cst_id,cst_key,cst_firstname,cst_lastname,cst_marital_status,cst_gndr,cst_create_date\n";

    fn warehouse() -> Warehouse {
        let warehouse = Warehouse::open_in_memory().unwrap();
        warehouse.bootstrap().unwrap();
        warehouse
    }

    fn write_cust_info(dir: &TempDir, rows: &str) {
        let path = dir.path().join("source_A");
        fs::create_dir_all(&path).unwrap();
        fs::write(path.join("cust_info.csv"), format!("{CUST_HEADER}{rows}")).unwrap();
    }

    #[test]
    fn partial_manifest_only_touches_listed_tables() {
        let mut warehouse = warehouse();
        warehouse
            .conn()
            .execute_batch("INSERT INTO bronze.erp_loc_a101 VALUES ('AW-1', 'DE');")
            .unwrap();
        let dir = TempDir::new().unwrap();
        write_cust_info(&dir, "1,AW1,Jon,Yang,M,M,2025-10-06\n");

        let manifest = [*entry_for_table("crm_cust_info").unwrap()];
        let outcome = warehouse
            .ingest_manifest(dir.path(), &manifest, &IngestOptions::default())
            .unwrap();

        assert_eq!(outcome.loaded.len(), 1);
        assert!(outcome.skipped.is_empty());
        assert_eq!(warehouse.row_count("crm_cust_info").unwrap(), 1);
        assert_eq!(warehouse.row_count("erp_loc_a101").unwrap(), 1);
    }

    #[test]
    fn directory_named_like_source_is_skipped() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("cust_info.csv");
        fs::create_dir_all(&source).unwrap();
        assert!(!source_exists(&source).unwrap());
        assert!(!source_exists(&dir.path().join("absent.csv")).unwrap());
    }

    #[test]
    fn missing_source_dirs_lists_absent_systems() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("source_A")).unwrap();
        let layout = SourceLayout::resolve(dir.path()).unwrap();
        assert_eq!(
            missing_source_dirs(&layout),
            vec![dir.path().join("source_B")]
        );

        fs::create_dir_all(dir.path().join("source_B")).unwrap();
        assert!(missing_source_dirs(&layout).is_empty());
    }

    #[test]
    fn entry_context_paths_come_from_layout() {
        let dir = TempDir::new().unwrap();
        let layout = SourceLayout::resolve(dir.path()).unwrap();
        let entry = entry_for_table("erp_px_cat_g1v2").unwrap();
        let ctx = EntryContext::new(entry, &layout);
        assert_eq!(ctx.source, dir.path().join("source_B").join("PX_CAT_G1V2.csv"));
        assert_eq!(
            ctx.error_file,
            dir.path().join("source_B").join("error_PX_CAT_G1V2.csv")
        );
    }
}
