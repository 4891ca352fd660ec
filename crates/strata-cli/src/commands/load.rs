use std::path::PathBuf;

use anyhow::Context;
use serde::Serialize;
use strata_config::IngestConfig;
use strata_core::BatchOutcome;
use strata_warehouse::{IngestError, IngestOptions, LoadOptions};

use crate::cli::root_commands::LoadArgs;
use crate::cli::{GlobalFlags, OutputFormat};
use crate::context::AppContext;
use crate::output::output;
use crate::progress::Progress;

#[derive(Debug, Serialize)]
struct LoadResponse {
    base_path: String,
    total_rows: i64,
    total_rejected: u64,
    duration_seconds: f64,
    #[serde(flatten)]
    outcome: BatchOutcome,
}

/// One line per manifest table for `--format table`.
#[derive(Debug, Serialize)]
struct TableRow {
    table: String,
    status: &'static str,
    rows: Option<i64>,
    rejected: Option<u64>,
    seconds: Option<String>,
}

/// Handle `strata load`.
pub async fn handle(args: &LoadArgs, ctx: AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let base_path = args
        .base_path
        .clone()
        .unwrap_or_else(|| ctx.config.ingest.base_path.clone());
    let options = ingest_options(args, &ctx.config.ingest);

    let progress = Progress::spinner(&format!("loading bronze layer from {base_path}"));
    let mut warehouse = ctx.warehouse;
    let source = PathBuf::from(&base_path);
    let result = tokio::task::spawn_blocking(move || warehouse.ingest(&source, &options))
        .await
        .context("bronze load task did not complete")?;

    let outcome = match result {
        Ok(outcome) => {
            progress.finish_ok(&format!(
                "bronze layer loaded: {} rows in {:.2}s",
                outcome.total_rows(),
                outcome.duration_seconds()
            ));
            outcome
        }
        Err(error) => {
            let summary = failure_summary(&error);
            progress.finish_err(&summary);
            return Err(error).with_context(|| format!("{summary} (base path '{base_path}')"));
        }
    };

    if flags.format == OutputFormat::Table {
        return output(&table_rows(&outcome), flags.format);
    }
    output(
        &LoadResponse {
            base_path,
            total_rows: outcome.total_rows(),
            total_rejected: outcome.total_rejected(),
            duration_seconds: outcome.duration_seconds(),
            outcome,
        },
        flags.format,
    )
}

/// Config values, narrowed by CLI flags. `--no-log` can only turn logging off.
fn ingest_options(args: &LoadArgs, config: &IngestConfig) -> IngestOptions {
    IngestOptions {
        log_to_store: config.log_to_store && !args.no_log,
        load: LoadOptions {
            max_errors: args.max_errors.unwrap_or(config.max_errors),
            ..LoadOptions::default()
        },
    }
}

/// One-line spinner message for a failed batch. A broken transaction is
/// reported apart from a load failure, since the rollback may not have run.
fn failure_summary(error: &IngestError) -> String {
    if error.is_transaction_failure() {
        return format!(
            "bronze load failed: transaction error (state {}); check the warehouse before retrying",
            error.state()
        );
    }
    match error.table() {
        Some(table) => format!("bronze load failed on {table}; batch rolled back"),
        None => "bronze load failed; batch rolled back".to_string(),
    }
}

fn table_rows(outcome: &BatchOutcome) -> Vec<TableRow> {
    let loaded = outcome.loaded.iter().map(|load| TableRow {
        table: load.table.clone(),
        status: "loaded",
        rows: Some(load.rows),
        rejected: Some(load.rejected),
        seconds: Some(format!("{:.3}", load.duration_seconds)),
    });
    let skipped = outcome.skipped.iter().map(|table| TableRow {
        table: table.clone(),
        status: "skipped",
        rows: None,
        rejected: None,
        seconds: None,
    });
    loaded.chain(skipped).collect()
}
