use clap::{Args, Subcommand};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Create the layer schemas, bronze tables, and load-log table.
    Init,
    /// Truncate and reload every bronze table from the source extracts.
    Load(LoadArgs),
    /// Show the most recent load-log records.
    Log(LogArgs),
}

/// Arguments for `strata load`.
#[derive(Clone, Debug, Args)]
pub struct LoadArgs {
    /// Directory holding `source_A/` and `source_B/` (defaults to `ingest.base_path`)
    pub base_path: Option<String>,
    /// Do not write load-log records for this run
    #[arg(long)]
    pub no_log: bool,
    /// Malformed records tolerated per file (defaults to `ingest.max_errors`)
    #[arg(long)]
    pub max_errors: Option<u64>,
}

/// Arguments for `strata log`.
#[derive(Clone, Debug, Args)]
pub struct LogArgs {
    /// Max records to return
    #[arg(short, long, default_value_t = 20)]
    pub limit: u32,
}
