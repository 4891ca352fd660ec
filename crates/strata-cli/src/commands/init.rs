use anyhow::Context;
use serde::Serialize;
use strata_core::{Layer, MANIFEST};

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct InitResponse {
    database: String,
    schemas: Vec<&'static str>,
    tables: Vec<&'static str>,
    log_table: String,
}

/// Handle `strata init`.
pub fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    output(&run(ctx)?, flags.format)
}

fn run(ctx: &AppContext) -> anyhow::Result<InitResponse> {
    ctx.warehouse
        .bootstrap()
        .context("failed to bootstrap warehouse schemas")?;

    Ok(InitResponse {
        database: ctx.config.warehouse.database_path.clone(),
        schemas: Layer::ALL.into_iter().map(Layer::as_str).collect(),
        tables: MANIFEST.iter().map(|entry| entry.table).collect(),
        log_table: ctx.warehouse.log().qualified_name(),
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use strata_config::StrataConfig;

    use super::*;

    fn in_memory() -> AppContext {
        let mut config = StrataConfig::default();
        config.warehouse.database_path = ":memory:".into();
        AppContext::open(config).unwrap()
    }

    #[test]
    fn init_reports_created_objects() {
        let ctx = in_memory();
        let response = run(&ctx).unwrap();
        assert_eq!(response.schemas, ["bronze", "silver", "gold"]);
        assert_eq!(response.tables.len(), 6);
        assert_eq!(response.log_table, "\"bronze\".\"etl_log\"");
        assert_eq!(ctx.warehouse.row_count("crm_cust_info").unwrap(), 0);
    }

    #[test]
    fn init_twice_is_harmless() {
        let ctx = in_memory();
        run(&ctx).unwrap();
        run(&ctx).unwrap();
    }
}
