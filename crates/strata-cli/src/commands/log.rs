use anyhow::Context;
use strata_core::LoadLogRecord;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::LogArgs;
use crate::context::AppContext;
use crate::output::output;

/// Handle `strata log`.
pub fn handle(args: &LogArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    output(&run(args, ctx)?, flags.format)
}

fn run(args: &LogArgs, ctx: &AppContext) -> anyhow::Result<Vec<LoadLogRecord>> {
    let log = ctx.warehouse.log();
    log.recent(ctx.warehouse.conn(), args.limit).with_context(|| {
        format!(
            "failed to read {} (run 'strata init' first?)",
            log.qualified_name()
        )
    })
}
