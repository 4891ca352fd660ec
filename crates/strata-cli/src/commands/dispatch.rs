use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;
use crate::commands;
use crate::context::AppContext;

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(
    command: Commands,
    ctx: AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match command {
        Commands::Init => commands::init::handle(&ctx, flags),
        Commands::Load(args) => commands::load::handle(&args, ctx, flags).await,
        Commands::Log(args) => commands::log::handle(&args, &ctx, flags),
    }
}
