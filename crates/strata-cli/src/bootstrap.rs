use anyhow::Context;
use strata_config::StrataConfig;

use crate::cli::GlobalFlags;

/// Load layered configuration (with `.env`), then apply global CLI overrides.
pub fn load_config(flags: &GlobalFlags) -> anyhow::Result<StrataConfig> {
    let config = StrataConfig::load_with_dotenv().context("failed to load strata configuration")?;
    Ok(apply_overrides(config, flags))
}

fn apply_overrides(mut config: StrataConfig, flags: &GlobalFlags) -> StrataConfig {
    if let Some(database) = &flags.database {
        config.warehouse.database_path.clone_from(database);
    }
    config
}
