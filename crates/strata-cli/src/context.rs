use anyhow::Context;
use strata_config::StrataConfig;
use strata_warehouse::Warehouse;

/// Resources shared by every command: resolved configuration and the open
/// warehouse handle.
pub struct AppContext {
    pub config: StrataConfig,
    pub warehouse: Warehouse,
}

impl AppContext {
    /// Open the configured warehouse database, creating the file if needed.
    pub fn open(config: StrataConfig) -> anyhow::Result<Self> {
        let warehouse = if config.warehouse.is_in_memory() {
            Warehouse::open_in_memory()
        } else {
            Warehouse::open(&config.warehouse.database_path)
        }
        .with_context(|| {
            format!(
                "failed to open warehouse database '{}'",
                config.warehouse.database_path
            )
        })?
        .with_log_table(config.ingest.log_table.clone());

        tracing::debug!(
            database = %config.warehouse.database_path,
            log_table = %config.ingest.log_table,
            "warehouse opened"
        );
        Ok(Self { config, warehouse })
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn file_database_is_created_with_configured_log_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dw.duckdb");
        let mut config = StrataConfig::default();
        config.warehouse.database_path = path.to_string_lossy().into_owned();
        config.ingest.log_table = "load_audit".into();

        let ctx = AppContext::open(config).unwrap();
        ctx.warehouse.bootstrap().unwrap();

        assert!(path.exists());
        assert_eq!(ctx.warehouse.log().table(), "load_audit");
    }

    #[test]
    fn unopenable_path_is_reported() {
        let dir = TempDir::new().unwrap();
        let mut config = StrataConfig::default();
        config.warehouse.database_path = dir
            .path()
            .join("missing")
            .join("dw.duckdb")
            .to_string_lossy()
            .into_owned();

        let err = AppContext::open(config).err().unwrap();
        assert!(format!("{err:#}").contains("failed to open warehouse database"));
    }
}
