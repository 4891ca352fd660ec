//! Integration tests for TOML configuration loading.
//!
//! Uses figment::Jail for sandboxed files and env vars.

use figment::{
    Figment, Jail,
    providers::{Format, Serialized, Toml},
};
use pretty_assertions::assert_eq;
use strata_config::{ConfigError, StrataConfig};
use tempfile::TempDir;

#[test]
fn loads_project_file_from_working_directory() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "strata.toml",
            r#"
[warehouse]
database_path = "/var/lib/strata/dwh.duckdb"

[ingest]
base_path = "/data/extracts"
log_to_store = false
max_errors = 0
log_table = "load_audit"
"#,
        )?;

        let config = StrataConfig::load().expect("config loads");
        assert_eq!(config.warehouse.database_path, "/var/lib/strata/dwh.duckdb");
        assert_eq!(config.ingest.base_path, "/data/extracts");
        assert!(!config.ingest.log_to_store);
        assert_eq!(config.ingest.max_errors, 0);
        assert_eq!(config.ingest.log_table, "load_audit");
        Ok(())
    });
}

#[test]
fn partial_file_keeps_other_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[ingest]
max_errors = 3
"#,
        )?;

        let config: StrataConfig = Figment::from(Serialized::defaults(StrataConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.ingest.max_errors, 3);
        assert_eq!(config.ingest.base_path, "datasets");
        assert!(config.ingest.log_to_store);
        assert_eq!(config.warehouse.database_path, "warehouse.duckdb");
        Ok(())
    });
}

#[test]
fn invalid_log_table_is_rejected_on_load() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "strata.toml",
            r#"
[ingest]
log_table = "etl log"
"#,
        )?;

        let err = StrataConfig::load().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
        Ok(())
    });
}

#[test]
fn malformed_toml_is_a_figment_error() {
    Jail::expect_with(|jail| {
        jail.create_file("strata.toml", "[ingest\nmax_errors = ")?;

        let err = StrataConfig::load().unwrap_err();
        assert!(matches!(err, ConfigError::Figment(_)));
        Ok(())
    });
}

#[test]
fn from_figment_validates_explicit_sources() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "[warehouse]\ndatabase_path = \"/srv/dw.duckdb\"\n\n[ingest]\nbase_path = \"\"\n",
    )
    .unwrap();

    let figment = Figment::from(Serialized::defaults(StrataConfig::default()))
        .merge(Toml::file(&path));
    let err = StrataConfig::from_figment(&figment).unwrap_err();
    assert!(err.to_string().contains("ingest.base_path"));

    let figment = figment.merge(Serialized::default("ingest.base_path", "/srv/extracts"));
    let config = StrataConfig::from_figment(&figment).unwrap();
    assert_eq!(config.warehouse.database_path, "/srv/dw.duckdb");
    assert_eq!(config.ingest.base_path, "/srv/extracts");
}
