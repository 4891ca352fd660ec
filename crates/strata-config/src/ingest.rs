//! Ingestion configuration.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Default base directory holding `source_A/` and `source_B/`.
fn default_base_path() -> String {
    String::from("datasets")
}

const fn default_log_to_store() -> bool {
    true
}

/// Malformed records tolerated per file before the load fails.
const fn default_max_errors() -> u64 {
    10
}

fn default_log_table() -> String {
    String::from("etl_log")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IngestConfig {
    /// Directory containing the source-system subdirectories.
    #[serde(default = "default_base_path")]
    pub base_path: String,

    /// Whether load-log records are written.
    #[serde(default = "default_log_to_store")]
    pub log_to_store: bool,

    /// Malformed-record threshold per file.
    #[serde(default = "default_max_errors")]
    pub max_errors: u64,

    /// Load-log table name inside the `bronze` schema.
    #[serde(default = "default_log_table")]
    pub log_table: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            log_to_store: default_log_to_store(),
            max_errors: default_max_errors(),
            log_table: default_log_table(),
        }
    }
}

impl IngestConfig {
    /// Check values that serde cannot.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for an empty base path or a log
    /// table name that is not a plain SQL identifier.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_path.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "ingest.base_path".into(),
                reason: "must not be empty".into(),
            });
        }

        let plain_identifier = !self.log_table.is_empty()
            && !self.log_table.starts_with(|c: char| c.is_ascii_digit())
            && self
                .log_table
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !plain_identifier {
            return Err(ConfigError::InvalidValue {
                field: "ingest.log_table".into(),
                reason: format!("'{}' is not a plain identifier", self.log_table),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = IngestConfig::default();
        assert_eq!(config.base_path, "datasets");
        assert!(config.log_to_store);
        assert_eq!(config.max_errors, 10);
        assert_eq!(config.log_table, "etl_log");
        config.validate().expect("defaults validate");
    }

    #[test]
    fn empty_base_path_is_invalid() {
        let config = IngestConfig {
            base_path: "  ".into(),
            ..IngestConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("ingest.base_path"));
    }

    #[test]
    fn log_table_must_be_identifier() {
        for bad in ["", "etl log", "1log", "log;drop"] {
            let config = IngestConfig {
                log_table: bad.into(),
                ..IngestConfig::default()
            };
            assert!(config.validate().is_err(), "{bad:?} should be rejected");
        }
    }
}
