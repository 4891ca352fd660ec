//! Warehouse database configuration.

use serde::{Deserialize, Serialize};

/// Default `DuckDB` database file.
fn default_database_path() -> String {
    String::from("warehouse.duckdb")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WarehouseConfig {
    /// Path to the `DuckDB` database file. `:memory:` opens a throwaway
    /// in-memory database.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

impl WarehouseConfig {
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.database_path == ":memory:"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_points_at_local_file() {
        let config = WarehouseConfig::default();
        assert_eq!(config.database_path, "warehouse.duckdb");
        assert!(!config.is_in_memory());
    }

    #[test]
    fn memory_marker_is_detected() {
        let config = WarehouseConfig {
            database_path: ":memory:".into(),
        };
        assert!(config.is_in_memory());
    }
}
