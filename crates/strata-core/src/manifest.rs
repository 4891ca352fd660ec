//! The static load manifest.
//!
//! Each entry maps one source extract onto one table in the `bronze` layer.
//! The manifest is fixed at build time; file names are not configurable at
//! call time. Entries are processed in declaration order.

use std::path::PathBuf;

use serde::Serialize;

/// Source system an extract comes from. Each system has its own
/// subdirectory under the ingestion base path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceSystem {
    /// Subject area A: customer relationship extracts.
    Crm,
    /// Subject area B: ERP extracts.
    Erp,
}

impl SourceSystem {
    /// Both source systems, in manifest order.
    pub const ALL: [Self; 2] = [Self::Crm, Self::Erp];

    /// Subdirectory (relative to the base path) holding this system's files.
    #[must_use]
    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::Crm => "source_A",
            Self::Erp => "source_B",
        }
    }
}

/// One source-file-to-destination-table mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadManifestEntry {
    /// Destination table name inside the `bronze` schema.
    pub table: &'static str,
    /// Source system, which selects the subdirectory.
    pub source: SourceSystem,
    /// Source file name inside the subdirectory.
    pub file_name: &'static str,
    /// Error-capture file name, written next to the source file.
    pub error_file_name: &'static str,
}

impl LoadManifestEntry {
    /// Source file path relative to the base path.
    #[must_use]
    pub fn relative_source(&self) -> PathBuf {
        PathBuf::from(self.source.dir_name()).join(self.file_name)
    }

    /// Error-capture file path relative to the base path.
    #[must_use]
    pub fn relative_error_file(&self) -> PathBuf {
        PathBuf::from(self.source.dir_name()).join(self.error_file_name)
    }
}

/// The raw-layer load manifest.
pub const MANIFEST: [LoadManifestEntry; 6] = [
    LoadManifestEntry {
        table: "crm_cust_info",
        source: SourceSystem::Crm,
        file_name: "cust_info.csv",
        error_file_name: "error_cust_info.csv",
    },
    LoadManifestEntry {
        table: "crm_prd_info",
        source: SourceSystem::Crm,
        file_name: "prd_info.csv",
        error_file_name: "error_prd_info.csv",
    },
    LoadManifestEntry {
        table: "crm_sales_details",
        source: SourceSystem::Crm,
        file_name: "sales_details.csv",
        error_file_name: "error_sales_details.csv",
    },
    LoadManifestEntry {
        table: "erp_loc_a101",
        source: SourceSystem::Erp,
        file_name: "LOC_A101.csv",
        error_file_name: "error_LOC_A101.csv",
    },
    LoadManifestEntry {
        table: "erp_cust_az12",
        source: SourceSystem::Erp,
        file_name: "CUST_AZ12.csv",
        error_file_name: "error_CUST_AZ12.csv",
    },
    LoadManifestEntry {
        table: "erp_px_cat_g1v2",
        source: SourceSystem::Erp,
        file_name: "PX_CAT_G1V2.csv",
        error_file_name: "error_PX_CAT_G1V2.csv",
    },
];

/// Look up a manifest entry by destination table name.
#[must_use]
pub fn entry_for_table(table: &str) -> Option<&'static LoadManifestEntry> {
    MANIFEST.iter().find(|entry| entry.table == table)
}
