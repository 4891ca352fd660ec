//! Cross-cutting error types for Strata.
//!
//! Storage and ingestion errors (`IngestError`) live in `strata-warehouse`,
//! configuration errors in `strata-config`.

use thiserror::Error;

/// Errors that can be raised by any Strata crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A stored value could not be mapped back onto a domain enum.
    #[error("Unknown {kind} value: '{value}'")]
    UnknownValue { kind: &'static str, value: String },

    /// Data failed validation (format, constraints).
    #[error("Validation error: {0}")]
    Validation(String),
}
