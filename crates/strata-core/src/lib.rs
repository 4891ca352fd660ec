//! # strata-core
//!
//! Core types shared across the Strata crates.
//!
//! - Warehouse layers and load status enums
//! - The static load manifest (source file to bronze table mapping)
//! - Load-log records and batch outcomes
//! - Cross-cutting error types

pub mod entities;
pub mod enums;
pub mod errors;
pub mod manifest;

pub use entities::{BATCH_SENTINEL, BatchOutcome, LoadLogRecord, TableLoad};
pub use enums::{Layer, LoadStatus, Operation};
pub use errors::CoreError;
pub use manifest::{LoadManifestEntry, MANIFEST, SourceSystem};
