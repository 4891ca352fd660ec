//! Load-log records and batch outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{LoadStatus, Operation};

/// Table name written on the single failure record of a failed batch.
pub const BATCH_SENTINEL: &str = "<batch>";

/// An append-only load-log row.
///
/// `row_count` and `duration_seconds` are `None` on failure records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoadLogRecord {
    pub table_name: String,
    pub operation: Operation,
    pub row_count: Option<i64>,
    pub duration_seconds: Option<f64>,
    pub status: LoadStatus,
    pub error_message: Option<String>,
    pub logged_at: DateTime<Utc>,
}

impl LoadLogRecord {
    /// Record for a table that was truncated and reloaded.
    #[must_use]
    pub fn success(table_name: &str, row_count: i64, duration_seconds: f64) -> Self {
        Self {
            table_name: table_name.to_string(),
            operation: Operation::BulkLoad,
            row_count: Some(row_count),
            duration_seconds: Some(duration_seconds),
            status: LoadStatus::Success,
            error_message: None,
            logged_at: Utc::now(),
        }
    }

    /// The batch-level record written after a failed batch was rolled back.
    #[must_use]
    pub fn batch_failure(error_message: impl Into<String>) -> Self {
        Self {
            table_name: BATCH_SENTINEL.to_string(),
            operation: Operation::Batch,
            row_count: None,
            duration_seconds: None,
            status: LoadStatus::Failed,
            error_message: Some(error_message.into()),
            logged_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn is_batch_record(&self) -> bool {
        self.table_name == BATCH_SENTINEL
    }
}

/// Result of loading one manifest entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableLoad {
    /// Destination table (unqualified).
    pub table: String,
    /// Post-load row count of the destination.
    pub rows: i64,
    /// Records diverted to the error-capture file.
    pub rejected: u64,
    pub duration_seconds: f64,
}

/// What a committed batch did.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchOutcome {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Tables truncated and reloaded, in manifest order.
    pub loaded: Vec<TableLoad>,
    /// Tables truncated whose source file was absent.
    pub skipped: Vec<String>,
}

impl BatchOutcome {
    /// Wall-clock span of the batch in seconds, to the microsecond.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_seconds(&self) -> f64 {
        let span = self.finished_at - self.started_at;
        span.num_microseconds().map_or_else(
            || span.num_milliseconds() as f64 / 1_000.0,
            |micros| micros as f64 / 1_000_000.0,
        )
    }

    /// Sum of post-load row counts across loaded tables.
    #[must_use]
    pub fn total_rows(&self) -> i64 {
        self.loaded.iter().map(|load| load.rows).sum()
    }

    /// Sum of rejected records across loaded tables.
    #[must_use]
    pub fn total_rejected(&self) -> u64 {
        self.loaded.iter().map(|load| load.rejected).sum()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn success_record_carries_metrics() {
        let record = LoadLogRecord::success("crm_cust_info", 42, 0.5);
        assert_eq!(record.status, LoadStatus::Success);
        assert_eq!(record.operation, Operation::BulkLoad);
        assert_eq!(record.row_count, Some(42));
        assert_eq!(record.duration_seconds, Some(0.5));
        assert!(record.error_message.is_none());
        assert!(!record.is_batch_record());
    }

    #[test]
    fn failure_record_uses_batch_sentinel() {
        let record = LoadLogRecord::batch_failure("boom (code 1, state LOAD)");
        assert_eq!(record.status, LoadStatus::Failed);
        assert_eq!(record.table_name, BATCH_SENTINEL);
        assert!(record.row_count.is_none());
        assert!(record.duration_seconds.is_none());
        assert!(record.is_batch_record());
    }

    #[test]
    fn outcome_totals() {
        let started_at = Utc::now();
        let outcome = BatchOutcome {
            started_at,
            finished_at: started_at + Duration::milliseconds(1500),
            loaded: vec![
                TableLoad {
                    table: "crm_cust_info".into(),
                    rows: 3,
                    rejected: 1,
                    duration_seconds: 0.1,
                },
                TableLoad {
                    table: "erp_loc_a101".into(),
                    rows: 4,
                    rejected: 0,
                    duration_seconds: 0.2,
                },
            ],
            skipped: vec!["crm_prd_info".into()],
        };
        assert_eq!(outcome.total_rows(), 7);
        assert_eq!(outcome.total_rejected(), 1);
        assert!((outcome.duration_seconds() - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn outcome_duration_keeps_sub_millisecond_precision() {
        let started_at = Utc::now();
        let outcome = BatchOutcome {
            started_at,
            finished_at: started_at + Duration::microseconds(1_234_567),
            loaded: Vec::new(),
            skipped: Vec::new(),
        };
        assert!((outcome.duration_seconds() - 1.234_567).abs() < 1e-9);
    }

    #[test]
    fn record_serializes_status_snake_case() {
        let record = LoadLogRecord::success("erp_loc_a101", 1, 0.0);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["operation"], "bulk_load");
    }
}
