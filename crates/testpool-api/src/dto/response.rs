//! Response DTOs.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use testpool_store::{PoolReport, Record, RequestKind};

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// A reserved row, shaped as a one-row table for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordTable {
    /// Position among the data rows.
    pub row: usize,
    /// Headers in stored order.
    pub columns: Vec<String>,
    /// Cells aligned with `columns`.
    pub values: Vec<String>,
}

/// Successful reservation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationResponse {
    /// Kind that was requested.
    pub kind: RequestKind,
    /// The identifier handed out.
    pub requested_id: String,
    /// Tag stored with the reservation.
    pub tag: String,
    /// The full row after reservation.
    pub record: RecordTable,
}

impl ReservationResponse {
    /// Shape a reserved record for the client.
    pub fn new(kind: RequestKind, record: Record) -> Self {
        Self {
            kind,
            requested_id: record.identifier(kind).to_string(),
            tag: record.tag,
            record: RecordTable {
                row: record.row,
                columns: record.columns,
                values: record.values,
            },
        }
    }
}

/// Pool counts reported by the health check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolStatus {
    /// Pool file location.
    pub location: PathBuf,
    /// Number of records.
    pub rows: usize,
    /// Free premise identifiers.
    pub free_premise: usize,
    /// Free device identifiers.
    pub free_device: usize,
    /// Managed columns added by this check.
    pub added_columns: Vec<String>,
    /// Expected descriptive columns absent from the file.
    pub missing_descriptive: Vec<String>,
}

impl From<PoolReport> for PoolStatus {
    fn from(report: PoolReport) -> Self {
        Self {
            location: report.location,
            rows: report.rows,
            free_premise: report.free_premise,
            free_device: report.free_device,
            added_columns: report.added_columns,
            missing_descriptive: report.missing_descriptive,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status string.
    pub status: String,
    /// Server version.
    pub version: String,
    /// Uptime in seconds.
    pub uptime_seconds: i64,
    /// Pool state at check time.
    pub pool: PoolStatus,
    /// When the check ran.
    pub checked_at: DateTime<Utc>,
}
