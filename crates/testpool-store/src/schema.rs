//! Column schema of the pool: repair of missing managed columns and
//! validation of flag cells.
//!
//! Both functions are pure so they can be tested without touching disk; the
//! store decides when a repaired table is written back.

use std::collections::HashSet;

use tracing::debug;

use testpool_core::config::pool::ColumnConfig;

use crate::error::{PoolError, PoolResult};
use crate::record::{Flag, RequestKind};
use crate::table::PoolTable;

/// Outcome of [`repair`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaRepair {
    /// Managed columns that were missing and have been appended.
    pub added_columns: Vec<String>,
}

impl SchemaRepair {
    /// Whether the table changed and must be persisted.
    pub fn repaired(&self) -> bool {
        !self.added_columns.is_empty()
    }
}

/// Column positions of a repaired, validated table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedColumns {
    /// Premise identifier column, if present.
    pub premise_id: Option<usize>,
    /// Device identifier column, if present.
    pub device_id: Option<usize>,
    /// Premise reservation flag.
    pub premise_flag: usize,
    /// Device reservation flag.
    pub device_flag: usize,
    /// Requester tag.
    pub tag: usize,
}

impl ResolvedColumns {
    /// Flag column for a request kind.
    pub fn flag(&self, kind: RequestKind) -> usize {
        match kind {
            RequestKind::Premise => self.premise_flag,
            RequestKind::Device => self.device_flag,
        }
    }
}

/// Managed columns and the value existing rows receive when one is added.
fn managed_columns(columns: &ColumnConfig) -> [(&str, &str); 3] {
    [
        (columns.premise_flag.as_str(), Flag::Free.as_cell()),
        (columns.device_flag.as_str(), Flag::Free.as_cell()),
        (columns.tag.as_str(), ""),
    ]
}

/// Append any missing managed column with its default.
///
/// Running `repair` on its own output adds nothing.
pub fn repair(mut table: PoolTable, columns: &ColumnConfig) -> (PoolTable, SchemaRepair) {
    let mut report = SchemaRepair::default();

    for (name, default) in managed_columns(columns) {
        if table.column_index(name).is_none() {
            debug!(column = %name, default = %default, "Adding missing pool column");
            table.push_column(name, default);
            report.added_columns.push(name.to_string());
        }
    }

    (table, report)
}

/// Check the table can be allocated from without guessing.
///
/// Rejects duplicate headers, missing managed columns and flag cells that
/// are not `Yes`/`No`.
pub fn validate(table: &PoolTable, columns: &ColumnConfig) -> PoolResult<ResolvedColumns> {
    let mut seen = HashSet::new();
    for header in table.headers() {
        if !seen.insert(header.as_str()) {
            return Err(PoolError::schema(format!(
                "column '{header}' appears more than once in the header row"
            )));
        }
    }

    let required = |name: &str| {
        table.column_index(name).ok_or_else(|| {
            PoolError::schema(format!("required column '{name}' is missing"))
        })
    };

    let resolved = ResolvedColumns {
        premise_id: table.column_index(&columns.premise_id),
        device_id: table.column_index(&columns.device_id),
        premise_flag: required(&columns.premise_flag)?,
        device_flag: required(&columns.device_flag)?,
        tag: required(&columns.tag)?,
    };

    for row in 0..table.len() {
        flag_at(table, row, resolved.premise_flag)?;
        flag_at(table, row, resolved.device_flag)?;
    }

    Ok(resolved)
}

/// Parse the flag stored at `row`/`col`.
pub fn flag_at(table: &PoolTable, row: usize, col: usize) -> PoolResult<Flag> {
    let cell = table.cell(row, col);
    Flag::parse(cell).ok_or_else(|| {
        PoolError::schema(format!(
            "line {} column '{}' holds '{}', expected Yes or No",
            row + 2,
            table.headers()[col],
            cell
        ))
    })
}

/// Descriptive columns listed in configuration but absent from the table.
pub fn missing_descriptive(table: &PoolTable, expected: &[String]) -> Vec<String> {
    expected
        .iter()
        .filter(|name| table.column_index(name).is_none())
        .cloned()
        .collect()
}
