//! The allocation store: `initialize` and `reserve` over a locked pool.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{error, info, warn};

use testpool_core::config::pool::{ColumnConfig, PoolConfig};
use testpool_core::error::AppError;
use testpool_core::result::AppResult;

use crate::error::{PoolError, PoolResult};
use crate::lock::LockPolicy;
use crate::record::{Flag, Record, RequestKind, Tag};
use crate::schema::{self, ResolvedColumns};
use crate::storage::{CsvFileStorage, PoolStorage};
use crate::table::PoolTable;

/// Result of a successful `initialize`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolReport {
    /// Pool file location.
    pub location: PathBuf,
    /// Number of records.
    pub rows: usize,
    /// Managed columns that were missing and have been added and persisted.
    pub added_columns: Vec<String>,
    /// Configured descriptive columns absent from the file (warning only).
    pub missing_descriptive: Vec<String>,
    /// Records whose premise identifier is still free.
    pub free_premise: usize,
    /// Records whose device identifier is still free.
    pub free_device: usize,
}

impl PoolReport {
    /// Free identifiers left for a kind.
    pub fn free(&self, kind: RequestKind) -> usize {
        match kind {
            RequestKind::Premise => self.free_premise,
            RequestKind::Device => self.free_device,
        }
    }
}

/// Outcome of a `reserve` call that reached the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reservation {
    /// The first free row was claimed; the record reflects the persisted row.
    Reserved(Record),
    /// Every identifier of this kind is already reserved.
    Exhausted {
        /// The kind that was requested.
        kind: RequestKind,
    },
}

impl Reservation {
    /// The reserved record, or a `NotFound` error naming the exhausted kind.
    pub fn into_record(self) -> AppResult<Record> {
        match self {
            Self::Reserved(record) => Ok(record),
            Self::Exhausted { kind } => Err(AppError::not_found(format!(
                "No unreserved {} left; request a different kind or wait for the pool to be replenished",
                kind.label()
            ))),
        }
    }
}

/// Serves one reservation per call against a shared pool file.
///
/// Holds no pool state between calls: every operation locks the storage
/// location, loads the table fresh, and releases the lock before returning.
#[derive(Debug)]
pub struct AllocationStore<S = CsvFileStorage> {
    storage: S,
    columns: ColumnConfig,
    descriptive_columns: Vec<String>,
    lock_policy: LockPolicy,
}

impl AllocationStore<CsvFileStorage> {
    /// Store over the CSV file named in configuration.
    pub fn from_config(config: &PoolConfig) -> Self {
        Self::new(CsvFileStorage::new(&config.path), config.columns.clone())
            .with_descriptive_columns(config.descriptive_columns.clone())
            .with_lock_policy(LockPolicy::from_config(config))
    }
}

impl<S: PoolStorage> AllocationStore<S> {
    /// Store over arbitrary storage with the given column names.
    pub fn new(storage: S, columns: ColumnConfig) -> Self {
        Self {
            storage,
            columns,
            descriptive_columns: Vec::new(),
            lock_policy: LockPolicy::default(),
        }
    }

    /// Set the lock wait policy.
    pub fn with_lock_policy(mut self, policy: LockPolicy) -> Self {
        self.lock_policy = policy;
        self
    }

    /// Set the descriptive columns checked by `initialize`.
    pub fn with_descriptive_columns(mut self, columns: Vec<String>) -> Self {
        self.descriptive_columns = columns;
        self
    }

    /// Underlying storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Lock wait policy in effect.
    pub fn lock_policy(&self) -> &LockPolicy {
        &self.lock_policy
    }

    /// Check the pool can serve reservations, repairing missing managed
    /// columns on the way.
    ///
    /// Missing or empty pool files yield [`PoolError::Unavailable`]; callers
    /// must not go on to `reserve` in that case.
    pub fn initialize(&self) -> PoolResult<PoolReport> {
        self.initialize_within(&self.lock_policy)
    }

    /// `initialize` with an explicit lock wait policy.
    pub(crate) fn initialize_within(&self, policy: &LockPolicy) -> PoolResult<PoolReport> {
        self.ensure_present()?;
        let _lock = self.storage.lock(policy)?;

        let (table, resolved, added_columns) = self.load_validated()?;

        let missing_descriptive = schema::missing_descriptive(&table, &self.descriptive_columns);
        if !missing_descriptive.is_empty() {
            warn!(
                path = %self.storage.location().display(),
                missing = ?missing_descriptive,
                "Pool is missing descriptive columns; reservations will still work"
            );
        }

        let count_free = |col: usize| {
            (0..table.len())
                .filter(|&row| Flag::parse(table.cell(row, col)).is_some_and(|f| f.is_free()))
                .count()
        };

        let report = PoolReport {
            location: self.storage.location().to_path_buf(),
            rows: table.len(),
            added_columns,
            missing_descriptive,
            free_premise: count_free(resolved.premise_flag),
            free_device: count_free(resolved.device_flag),
        };

        info!(
            path = %report.location.display(),
            rows = report.rows,
            free_premise = report.free_premise,
            free_device = report.free_device,
            "Identifier pool ready"
        );

        Ok(report)
    }

    /// Reserve the first free identifier of `kind` for `tag`.
    ///
    /// The whole load, scan, mutate, persist sequence runs under the pool
    /// lock. If the write fails nothing is reserved and the error is
    /// returned; the file keeps the content of the last successful write.
    pub fn reserve(&self, kind: RequestKind, tag: &Tag) -> PoolResult<Reservation> {
        self.reserve_within(kind, tag, &self.lock_policy)
    }

    /// `reserve` with an explicit lock wait policy.
    pub(crate) fn reserve_within(
        &self,
        kind: RequestKind,
        tag: &Tag,
        policy: &LockPolicy,
    ) -> PoolResult<Reservation> {
        self.ensure_present()?;
        let _lock = self.storage.lock(policy)?;

        let (mut table, resolved, _) = self.load_validated()?;
        let flag_col = resolved.flag(kind);

        let Some(row) = (0..table.len())
            .find(|&row| Flag::parse(table.cell(row, flag_col)).is_some_and(|f| f.is_free()))
        else {
            info!(kind = %kind, rows = table.len(), "Pool exhausted for request kind");
            return Ok(Reservation::Exhausted { kind });
        };

        table.set_cell(row, flag_col, Flag::Reserved.as_cell());
        table.set_cell(row, resolved.tag, tag.as_str());
        let record = Record::from_row(&table, row, &resolved)?;

        if let Err(e) = self.storage.persist(&table) {
            error!(kind = %kind, row, error = %e, "Failed to persist reservation");
            return Err(e);
        }

        info!(
            kind = %kind,
            row,
            identifier = %record.identifier(kind),
            tag = %tag,
            "Identifier reserved"
        );

        Ok(Reservation::Reserved(record))
    }

    fn ensure_present(&self) -> PoolResult<()> {
        if self.storage.exists() {
            Ok(())
        } else {
            Err(PoolError::unavailable(format!(
                "Required data file not found: '{}'",
                self.storage.location().display()
            )))
        }
    }

    /// Load, repair and validate the pool. A repaired table is persisted
    /// before returning. Must be called with the lock held.
    fn load_validated(&self) -> PoolResult<(PoolTable, ResolvedColumns, Vec<String>)> {
        let table = self.storage.load()?;
        if table.is_empty() {
            return Err(PoolError::unavailable(format!(
                "'{}' was found but holds no records",
                self.storage.location().display()
            )));
        }

        let (table, repair) = schema::repair(table, &self.columns);
        let resolved = schema::validate(&table, &self.columns)?;

        if repair.repaired() {
            self.storage.persist(&table)?;
            info!(
                path = %self.storage.location().display(),
                added = ?repair.added_columns,
                "Added missing pool columns"
            );
        }

        Ok((table, resolved, repair.added_columns))
    }
}
