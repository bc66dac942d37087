//! Async front of the allocation store for the HTTP API and the CLI.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::Mutex;

use testpool_core::error::AppError;
use testpool_core::result::AppResult;

use crate::error::{PoolError, PoolResult};
use crate::lock::LockPolicy;
use crate::record::{RequestKind, Tag};
use crate::storage::{CsvFileStorage, PoolStorage};
use crate::store::{AllocationStore, PoolReport, Reservation};

/// Trait for reserving identifiers from a shared pool.
///
/// Implementations must be safe to call concurrently from many tasks and
/// many processes pointed at the same pool.
#[async_trait]
pub trait IdentifierAllocator: Send + Sync + fmt::Debug {
    /// Check the pool and repair missing managed columns.
    async fn initialize(&self) -> AppResult<PoolReport>;

    /// Reserve the first free identifier of `kind` for `tag`.
    async fn reserve(&self, kind: RequestKind, tag: Tag) -> AppResult<Reservation>;
}

/// Runs store operations on the blocking pool, one at a time per process.
///
/// The in-process gate keeps local callers from spinning on the file lock;
/// the file lock still decides between processes. Time spent at the gate
/// counts against the same lock timeout.
#[derive(Debug)]
pub struct PoolService<S = CsvFileStorage> {
    store: Arc<AllocationStore<S>>,
    gate: Arc<Mutex<()>>,
}

impl<S> Clone for PoolService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            gate: Arc::clone(&self.gate),
        }
    }
}

impl<S: PoolStorage + 'static> PoolService<S> {
    /// Wrap a store.
    pub fn new(store: AllocationStore<S>) -> Self {
        Self {
            store: Arc::new(store),
            gate: Arc::new(Mutex::new(())),
        }
    }

    async fn run<T, F>(&self, op: F) -> AppResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&AllocationStore<S>, &LockPolicy) -> PoolResult<T> + Send + 'static,
    {
        let policy = *self.store.lock_policy();
        let timeout = policy.timeout;
        let started = Instant::now();
        let _gate = tokio::time::timeout(timeout, self.gate.lock())
            .await
            .map_err(|_| {
                AppError::from(PoolError::LockTimeout {
                    path: self.store.storage().location().to_path_buf(),
                    waited_ms: timeout.as_millis() as u64,
                })
            })?;

        let remaining = LockPolicy {
            timeout: timeout.saturating_sub(started.elapsed()),
            ..policy
        };
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || op(store.as_ref(), &remaining))
            .await
            .map_err(|e| AppError::internal(format!("Pool task failed: {e}")))?
            .map_err(AppError::from)
    }
}

#[async_trait]
impl<S: PoolStorage + 'static> IdentifierAllocator for PoolService<S> {
    async fn initialize(&self) -> AppResult<PoolReport> {
        self.run(|store, policy| store.initialize_within(policy)).await
    }

    async fn reserve(&self, kind: RequestKind, tag: Tag) -> AppResult<Reservation> {
        self.run(move |store, policy| store.reserve_within(kind, &tag, policy)).await
    }
}
