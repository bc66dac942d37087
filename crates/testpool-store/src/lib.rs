//! # testpool-store
//!
//! The allocation store: a pool of test identifiers kept in a single CSV
//! file, from which callers reserve the first free entry of a kind.
//!
//! Every operation takes an exclusive advisory lock scoped to the pool file,
//! loads the table fresh, repairs missing managed columns, and rewrites the
//! whole table atomically (temp file + rename) before releasing the lock.
//! Reservations are therefore mutually exclusive across threads and
//! processes, and a failed write never leaves a half-reserved row behind.

pub mod error;
pub mod lock;
pub mod record;
pub mod schema;
pub mod service;
pub mod storage;
pub mod store;
pub mod table;

pub use error::{PoolError, PoolResult};
pub use lock::{LockPolicy, PoolLock};
pub use record::{Flag, Record, RequestKind, Tag};
pub use service::{IdentifierAllocator, PoolService};
pub use storage::{CsvFileStorage, PoolStorage};
pub use store::{AllocationStore, PoolReport, Reservation};
pub use table::PoolTable;
