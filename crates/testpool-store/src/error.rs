//! Error type for pool operations.
//!
//! Every failure of the store is one of the variants below so callers can
//! tell "retry", "ask an administrator" and "pool missing" apart. The
//! exhausted-pool case is not an error; see [`crate::store::Reservation`].

use std::path::PathBuf;

use thiserror::Error;

use testpool_core::error::{AppError, ErrorKind};

/// Convenience alias for store results.
pub type PoolResult<T> = Result<T, PoolError>;

/// Failure of an `initialize` or `reserve` call.
#[derive(Debug, Error)]
pub enum PoolError {
    /// The pool file is missing or holds no records.
    #[error("Identifier pool is unavailable: {reason}")]
    Unavailable {
        /// What was wrong with the pool file.
        reason: String,
    },

    /// The pool file exists but is not a readable table.
    #[error("Pool file '{}' could not be read as a table: {reason}", path.display())]
    Malformed {
        /// Location of the pool file.
        path: PathBuf,
        /// Parser diagnostic.
        reason: String,
    },

    /// The table has values the store refuses to interpret.
    #[error("Pool schema error: {reason}")]
    Schema {
        /// Offending column, line and value.
        reason: String,
    },

    /// Reading or writing the pool file failed.
    #[error("Pool storage error: {reason}")]
    Storage {
        /// What the store was doing.
        reason: String,
        /// Underlying I/O error, if any.
        #[source]
        source: Option<std::io::Error>,
    },

    /// Another caller held the pool lock for longer than the allowed wait.
    #[error("Timed out after {waited_ms} ms waiting for the pool lock '{}'", path.display())]
    LockTimeout {
        /// Lock file that could not be acquired.
        path: PathBuf,
        /// How long the caller waited.
        waited_ms: u64,
    },
}

impl PoolError {
    /// Create a storage error wrapping an I/O failure.
    pub fn storage(reason: impl Into<String>, source: std::io::Error) -> Self {
        Self::Storage {
            reason: reason.into(),
            source: Some(source),
        }
    }

    /// Create a schema error.
    pub fn schema(reason: impl Into<String>) -> Self {
        Self::Schema {
            reason: reason.into(),
        }
    }

    /// Create an unavailable error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }
}

impl From<PoolError> for AppError {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::Unavailable { .. } => AppError::service_unavailable(format!(
                "{err}. Ask an administrator to restore the pool file."
            )),
            PoolError::Malformed { .. } => AppError::malformed(format!(
                "{err}. Contact an administrator; the pool file must be fixed by hand."
            )),
            PoolError::Schema { .. } => AppError::schema(format!(
                "{err}. Contact an administrator; the pool file must be fixed by hand."
            )),
            PoolError::LockTimeout { .. } => {
                AppError::timeout(format!("{err}. The pool is busy; please retry."))
            }
            PoolError::Storage {
                ref reason,
                source: None,
            } => AppError::storage(format!(
                "Pool storage error: {reason}. The reservation was not saved; please retry."
            )),
            PoolError::Storage {
                reason,
                source: Some(source),
            } => AppError::with_source(
                ErrorKind::Storage,
                format!("Pool storage error: {reason}. The reservation was not saved; please retry."),
                source,
            ),
        }
    }
}
