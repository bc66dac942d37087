//! Persistent storage of the pool table.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{PoolError, PoolResult};
use crate::lock::{LockPolicy, PoolLock, lock_path_for};
use crate::table::PoolTable;

/// Where the pool lives and how it is locked, read and rewritten.
///
/// Implementations must make `persist` all-or-nothing: after a failed call
/// the next `load` returns the table from the last successful `persist`.
pub trait PoolStorage: Send + Sync + fmt::Debug {
    /// Location shown in diagnostics.
    fn location(&self) -> &Path;

    /// Whether the pool file is present.
    fn exists(&self) -> bool {
        self.location().is_file()
    }

    /// Read the whole pool.
    fn load(&self) -> PoolResult<PoolTable>;

    /// Replace the whole pool.
    fn persist(&self, table: &PoolTable) -> PoolResult<()>;

    /// Take the exclusive lock guarding load/persist sequences.
    fn lock(&self, policy: &LockPolicy) -> PoolResult<PoolLock>;
}

/// CSV file on the local filesystem.
#[derive(Debug, Clone)]
pub struct CsvFileStorage {
    path: PathBuf,
    lock_path: PathBuf,
    temp_path: PathBuf,
}

impl CsvFileStorage {
    /// Storage for the CSV file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lock_path = lock_path_for(&path);
        let mut temp_name = path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "pool".into());
        temp_name.push(".tmp");
        let temp_path = path.with_file_name(temp_name);
        Self {
            path,
            lock_path,
            temp_path,
        }
    }

    /// Sidecar lock file.
    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    fn read_error(&self, err: csv::Error) -> PoolError {
        let reason = err.to_string();
        match err.into_kind() {
            csv::ErrorKind::Io(source) => PoolError::storage(
                format!("Failed to read {}: {reason}", self.path.display()),
                source,
            ),
            _ => PoolError::Malformed {
                path: self.path.clone(),
                reason,
            },
        }
    }

    fn write_temp(&self, table: &PoolTable) -> PoolResult<()> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.temp_path)
            .map_err(|e| {
                PoolError::storage(
                    format!("Failed to create {}", self.temp_path.display()),
                    e,
                )
            })?;

        let mut writer = BufWriter::new(file);
        table.write_csv(&mut writer).map_err(|e| {
            let reason = format!("Failed to write {}: {e}", self.temp_path.display());
            match e.into_kind() {
                csv::ErrorKind::Io(source) => PoolError::storage(reason, source),
                _ => PoolError::Storage {
                    reason,
                    source: None,
                },
            }
        })?;
        writer.flush().map_err(|e| {
            PoolError::storage(format!("Failed to flush {}", self.temp_path.display()), e)
        })?;

        let file = writer.into_inner().map_err(|e| {
            PoolError::storage(
                format!("Failed to flush {}", self.temp_path.display()),
                e.into_error(),
            )
        })?;
        file.sync_all().map_err(|e| {
            PoolError::storage(format!("Failed to sync {}", self.temp_path.display()), e)
        })?;

        Ok(())
    }
}

impl PoolStorage for CsvFileStorage {
    fn location(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> PoolResult<PoolTable> {
        let file = File::open(&self.path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                PoolError::unavailable(format!(
                    "Required data file not found: '{}'",
                    self.path.display()
                ))
            } else {
                PoolError::storage(format!("Failed to open {}", self.path.display()), e)
            }
        })?;

        let table = PoolTable::read_csv(BufReader::new(file)).map_err(|e| self.read_error(e))?;
        debug!(path = %self.path.display(), rows = table.len(), "Loaded pool");
        Ok(table)
    }

    fn persist(&self, table: &PoolTable) -> PoolResult<()> {
        if let Err(e) = self.write_temp(table) {
            if let Err(cleanup) = fs::remove_file(&self.temp_path) {
                if cleanup.kind() != io::ErrorKind::NotFound {
                    warn!(path = %self.temp_path.display(), error = %cleanup, "Failed to remove temp file");
                }
            }
            return Err(e);
        }

        // Rename is atomic on the same filesystem; readers see old or new, never partial.
        fs::rename(&self.temp_path, &self.path).map_err(|e| {
            PoolError::storage(
                format!(
                    "Failed to replace {} with {}",
                    self.path.display(),
                    self.temp_path.display()
                ),
                e,
            )
        })?;

        debug!(path = %self.path.display(), rows = table.len(), "Persisted pool");
        Ok(())
    }

    fn lock(&self, policy: &LockPolicy) -> PoolResult<PoolLock> {
        PoolLock::acquire(&self.lock_path, policy)
    }
}
