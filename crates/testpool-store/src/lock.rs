//! Cross-process exclusive lock scoped to a pool file.
//!
//! The lock lives on a sidecar `<pool>.lock` file because the pool file
//! itself is replaced by rename on every write, and a lock held on a
//! replaced inode would no longer exclude anyone.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use testpool_core::config::pool::PoolConfig;

use crate::error::{PoolError, PoolResult};

/// How long to wait for the lock, and how often to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockPolicy {
    /// Give up after this long.
    pub timeout: Duration,
    /// Sleep between attempts.
    pub poll_interval: Duration,
}

impl LockPolicy {
    /// Build the policy from pool configuration.
    pub fn from_config(config: &PoolConfig) -> Self {
        Self {
            timeout: config.lock_timeout(),
            poll_interval: config.lock_poll_interval(),
        }
    }
}

impl Default for LockPolicy {
    fn default() -> Self {
        Self::from_config(&PoolConfig::default())
    }
}

/// Sidecar lock path for a pool file: `pool.csv` -> `pool.csv.lock`.
pub fn lock_path_for(pool_path: &Path) -> PathBuf {
    let mut name = pool_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "pool".into());
    name.push(".lock");
    pool_path.with_file_name(name)
}

/// Held exclusive lock. Released on drop.
#[derive(Debug)]
pub struct PoolLock {
    file: File,
    path: PathBuf,
}

impl PoolLock {
    /// Acquire the exclusive lock on `path`, polling until `policy.timeout`.
    ///
    /// Every call opens its own handle, so two callers in the same process
    /// exclude each other just like two processes do.
    pub fn acquire(path: &Path, policy: &LockPolicy) -> PoolResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(|e| {
                PoolError::storage(format!("Failed to open lock file {}", path.display()), e)
            })?;

        let started = Instant::now();
        loop {
            // Explicit fs2 call: std::fs::File has inherent lock methods of the same name.
            match fs2::FileExt::try_lock_exclusive(&file) {
                Ok(()) => {
                    debug!(
                        path = %path.display(),
                        waited_ms = started.elapsed().as_millis() as u64,
                        "Pool lock acquired"
                    );
                    return Ok(Self {
                        file,
                        path: path.to_path_buf(),
                    });
                }
                Err(e) if is_contended(&e) => {
                    let waited = started.elapsed();
                    if waited >= policy.timeout {
                        warn!(
                            path = %path.display(),
                            waited_ms = waited.as_millis() as u64,
                            "Gave up waiting for pool lock"
                        );
                        return Err(PoolError::LockTimeout {
                            path: path.to_path_buf(),
                            waited_ms: waited.as_millis() as u64,
                        });
                    }
                    thread::sleep(policy.poll_interval.min(policy.timeout - waited));
                }
                Err(e) => {
                    return Err(PoolError::storage(
                        format!("Failed to lock {}", path.display()),
                        e,
                    ));
                }
            }
        }
    }

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PoolLock {
    fn drop(&mut self) {
        if let Err(e) = fs2::FileExt::unlock(&self.file) {
            warn!(path = %self.path.display(), error = %e, "Failed to release pool lock");
        } else {
            debug!(path = %self.path.display(), "Pool lock released");
        }
    }
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick() -> LockPolicy {
        LockPolicy {
            timeout: Duration::from_millis(100),
            poll_interval: Duration::from_millis(5),
        }
    }

    #[test]
    fn test_lock_path_for() {
        assert_eq!(
            lock_path_for(Path::new("data/premise_data.csv")),
            PathBuf::from("data/premise_data.csv.lock")
        );
    }

    #[test]
    fn test_second_holder_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pool.csv.lock");

        let held = PoolLock::acquire(&path, &quick()).unwrap();
        let started = Instant::now();
        let err = PoolLock::acquire(&path, &quick()).unwrap_err();

        assert!(matches!(err, PoolError::LockTimeout { .. }), "{err:?}");
        assert!(started.elapsed() >= Duration::from_millis(100));
        drop(held);
    }

    #[test]
    fn test_released_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pool.csv.lock");

        let first = PoolLock::acquire(&path, &quick()).unwrap();
        drop(first);

        let second = PoolLock::acquire(&path, &quick()).unwrap();
        assert_eq!(second.path(), path.as_path());
    }

    #[test]
    fn test_waiter_gets_lock_after_release() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pool.csv.lock");
        let held = PoolLock::acquire(&path, &quick()).unwrap();

        let waiter_path = path.clone();
        let waiter = thread::spawn(move || {
            let policy = LockPolicy {
                timeout: Duration::from_secs(5),
                poll_interval: Duration::from_millis(5),
            };
            PoolLock::acquire(&waiter_path, &policy).map(|_| ())
        });

        thread::sleep(Duration::from_millis(50));
        drop(held);

        assert!(waiter.join().unwrap().is_ok());
    }
}
