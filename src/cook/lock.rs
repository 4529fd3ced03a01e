// src/cook/lock.rs

//! Cross-process exclusivity for cook runs
//!
//! Two cookers writing the same content tree would race on outputs and the
//! database, so each run holds an advisory lock on
//! `<source_dir>/CookerLock.txt` for its whole lifetime. Only the lock is
//! released on drop; the file stays so every cooker locks the same inode.

use crate::error::{Error, Result};
use fs2::FileExt;
use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Lock file name inside the source directory
pub const LOCK_FILE_NAME: &str = "CookerLock.txt";

const RETRY_INTERVAL: Duration = Duration::from_secs(1);
const REPORT_INTERVAL: Duration = Duration::from_secs(5);

/// Held cooker lock, released when dropped
pub struct CookerLock {
    file: File,
    path: PathBuf,
}

impl CookerLock {
    /// Acquire the lock for `source_dir`, waiting up to `timeout`
    pub fn acquire(source_dir: &Path, timeout: Duration) -> Result<Self> {
        let path = source_dir.join(LOCK_FILE_NAME);
        let start = Instant::now();
        let mut last_report = start;

        loop {
            if let Some(lock) = Self::try_acquire_at(&path)? {
                return Ok(lock);
            }

            let waited = start.elapsed();
            if waited >= timeout {
                return Err(Error::Lock {
                    path,
                    reason: format!("still held by another cooker after {}s", waited.as_secs()),
                });
            }
            if last_report.elapsed() >= REPORT_INTERVAL {
                warn!(
                    "Waiting for cooker lock at {} ({}s of {}s)",
                    path.display(),
                    waited.as_secs(),
                    timeout.as_secs()
                );
                last_report = Instant::now();
            }
            thread::sleep(RETRY_INTERVAL.min(timeout - waited));
        }
    }

    /// Try once; `Ok(None)` if another process holds the lock
    pub fn try_acquire(source_dir: &Path) -> Result<Option<Self>> {
        Self::try_acquire_at(&source_dir.join(LOCK_FILE_NAME))
    }

    fn try_acquire_at(path: &Path) -> Result<Option<Self>> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| lock_error(path, e))?;
        }
        let file = File::create(path).map_err(|e| lock_error(path, e))?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                info!("Acquired cooker lock at {}", path.display());
                Ok(Some(Self {
                    file,
                    path: path.to_path_buf(),
                }))
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                debug!("Cooker lock already held at {}", path.display());
                Ok(None)
            }
            Err(e) => Err(lock_error(path, e)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CookerLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            warn!("Failed releasing cooker lock at {}: {}", self.path.display(), e);
        }
        debug!("Released cooker lock at {}", self.path.display());
    }
}

fn lock_error(path: &Path, e: std::io::Error) -> Error {
    Error::Lock {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_acquire_and_release() {
        let temp = TempDir::new().unwrap();
        let lock = CookerLock::acquire(temp.path(), Duration::from_secs(1)).unwrap();
        assert!(lock.path().ends_with(LOCK_FILE_NAME));
        assert!(lock.path().exists());

        let path = lock.path().to_path_buf();
        drop(lock);
        assert!(path.exists());
    }

    #[test]
    fn test_second_cooker_is_refused() {
        let temp = TempDir::new().unwrap();
        let _held = CookerLock::try_acquire(temp.path()).unwrap().unwrap();

        assert!(CookerLock::try_acquire(temp.path()).unwrap().is_none());
        let result = CookerLock::acquire(temp.path(), Duration::ZERO);
        assert!(matches!(result, Err(Error::Lock { .. })));
    }

    #[test]
    fn test_waiter_on_released_file_excludes_newcomers() {
        let temp = TempDir::new().unwrap();
        let held = CookerLock::try_acquire(temp.path()).unwrap().unwrap();
        let waiter = File::open(held.path()).unwrap();
        drop(held);

        waiter.try_lock_exclusive().unwrap();
        assert!(CookerLock::try_acquire(temp.path()).unwrap().is_none());

        waiter.unlock().unwrap();
        assert!(CookerLock::try_acquire(temp.path()).unwrap().is_some());
    }

    #[test]
    fn test_reacquire_after_release() {
        let temp = TempDir::new().unwrap();
        drop(CookerLock::try_acquire(temp.path()).unwrap().unwrap());
        assert!(CookerLock::try_acquire(temp.path()).unwrap().is_some());
    }
}
