//! # Advisory File Lock
//!
//! Cooperative, marker-file-based mutual exclusion for files shared
//! between processes (and hosts) on filesystems with no native locking
//! guarantee, such as NFS mounts.
//!
//! ## Protocol
//!
//! A lock on `datasets.xml` is the existence of `datasets.xml.lock` next
//! to it. Acquisition writes a fresh random token into the marker with
//! `create_new` (atomic create-if-not-exists where the filesystem
//! provides it), then reads the marker back and wins only if the content
//! equals the token. The read-back is a heuristic second check for
//! filesystems where `O_EXCL` is unreliable — it narrows the race window
//! between two creators, it does not close it. This is advisory locking:
//! every writer must go through [`FileLock`], nothing stops a process
//! that does not.
//!
//! ## Stale markers
//!
//! A holder that crashes leaves its marker behind and blocks all writers
//! until an operator removes it. That is deliberate: breaking a lock that
//! might still be held risks corrupting the guarded file. Deployments
//! that prefer availability can opt in via
//! [`FileLock::with_break_stale_after`].

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use thiserror::Error;
use uuid::Uuid;

/// Suffix appended to the target path to form the marker path.
pub const LOCK_SUFFIX: &str = ".lock";

/// Lock acquisition failure.
#[derive(Error, Debug)]
pub enum LockError {
    /// The marker could not be won within the attempt budget.
    #[error("could not obtain lock file on {path} after {attempts} attempts")]
    NotAcquired {
        /// The guarded file (not the marker).
        path: PathBuf,
        /// How many attempts were made before giving up.
        attempts: u32,
    },
}

/// An advisory lock over one target file.
///
/// Cheap to construct; holds no resources until [`FileLock::acquire`].
#[derive(Debug, Clone)]
pub struct FileLock {
    path: PathBuf,
    marker: PathBuf,
    max_attempts: u32,
    retry_delay: Duration,
    break_stale_after: Option<Duration>,
}

impl FileLock {
    /// Create a lock for `path` with the given attempt budget.
    ///
    /// `max_attempts` is clamped to at least one. `retry_delay` is slept
    /// between attempts, not after the last one.
    pub fn new(path: impl Into<PathBuf>, max_attempts: u32, retry_delay: Duration) -> Self {
        let path = path.into();
        let marker = marker_path(&path);
        Self {
            path,
            marker,
            max_attempts: max_attempts.max(1),
            retry_delay,
            break_stale_after: None,
        }
    }

    /// Opt in to breaking markers older than `age` before an attempt.
    ///
    /// Off by default. Breaking a marker whose holder is merely slow, not
    /// dead, removes the mutual exclusion the holder believes it has.
    #[must_use]
    pub fn with_break_stale_after(mut self, age: Duration) -> Self {
        self.break_stale_after = Some(age);
        self
    }

    /// The guarded file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Acquire the lock, retrying up to the attempt budget.
    ///
    /// The returned guard removes the marker when dropped. Failure to
    /// acquire is fatal to the calling operation: the caller must not
    /// read or mutate the guarded file without the guard.
    pub fn acquire(&self) -> Result<LockGuard, LockError> {
        for attempt in 1..=self.max_attempts {
            if self.try_acquire_once() {
                tracing::debug!(path = %self.path.display(), attempt, "lock acquired");
                return Ok(LockGuard {
                    marker: self.marker.clone(),
                });
            }
            if attempt < self.max_attempts {
                std::thread::sleep(self.retry_delay);
            }
        }
        Err(LockError::NotAcquired {
            path: self.path.clone(),
            attempts: self.max_attempts,
        })
    }

    /// One acquisition attempt. Any I/O failure counts as a lost attempt.
    fn try_acquire_once(&self) -> bool {
        self.maybe_break_stale();
        let token = fresh_token();
        let created = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.marker)
            .and_then(|mut marker| marker.write_all(token.as_bytes()));
        match created {
            Ok(()) => matches!(fs::read_to_string(&self.marker), Ok(content) if content == token),
            Err(_) => false,
        }
    }

    /// Remove a marker older than the configured stale age, if opted in.
    fn maybe_break_stale(&self) {
        let Some(age) = self.break_stale_after else {
            return;
        };
        let Ok(modified) = fs::metadata(&self.marker).and_then(|meta| meta.modified()) else {
            return;
        };
        if modified.elapsed().map(|elapsed| elapsed > age).unwrap_or(false)
            && fs::remove_file(&self.marker).is_ok()
        {
            tracing::warn!(
                marker = %self.marker.display(),
                stale_after_secs = age.as_secs(),
                "broke stale lock marker"
            );
        }
    }
}

/// Scoped ownership of an acquired lock.
///
/// Dropping the guard deletes the marker. Deletion of an already-missing
/// marker is not an error, so release is idempotent.
#[must_use = "dropping the guard releases the lock"]
#[derive(Debug)]
pub struct LockGuard {
    marker: PathBuf,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.marker) {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(marker = %self.marker.display(), %err, "failed to remove lock marker");
            }
        }
    }
}

/// Marker path for a target: the target file name plus [`LOCK_SUFFIX`].
fn marker_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(LOCK_SUFFIX);
    path.with_file_name(name)
}

/// A token unpredictable and unique enough that two racing acquirers
/// never write the same content: uuid + pid + wall-clock nanos.
fn fresh_token() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|since| since.as_nanos())
        .unwrap_or_default();
    format!("{}.{}.{}", Uuid::new_v4(), std::process::id(), nanos)
}
