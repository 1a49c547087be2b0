//! Advisory lock around the transaction state's read-modify-write cycle.
//!
//! Hook invocations are short-lived processes that all share one state
//! document; without a lock, two overlapping invocations can each load,
//! mutate, and save — silently dropping one side's update. `StateLock`
//! serializes them.
//!
//! ## Race safety
//!
//! `acquire()` uses `O_CREAT | O_EXCL` to atomically create the lockfile.
//! If two processes race, exactly one wins the create — the loser retries
//! with a short backoff.
//!
//! ## Stale lock recovery
//!
//! The lockfile records the holder's PID. If that process is dead (crash,
//! SIGKILL), the stale lockfile is removed automatically and the next
//! acquire succeeds.

use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, TxError};

const LOCK_FILE_NAME: &str = "state.lock";
const ACQUIRE_ATTEMPTS: u32 = 50;
const RETRY_DELAY: Duration = Duration::from_millis(20);

/// Identity written into the lockfile so stale holders can be detected.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LockHolder {
    pid: u32,
    acquired_at: String,
}

impl LockHolder {
    fn current() -> Self {
        Self {
            pid: std::process::id(),
            acquired_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    fn is_alive(&self) -> bool {
        pid_alive(self.pid)
    }
}

/// RAII guard over the state lockfile. Released on drop.
#[derive(Debug)]
pub struct StateLock {
    path: PathBuf,
}

impl StateLock {
    /// Acquire the lock for a state directory, retrying with backoff while
    /// a live holder exists. Returns [`TxError::LockBusy`] once the retry
    /// budget is exhausted.
    pub fn acquire(state_dir: &Path) -> Result<Self> {
        let path = state_dir.join(LOCK_FILE_NAME);
        std::fs::create_dir_all(state_dir)?;

        for _ in 0..ACQUIRE_ATTEMPTS {
            match Self::try_create(&path) {
                Ok(()) => return Ok(Self { path }),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    match Self::read_holder(&path) {
                        Some(holder) if holder.is_alive() => {
                            std::thread::sleep(RETRY_DELAY);
                        }
                        _ => {
                            // Stale or unreadable — remove and retry immediately.
                            tracing::info!(
                                path = %path.display(),
                                "removing stale state lock"
                            );
                            let _ = std::fs::remove_file(&path);
                        }
                    }
                }
                Err(e) => return Err(TxError::Io(e)),
            }
        }

        Err(TxError::LockBusy(path.display().to_string()))
    }

    /// Exclusive create + write of the holder record.
    fn try_create(path: &Path) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true) // O_CREAT | O_EXCL — fails if file exists
            .open(path)?;
        let json = serde_json::to_string(&LockHolder::current())
            .map_err(std::io::Error::other)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    /// Read the holder record. `None` if missing or unparseable.
    fn read_holder(path: &Path) -> Option<LockHolder> {
        let content = std::fs::read_to_string(path).ok()?;
        serde_json::from_str(&content).ok()
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Check if a process with the given PID is alive.
#[cfg(unix)]
fn pid_alive(pid: u32) -> bool {
    // SAFETY: kill with signal 0 checks existence without sending a signal.
    unsafe { libc::kill(pid as i32, 0) == 0 }
}

#[cfg(not(unix))]
fn pid_alive(_pid: u32) -> bool {
    // On non-Unix platforms, assume alive (conservative — avoids accidental cleanup).
    true
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_pid_is_alive() {
        assert!(pid_alive(std::process::id()));
    }

    #[test]
    fn bogus_pid_is_dead() {
        // PID 4_000_000 is extremely unlikely to exist.
        assert!(!pid_alive(4_000_000));
    }

    #[test]
    fn acquire_and_release() {
        let dir = tempfile::tempdir().unwrap();
        let lock_path = dir.path().join(LOCK_FILE_NAME);

        {
            let _lock = StateLock::acquire(dir.path()).unwrap();
            assert!(lock_path.exists());
        }
        // Dropped — lockfile gone
        assert!(!lock_path.exists());
    }

    #[test]
    fn second_acquire_while_held_is_busy() {
        let dir = tempfile::tempdir().unwrap();
        let _held = StateLock::acquire(dir.path()).unwrap();

        // Same process is alive, so the second acquire burns its retry
        // budget and reports busy.
        match StateLock::acquire(dir.path()) {
            Err(TxError::LockBusy(_)) => {}
            other => panic!("expected LockBusy, got {other:?}"),
        }
    }

    #[test]
    fn stale_lock_from_dead_pid_is_recovered() {
        let dir = tempfile::tempdir().unwrap();
        let lock_path = dir.path().join(LOCK_FILE_NAME);
        let stale = LockHolder {
            pid: 4_000_000,
            acquired_at: chrono::Utc::now().to_rfc3339(),
        };
        std::fs::write(&lock_path, serde_json::to_string(&stale).unwrap()).unwrap();

        let _lock = StateLock::acquire(dir.path()).unwrap();
        assert!(lock_path.exists());
    }

    #[test]
    fn unreadable_lock_is_recovered() {
        let dir = tempfile::tempdir().unwrap();
        let lock_path = dir.path().join(LOCK_FILE_NAME);
        std::fs::write(&lock_path, "garbage").unwrap();

        let _lock = StateLock::acquire(dir.path()).unwrap();
    }
}
