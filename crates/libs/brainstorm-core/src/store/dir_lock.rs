//! Advisory file locks with stale detection.
//!
//! Locks are plain files created with `O_CREAT | O_EXCL`, so acquisition is
//! atomic across processes. A metadata file written next to the lock records
//! who holds it; a holder that is provably dead, or older than any
//! legitimate hold time, is reclaimed by the next acquirer.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// Acquisition timeout applied by all callers.
pub const LOCK_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

/// Retry interval while another holder is live.
const RETRY_INTERVAL: std::time::Duration = std::time::Duration::from_millis(100);

/// Age beyond which a lock is presumed abandoned. All operations hold locks
/// for milliseconds; a minute-old lock means its holder is gone.
const STALE_AGE_SECS: i64 = 60;

/// Holder metadata stored next to the lock file.
#[derive(Debug, Serialize, Deserialize)]
struct LockOwner {
    pid: u32,
    acquired_at: DateTime<Utc>,
    holder: Option<String>,
    host: String,
}

/// Outcome of inspecting a contended lock's owner metadata.
enum HolderState {
    Live { pid: u32 },
    Stale,
    /// Owner file absent or unparseable; the lock file's own age decides.
    Unknown,
}

/// Whether `pid` is provably dead on this host.
///
/// Only trustworthy where `/proc` exists; elsewhere the age bound alone
/// reclaims abandoned locks.
fn process_is_dead(pid: u32) -> bool {
    #[cfg(target_os = "linux")]
    {
        !Path::new(&format!("/proc/{pid}")).exists()
    }

    #[cfg(not(target_os = "linux"))]
    {
        let _ = pid;
        false
    }
}

/// Advisory file lock scoped to one directory (`<dir>/.lock`).
pub struct DirLock {
    lock_path: PathBuf,
    owner_path: PathBuf,
}

impl DirLock {
    pub fn for_dir(dir: &Path) -> Self {
        Self {
            lock_path: dir.join(".lock"),
            owner_path: dir.join(".lock.owner"),
        }
    }

    /// Acquire the lock, reclaiming stale holders, bounded by `timeout`.
    ///
    /// Fails with [`Error::LockTimeout`] when a live holder keeps the lock
    /// past the deadline. The returned guard releases on drop.
    pub async fn acquire(
        &self,
        holder: Option<String>,
        timeout: std::time::Duration,
    ) -> Result<DirLockGuard> {
        if let Some(parent) = self.lock_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let deadline = std::time::Instant::now() + timeout;

        loop {
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&self.lock_path)
            {
                Ok(_) => {
                    self.write_owner(holder.as_deref())?;
                    tracing::debug!(path = %self.lock_path.display(), "Lock acquired");
                    return Ok(DirLockGuard {
                        lock_path: self.lock_path.clone(),
                        owner_path: self.owner_path.clone(),
                    });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    let owner_pid = match self.holder_state() {
                        HolderState::Stale => {
                            tracing::info!(
                                path = %self.lock_path.display(),
                                "Reclaiming stale lock"
                            );
                            self.force_cleanup();
                            continue;
                        }
                        HolderState::Live { pid } => pid,
                        HolderState::Unknown => {
                            // Owner metadata is written just after the lock
                            // file; only treat its absence as stale once the
                            // lock file itself has aged out.
                            if self.lock_file_aged_out() {
                                tracing::warn!(
                                    path = %self.lock_path.display(),
                                    "Lock file without owner metadata, forcing cleanup"
                                );
                                self.force_cleanup();
                                continue;
                            }
                            0
                        }
                    };

                    if std::time::Instant::now() >= deadline {
                        return Err(Error::LockTimeout {
                            path: self.lock_path.display().to_string(),
                            owner_pid,
                        });
                    }
                    tokio::time::sleep(RETRY_INTERVAL).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn write_owner(&self, holder: Option<&str>) -> Result<()> {
        let owner = LockOwner {
            pid: std::process::id(),
            acquired_at: Utc::now(),
            holder: holder.map(str::to_string),
            host: hostname::get()
                .map(|h| h.to_string_lossy().to_string())
                .unwrap_or_else(|_| "unknown".into()),
        };
        std::fs::write(&self.owner_path, serde_json::to_string_pretty(&owner)?)?;
        Ok(())
    }

    fn holder_state(&self) -> HolderState {
        let Ok(content) = std::fs::read_to_string(&self.owner_path) else {
            return HolderState::Unknown;
        };
        let Ok(owner) = serde_json::from_str::<LockOwner>(&content) else {
            return HolderState::Unknown;
        };

        let aged_out = Utc::now() - owner.acquired_at > chrono::Duration::seconds(STALE_AGE_SECS);
        if aged_out || process_is_dead(owner.pid) {
            HolderState::Stale
        } else {
            HolderState::Live { pid: owner.pid }
        }
    }

    fn lock_file_aged_out(&self) -> bool {
        let Ok(meta) = std::fs::metadata(&self.lock_path) else {
            return false;
        };
        let Ok(modified) = meta.modified() else {
            return false;
        };
        match modified.elapsed() {
            Ok(age) => age.as_secs() as i64 > STALE_AGE_SECS,
            Err(_) => false,
        }
    }

    fn force_cleanup(&self) {
        let _ = std::fs::remove_file(&self.lock_path);
        let _ = std::fs::remove_file(&self.owner_path);
    }
}

/// RAII guard for automatic lock release.
#[derive(Debug)]
pub struct DirLockGuard {
    lock_path: PathBuf,
    owner_path: PathBuf,
}

impl Drop for DirLockGuard {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.lock_path);
        let _ = std::fs::remove_file(&self.owner_path);
    }
}
