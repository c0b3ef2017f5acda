// ABOUTME: Per-service rollout lock, taken non-blocking via exclusive file creation.
// ABOUTME: A held lock means another rollout is in progress; stale locks are broken.

use chrono::{DateTime, Utc};
use gethostname::gethostname;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Locks older than this are assumed abandoned (crashed process, lost host)
/// and broken with a warning.
const STALE_AFTER_SECS: i64 = 3600;

/// Who holds a rollout lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    pub holder: String,
    pub pid: u32,
    pub started_at: DateTime<Utc>,
    pub service: String,
}

/// Errors acquiring the rollout lock.
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("rollout already in progress for {service} (held by {holder}, pid {pid})")]
    Held {
        service: String,
        holder: String,
        pid: u32,
        started_at: DateTime<Utc>,
    },

    #[error("failed to access lock file: {0}")]
    Io(#[from] std::io::Error),
}

/// Exclusive per-service rollout lock backed by a lock file.
///
/// Acquisition never blocks: if the file already exists and is fresh, the
/// caller gets `LockError::Held` immediately. The file is removed on
/// `release` and, best effort, on drop.
pub struct RolloutLock {
    path: PathBuf,
    released: bool,
}

impl RolloutLock {
    /// Try to take the lock for `service`. `force` breaks an existing lock.
    pub fn acquire(state_dir: &Path, service: &str, force: bool) -> Result<Self, LockError> {
        std::fs::create_dir_all(state_dir)?;
        let path = state_dir.join(format!("{service}.lock"));

        if force && path.exists() {
            tracing::warn!(service, "breaking existing rollout lock (--force)");
            std::fs::remove_file(&path)?;
        }

        loop {
            // create_new gives exclusive creation, the same primitive as
            // `set -o noclobber` in shell.
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    let info = LockInfo {
                        holder: gethostname().to_string_lossy().to_string(),
                        pid: std::process::id(),
                        started_at: Utc::now(),
                        service: service.to_string(),
                    };
                    let json = serde_json::to_string_pretty(&info)
                        .map_err(|e| std::io::Error::other(e.to_string()))?;
                    file.write_all(json.as_bytes())?;
                    return Ok(Self {
                        path,
                        released: false,
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    match Self::read_info(&path) {
                        Some(info)
                            if Utc::now() - info.started_at
                                < chrono::Duration::seconds(STALE_AFTER_SECS) =>
                        {
                            return Err(LockError::Held {
                                service: service.to_string(),
                                holder: info.holder,
                                pid: info.pid,
                                started_at: info.started_at,
                            });
                        }
                        Some(info) => {
                            tracing::warn!(
                                service,
                                holder = %info.holder,
                                pid = info.pid,
                                "breaking stale rollout lock from {}",
                                info.started_at
                            );
                        }
                        None => {
                            tracing::warn!(service, "breaking unreadable rollout lock");
                        }
                    }
                    // Stale or corrupt; remove and retry the exclusive create.
                    if let Err(e) = std::fs::remove_file(&path)
                        && e.kind() != ErrorKind::NotFound
                    {
                        return Err(LockError::Io(e));
                    }
                }
                Err(e) => return Err(LockError::Io(e)),
            }
        }
    }

    fn read_info(path: &Path) -> Option<LockInfo> {
        let content = std::fs::read_to_string(path).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Release the lock, removing the lock file.
    pub fn release(mut self) -> Result<(), LockError> {
        self.released = true;
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(LockError::Io(e)),
        }
    }
}

impl Drop for RolloutLock {
    fn drop(&mut self) {
        if !self.released {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}
