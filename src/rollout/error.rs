// ABOUTME: Rollout error taxonomy, one variant per distinct failure a caller acts on.
// ABOUTME: RolloutInProgress is the only variant with its own exit code.

use crate::manifest::ManifestError;
use chrono::{DateTime, Utc};

/// Errors from a rollout attempt.
#[derive(Debug, thiserror::Error)]
pub enum RolloutError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("image not found: {0}")]
    ImageNotFound(String),

    #[error("registry unreachable after {attempts} attempts: {message}")]
    RegistryUnreachable { attempts: u32, message: String },

    #[error("failed to start container: {0}")]
    StartFailed(String),

    #[error("health check did not pass within the deadline")]
    HealthCheckTimeout,

    #[error("rollout aborted")]
    Aborted,

    #[error("another rollout is in progress (held by {holder}, pid {pid}, since {started_at})")]
    RolloutInProgress {
        holder: String,
        pid: u32,
        started_at: DateTime<Utc>,
    },

    #[error("failed to notify reverse proxy: {0}")]
    ProxyNotifyFailed(String),

    #[error("rollback failed, manual cleanup needed: {0}")]
    RollbackFailed(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}
