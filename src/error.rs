// ABOUTME: Top-level error type for the CLI, aggregating module errors.
// ABOUTME: Maps errors to process exit codes; a held lock gets its own code.

use crate::manifest::ManifestError;
use crate::rollout::{HistoryError, LockError, RolloutError};
use crate::runtime::{ConnectError, ContainerError, DetectionError, LogError};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Rollout(#[from] RolloutError),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    Detection(#[from] DetectionError),

    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error(transparent)]
    Log(#[from] LogError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Process exit code for this error. A rollout already in progress is
    /// distinguishable so scripts can retry later.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Rollout(RolloutError::RolloutInProgress { .. })
            | Error::Lock(LockError::Held { .. }) => 3,
            _ => 1,
        }
    }
}
