// ABOUTME: Rollout orchestration: typestate pipeline, history, lock, and error taxonomy.
// ABOUTME: Also owns state-dir resolution and lookup of the currently active container.

mod error;
mod lock;
mod record;
mod state;
mod transitions;

pub use error::RolloutError;
pub use lock::{LockError, LockInfo, RolloutLock};
pub use record::{HistoryError, HistoryStore, Outcome, RolloutRecord};
pub use state::{Completed, HealthChecked, Initialized, Pulled, Started, State, Swapped};
pub use transitions::{Rollout, Slot, TransitionResult};

use crate::runtime::{ContainerError, ContainerFilters, ContainerOps, ContainerSummary};
use crate::types::ContainerName;
use std::path::PathBuf;

/// Directory for locks and rollout history.
///
/// `RELEVO_STATE_DIR` overrides the default of `$HOME/.local/state/relevo`.
pub fn state_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("RELEVO_STATE_DIR") {
        return PathBuf::from(dir);
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".local/state/relevo")
}

/// The running container this tool manages for `service`, if any.
pub async fn find_active_container<R: ContainerOps + ?Sized>(
    runtime: &R,
    service: &ContainerName,
) -> Result<Option<ContainerSummary>, ContainerError> {
    let containers = runtime
        .list_containers(&ContainerFilters::for_service(service, false))
        .await?;
    Ok(containers.into_iter().find(|c| c.state.is_running()))
}
