// ABOUTME: Container lifecycle operations trait for the runtime driver.
// ABOUTME: Create, start, stop with a grace period, remove, inspect, and list.

use super::shared_types::{ContainerInfo, ContainerSpec};
use crate::types::{ContainerId, ContainerName};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

/// Container lifecycle operations.
#[async_trait]
pub trait ContainerOps: Send + Sync {
    /// Create a container from the given spec. Does not start it.
    async fn create_container(&self, spec: &ContainerSpec) -> Result<ContainerId, ContainerError>;

    /// Start a created container.
    async fn start_container(&self, id: &ContainerId) -> Result<(), ContainerError>;

    /// Stop a running container: send the termination signal and wait up to
    /// `grace` before the runtime kills it. This bounds how long a rollback
    /// or cutover can block.
    async fn stop_container(&self, id: &ContainerId, grace: Duration)
    -> Result<(), ContainerError>;

    /// Remove a container, forcibly if requested.
    async fn remove_container(&self, id: &ContainerId, force: bool) -> Result<(), ContainerError>;

    /// Get detailed information about a container.
    async fn inspect_container(&self, id: &ContainerId) -> Result<ContainerInfo, ContainerError>;

    /// List containers matching the given filters.
    async fn list_containers(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError>;
}

/// Filters for listing containers.
#[derive(Debug, Clone, Default)]
pub struct ContainerFilters {
    /// Label filters (key=value, all must match).
    pub labels: HashMap<String, String>,
    /// Name filter (partial match).
    pub name: Option<String>,
    /// Include stopped containers.
    pub all: bool,
}

impl ContainerFilters {
    /// Filters selecting the containers this tool manages for a service.
    pub fn for_service(service: &ContainerName, all: bool) -> Self {
        let mut labels = HashMap::new();
        labels.insert("relevo.managed".to_string(), "true".to_string());
        labels.insert("relevo.service".to_string(), service.to_string());
        Self {
            labels,
            name: None,
            all,
        }
    }
}

/// Coarse container state as reported by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Created,
    Running,
    Paused,
    Restarting,
    Removing,
    Exited,
    Dead,
}

impl ContainerState {
    pub fn is_running(self) -> bool {
        matches!(self, ContainerState::Running | ContainerState::Restarting)
    }
}

/// Summary entry from a container listing.
#[derive(Debug, Clone)]
pub struct ContainerSummary {
    pub id: ContainerId,
    pub name: String,
    pub image: String,
    pub state: ContainerState,
    pub labels: HashMap<String, String>,
}

/// Errors from container operations.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("container not found: {0}")]
    NotFound(String),

    #[error("container already exists: {0}")]
    AlreadyExists(String),

    #[error("container not running: {0}")]
    NotRunning(String),

    #[error("image not found locally: {0}")]
    ImageMissing(String),

    #[error("host port already in use: {0}")]
    PortInUse(String),

    #[error("invalid container spec: {0}")]
    InvalidSpec(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}
