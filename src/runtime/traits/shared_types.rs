// ABOUTME: Shared types used across runtime trait definitions.
// ABOUTME: ContainerSpec for creation and ContainerInfo from inspection.

use crate::manifest::{PortBinding, RestartPolicy};
use crate::types::{ContainerId, ImageRef};
use std::collections::HashMap;
use std::time::Duration;

use super::ContainerState;

/// Everything the driver needs to create a container.
#[derive(Debug, Clone)]
pub struct ContainerSpec {
    /// Container name (service name plus deployment slot suffix).
    pub name: String,
    /// Image to run.
    pub image: ImageRef,
    /// Resolved environment variables.
    pub env: HashMap<String, String>,
    /// Labels identifying managed containers.
    pub labels: HashMap<String, String>,
    /// Host-to-container port bindings.
    pub ports: Vec<PortBinding>,
    /// Restart policy applied by the runtime itself.
    pub restart: RestartPolicy,
    /// Default stop grace period recorded on the container.
    pub stop_grace: Duration,
}

/// Detailed information about a container.
#[derive(Debug, Clone)]
pub struct ContainerInfo {
    pub id: ContainerId,
    pub name: String,
    pub image: String,
    pub state: ContainerState,
    pub labels: HashMap<String, String>,
}
