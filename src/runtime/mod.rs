// ABOUTME: Container runtime layer: capability traits, detection, and the bollard driver.
// ABOUTME: Docker and Podman are both reached over the Docker-compatible unix socket API.

mod bollard;
mod detection;
mod retry;
mod traits;
mod types;

pub use bollard::{BollardDriver, ConnectError};
pub use detection::{DetectionError, detect_local};
pub use retry::{RetryPolicy, pull_with_retry};
pub use traits::{
    ContainerError, ContainerFilters, ContainerInfo, ContainerOps, ContainerSpec, ContainerState,
    ContainerSummary, ImageError, ImageOps, LogError, LogLine, LogOps, LogOptions, LogSource,
};
pub use types::{RuntimeInfo, RuntimeType};
