// ABOUTME: Capability traits the rollout controller drives the runtime through.
// ABOUTME: ImageOps, ContainerOps, and LogOps; kept unsealed so tests can stub them.

mod container;
mod image;
mod logs;
mod shared_types;

pub use container::{
    ContainerError, ContainerFilters, ContainerOps, ContainerState, ContainerSummary,
};
pub use image::{ImageError, ImageOps};
pub use logs::{LogError, LogLine, LogOps, LogOptions, LogSource};
pub use shared_types::{ContainerInfo, ContainerSpec};
