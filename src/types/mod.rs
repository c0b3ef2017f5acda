// ABOUTME: Validated domain types shared across the crate.
// ABOUTME: Container identifiers, service names, and image references.

mod container_name;
mod id;
mod image_ref;

pub use container_name::{ContainerName, ContainerNameError};
pub use id::ContainerId;
pub use image_ref::{ImageRef, ImageRefError};
