// ABOUTME: Image operations trait for the container runtime.
// ABOUTME: Splits pull failures into not-found (fatal) and unreachable (retryable).

use crate::types::ImageRef;
use async_trait::async_trait;

/// Image operations the rollout needs before anything can start.
#[async_trait]
pub trait ImageOps: Send + Sync {
    /// Pull an image from its registry. One attempt; retry policy lives in
    /// [`crate::runtime::pull_with_retry`].
    async fn pull_image(&self, reference: &ImageRef) -> Result<(), ImageError>;

    /// Check whether an image is already present locally.
    async fn image_exists(&self, reference: &ImageRef) -> Result<bool, ImageError>;
}

/// Errors from image operations.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    /// The registry answered and the image does not exist. Not retryable.
    #[error("image not found: {0}")]
    NotFound(String),

    /// The registry could not be reached or answered with a server error.
    /// Retryable with backoff.
    #[error("registry unreachable: {0}")]
    RegistryUnreachable(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}

impl ImageError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ImageError::RegistryUnreachable(_))
    }
}
