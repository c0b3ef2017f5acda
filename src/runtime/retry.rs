// ABOUTME: Bounded-retry image pull with exponential backoff.
// ABOUTME: Only registry-unreachable failures are retried; not-found is surfaced at once.

use super::{ImageError, ImageOps};
use crate::types::ImageRef;
use std::time::Duration;

/// Retry policy for image pulls.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub attempts: u32,
    /// Backoff before the second attempt; doubles each retry.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Delay after the given 1-based failed attempt: base * 2^(attempt-1).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

/// Pull an image, retrying transient registry failures per `policy`.
pub async fn pull_with_retry<R: ImageOps + ?Sized>(
    runtime: &R,
    image: &ImageRef,
    policy: &RetryPolicy,
) -> Result<(), ImageError> {
    let mut attempt = 1;
    loop {
        match runtime.pull_image(image).await {
            Ok(()) => return Ok(()),
            Err(e) if e.is_retryable() && attempt < policy.attempts => {
                let delay = policy.delay_after(attempt);
                tracing::warn!(
                    attempt,
                    delay_secs = delay.as_secs_f64(),
                    "image pull failed, retrying: {e}"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
