// ABOUTME: Health check parameters for the post-start health gate.
// ABOUTME: interval/timeout use humantime strings; timeout is the total deadline.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Health gate parameters.
///
/// `timeout` bounds the whole gate, not a single probe: a flapping endpoint
/// resets the success streak but never extends the deadline. `retries` is the
/// number of consecutive successful probes required before the container is
/// declared healthy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheckSpec {
    /// Request path probed on the new container, e.g. `/health`.
    pub path: String,

    /// Base host port the probe connects to. Like the port bindings, this is
    /// shifted by the deployment slot, so the probe always reaches the new
    /// container rather than the one still serving.
    pub port: u16,

    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,

    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    #[serde(default = "default_retries")]
    pub retries: u32,
}

fn default_interval() -> Duration {
    Duration::from_secs(2)
}

fn default_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_retries() -> u32 {
    3
}
