// ABOUTME: Opaque container identifier returned by the runtime driver.
// ABOUTME: Wraps the runtime-assigned ID string; never parsed or synthesized.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle to a container, as assigned by the runtime.
///
/// The rollout controller only ever holds and passes these around; all
/// interpretation of the value stays inside the runtime driver.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[must_use = "container handles reference live resources and should not be ignored"]
pub struct ContainerId(String);

impl ContainerId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// Shortened form for display, matching the runtime CLI convention.
    pub fn short(&self) -> &str {
        let end = self.0.len().min(12);
        &self.0[..end]
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
