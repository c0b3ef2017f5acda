// ABOUTME: Log streaming trait for the container runtime.
// ABOUTME: Follow or tail container output for the logs subcommand.

use crate::types::ContainerId;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

/// Log streaming operations.
#[async_trait]
pub trait LogOps: Send + Sync {
    /// Stream logs from a container.
    async fn container_logs(
        &self,
        id: &ContainerId,
        opts: &LogOptions,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<LogLine, LogError>> + Send>>, LogError>;
}

/// Options for log streaming.
#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Follow output (like `tail -f`).
    pub follow: bool,
    /// Prefix lines with runtime timestamps.
    pub timestamps: bool,
    /// Only the last N lines (None = all).
    pub tail: Option<u64>,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            follow: false,
            timestamps: true,
            tail: None,
        }
    }
}

/// A single log line from a container.
#[derive(Debug, Clone)]
pub struct LogLine {
    pub content: String,
    pub source: LogSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSource {
    Stdout,
    Stderr,
}

/// Errors from log operations.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("container not found: {0}")]
    ContainerNotFound(String),

    #[error("log stream error: {0}")]
    Stream(String),
}
