// ABOUTME: Reverse-proxy notification: publish the new upstream target after cutover.
// ABOUTME: FileNotifier rewrites an upstream config block and runs the reload command.

use crate::manifest::ProxySpec;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;

/// Where traffic for a service should go after cutover.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UpstreamTarget {
    /// Upstream block name in the proxy config.
    pub upstream: String,
    /// Backend address, host:port on loopback.
    pub addr: String,
}

/// Errors from publishing an upstream target.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("failed to write proxy config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("proxy reload command failed with {status}: {stderr}")]
    ReloadFailed {
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("failed to run proxy reload command: {0}")]
    ReloadSpawn(#[source] std::io::Error),
}

/// Tells the reverse proxy where the service now lives.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(&self, target: &UpstreamTarget) -> Result<(), NotifyError>;
}

/// Writes an nginx-style upstream block to a config file and reloads the proxy.
///
/// If the file already holds exactly the rendered block, nothing is written
/// and the reload is skipped, so repeated rollouts of the same target are
/// no-ops.
pub struct FileNotifier {
    config_path: PathBuf,
    reload_command: String,
}

impl FileNotifier {
    pub fn new(config_path: PathBuf, reload_command: String) -> Self {
        Self {
            config_path,
            reload_command,
        }
    }

    pub fn from_spec(spec: &ProxySpec) -> Self {
        Self::new(spec.config_path.clone(), spec.reload_command.clone())
    }

    fn render(target: &UpstreamTarget) -> String {
        format!(
            "upstream {} {{\n    server {};\n}}\n",
            target.upstream, target.addr
        )
    }

    async fn reload(&self) -> Result<(), NotifyError> {
        let output = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(&self.reload_command)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(NotifyError::ReloadSpawn)?;

        if !output.status.success() {
            return Err(NotifyError::ReloadFailed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for FileNotifier {
    async fn publish(&self, target: &UpstreamTarget) -> Result<(), NotifyError> {
        let rendered = Self::render(target);

        if let Ok(existing) = tokio::fs::read_to_string(&self.config_path).await
            && existing == rendered
        {
            tracing::debug!(
                path = %self.config_path.display(),
                "proxy config already points at {}, skipping reload",
                target.addr
            );
            return Ok(());
        }

        tokio::fs::write(&self.config_path, rendered)
            .await
            .map_err(|source| NotifyError::Io {
                path: self.config_path.clone(),
                source,
            })?;

        tracing::info!(
            upstream = %target.upstream,
            addr = %target.addr,
            "proxy config updated, reloading"
        );
        self.reload().await
    }
}

/// Notifier for manifests without a proxy block.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn publish(&self, _target: &UpstreamTarget) -> Result<(), NotifyError> {
        Ok(())
    }
}
