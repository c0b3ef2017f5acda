// ABOUTME: Release manifest loading and validation (relevo.yml).
// ABOUTME: Produces an immutable ReleaseDescriptor or an InvalidManifest-class error.

mod env_ref;
mod health;
mod init;
mod port;
mod proxy;
mod restart;

pub use env_ref::resolve_env_refs;
pub use health::HealthCheckSpec;
pub use init::init_manifest;
pub use port::{PortBinding, PortBindingError, Protocol};
pub use proxy::ProxySpec;
pub use restart::RestartPolicy;

use crate::types::{ContainerName, ImageRef};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const MANIFEST_FILENAME: &str = "relevo.yml";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("manifest not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("manifest already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("failed to read manifest: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid manifest: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid manifest: {0}")]
    Invalid(String),

    #[error("invalid manifest: duplicate env reference \"{0}\"")]
    DuplicateEnvRef(String),

    #[error("invalid manifest: health check path must start with '/', got \"{0}\"")]
    BadHealthPath(String),

    #[error("invalid manifest: health check port must be within 1-65534")]
    BadHealthPort,

    #[error("invalid manifest: health check port {0} is not one of the published host ports")]
    HealthPortNotPublished(u16),

    #[error("invalid manifest: host port {0} leaves no room for the standby slot port")]
    HostPortAtMax(u16),

    #[error(
        "invalid manifest: host ports {0} and {1} overlap across deployment slots \
         (each binding also reserves the next port up)"
    )]
    HostPortsOverlap(u16, u16),

    #[error("invalid manifest: health check retries must be at least 1")]
    ZeroRetries,

    #[error("invalid manifest: proxy requires at least one port binding")]
    ProxyWithoutPorts,

    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
}

/// Everything one rollout attempt needs to know, loaded once and never
/// mutated. A new deployment is always a new descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseDescriptor {
    /// Service name; also the container name prefix.
    pub service: ContainerName,

    /// Image to roll out.
    pub image: ImageRef,

    /// Ordered host-to-container port bindings. Each `host` value is the base
    /// of an adjacent port pair: the blue slot publishes `host`, the green
    /// slot `host + 1`, so both slots can listen side by side during a
    /// rollout.
    #[serde(default)]
    pub ports: Vec<PortBinding>,

    /// Names of environment variables forwarded from the caller's
    /// environment into the container.
    #[serde(default)]
    pub env: Vec<String>,

    /// Health gate parameters for the new container.
    pub health: HealthCheckSpec,

    #[serde(default)]
    pub restart: RestartPolicy,

    /// How long `stop` waits for the old container before forcing removal.
    #[serde(default = "default_stop_grace", with = "humantime_serde")]
    pub stop_grace: Duration,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxySpec>,
}

fn default_stop_grace() -> Duration {
    Duration::from_secs(30)
}

impl ReleaseDescriptor {
    pub fn from_yaml(yaml: &str) -> Result<Self, ManifestError> {
        let descriptor: ReleaseDescriptor = serde_yaml::from_str(yaml)?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        if !path.exists() {
            return Err(ManifestError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn to_yaml(&self) -> Result<String, ManifestError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Semantic checks that serde cannot express.
    fn validate(&self) -> Result<(), ManifestError> {
        let mut seen = HashSet::new();
        for name in &self.env {
            if !seen.insert(name.as_str()) {
                return Err(ManifestError::DuplicateEnvRef(name.clone()));
            }
        }

        if !self.health.path.starts_with('/') {
            return Err(ManifestError::BadHealthPath(self.health.path.clone()));
        }
        // The port above the base belongs to the standby slot, so the base
        // can never be the last port.
        if self.health.port == 0 || self.health.port == u16::MAX {
            return Err(ManifestError::BadHealthPort);
        }
        if self.health.retries == 0 {
            return Err(ManifestError::ZeroRetries);
        }

        for (i, binding) in self.ports.iter().enumerate() {
            if binding.host == u16::MAX {
                return Err(ManifestError::HostPortAtMax(binding.host));
            }
            for other in &self.ports[i + 1..] {
                if binding.host.abs_diff(other.host) <= 1 {
                    return Err(ManifestError::HostPortsOverlap(binding.host, other.host));
                }
            }
        }
        if !self.ports.is_empty() && !self.ports.iter().any(|b| b.host == self.health.port) {
            return Err(ManifestError::HealthPortNotPublished(self.health.port));
        }

        if self.proxy.is_some() && self.ports.is_empty() {
            return Err(ManifestError::ProxyWithoutPorts);
        }

        Ok(())
    }

    /// Upstream block name for the reverse proxy.
    pub fn upstream_name(&self) -> &str {
        self.proxy
            .as_ref()
            .and_then(|p| p.upstream.as_deref())
            .unwrap_or_else(|| self.service.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = "\
service: my-app
image: app:v2
ports:
  - \"8080:80\"
health:
  path: /health
  port: 8080
";

    #[test]
    fn loads_minimal_manifest_with_defaults() {
        let d = ReleaseDescriptor::from_yaml(MINIMAL).unwrap();
        assert_eq!(d.service.as_str(), "my-app");
        assert_eq!(d.image.to_string(), "app:v2");
        assert_eq!(d.health.interval, Duration::from_secs(2));
        assert_eq!(d.health.timeout, Duration::from_secs(120));
        assert_eq!(d.health.retries, 3);
        assert_eq!(d.restart, RestartPolicy::Always);
        assert_eq!(d.stop_grace, Duration::from_secs(30));
        assert!(d.proxy.is_none());
    }

    #[test]
    fn missing_required_field_is_invalid() {
        let err = ReleaseDescriptor::from_yaml("service: my-app\n").unwrap_err();
        assert!(matches!(err, ManifestError::Parse(_)));
    }

    #[test]
    fn duplicate_env_refs_are_rejected() {
        let yaml = format!("{MINIMAL}env:\n  - DB_URL\n  - DB_URL\n");
        let err = ReleaseDescriptor::from_yaml(&yaml).unwrap_err();
        assert!(matches!(err, ManifestError::DuplicateEnvRef(name) if name == "DB_URL"));
    }

    #[test]
    fn health_path_must_be_absolute() {
        let yaml = MINIMAL.replace("/health", "health");
        let err = ReleaseDescriptor::from_yaml(&yaml).unwrap_err();
        assert!(matches!(err, ManifestError::BadHealthPath(_)));
    }

    #[test]
    fn zero_health_retries_rejected() {
        // MINIMAL ends inside the health block, so the extra key lands there
        let yaml = format!("{MINIMAL}  retries: 0\n");
        let err = ReleaseDescriptor::from_yaml(&yaml).unwrap_err();
        assert!(matches!(err, ManifestError::ZeroRetries));
    }

    #[test]
    fn proxy_requires_ports() {
        let yaml = "\
service: my-app
image: app:v2
health:
  path: /health
  port: 8080
proxy:
  config_path: /etc/nginx/conf.d/my-app.conf
";
        let err = ReleaseDescriptor::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ManifestError::ProxyWithoutPorts));
    }

    #[test]
    fn upstream_defaults_to_service_name() {
        let d = ReleaseDescriptor::from_yaml(MINIMAL).unwrap();
        assert_eq!(d.upstream_name(), "my-app");
    }

    #[test]
    fn host_ports_must_not_overlap_across_slots() {
        // 8081 is 8080's standby slot port.
        let yaml = MINIMAL.replace(
            "ports:\n  - \"8080:80\"",
            "ports:\n  - \"8080:80\"\n  - \"8081:81\"",
        );
        let err = ReleaseDescriptor::from_yaml(&yaml).unwrap_err();
        assert!(matches!(err, ManifestError::HostPortsOverlap(8080, 8081)));
    }

    #[test]
    fn duplicate_host_ports_are_rejected() {
        let yaml = MINIMAL.replace(
            "ports:\n  - \"8080:80\"",
            "ports:\n  - \"8080:80\"\n  - \"8080:81\"",
        );
        let err = ReleaseDescriptor::from_yaml(&yaml).unwrap_err();
        assert!(matches!(err, ManifestError::HostPortsOverlap(8080, 8080)));
    }

    #[test]
    fn last_host_port_leaves_no_standby_room() {
        let yaml = MINIMAL
            .replace("8080:80", "65535:80")
            .replace("port: 8080", "port: 65534");
        let err = ReleaseDescriptor::from_yaml(&yaml).unwrap_err();
        assert!(matches!(err, ManifestError::HostPortAtMax(65535)));
    }

    #[test]
    fn health_port_must_be_published() {
        let yaml = MINIMAL.replace("port: 8080", "port: 9000");
        let err = ReleaseDescriptor::from_yaml(&yaml).unwrap_err();
        assert!(matches!(err, ManifestError::HealthPortNotPublished(9000)));
    }
}
