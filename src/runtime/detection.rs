// ABOUTME: Local container runtime detection for Docker and Podman.
// ABOUTME: Honors DOCKER_HOST, then probes the well-known socket paths.

use super::types::{RuntimeInfo, RuntimeType};
use std::path::Path;

const DOCKER_SOCKET: &str = "/var/run/docker.sock";
const ROOTFUL_PODMAN: &str = "/run/podman/podman.sock";

/// Error during runtime detection.
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("no container runtime found (checked DOCKER_HOST, Docker and Podman sockets)")]
    NoRuntimeFound,
}

/// Detect the container runtime on this host.
///
/// Order:
/// 1. `DOCKER_HOST` pointing at a unix socket
/// 2. Docker socket (`/var/run/docker.sock`)
/// 3. Rootful Podman socket (`/run/podman/podman.sock`)
/// 4. Rootless Podman socket (`/run/user/$UID/podman/podman.sock`)
pub fn detect_local() -> Result<RuntimeInfo, DetectionError> {
    if let Ok(host) = std::env::var("DOCKER_HOST")
        && let Some(path) = host.strip_prefix("unix://")
        && Path::new(path).exists()
    {
        return Ok(RuntimeInfo {
            runtime_type: RuntimeType::Docker,
            socket_path: path.to_string(),
        });
    }

    if Path::new(DOCKER_SOCKET).exists() {
        return Ok(RuntimeInfo {
            runtime_type: RuntimeType::Docker,
            socket_path: DOCKER_SOCKET.to_string(),
        });
    }

    if Path::new(ROOTFUL_PODMAN).exists() {
        return Ok(RuntimeInfo {
            runtime_type: RuntimeType::Podman,
            socket_path: ROOTFUL_PODMAN.to_string(),
        });
    }

    if let Some(uid) = current_uid() {
        let rootless = format!("/run/user/{uid}/podman/podman.sock");
        if Path::new(&rootless).exists() {
            return Ok(RuntimeInfo {
                runtime_type: RuntimeType::Podman,
                socket_path: rootless,
            });
        }
    }

    Err(DetectionError::NoRuntimeFound)
}

fn current_uid() -> Option<String> {
    std::env::var("UID").ok().or_else(|| {
        std::fs::read_to_string("/proc/self/status")
            .ok()
            .and_then(|status| {
                status
                    .lines()
                    .find(|line| line.starts_with("Uid:"))
                    .and_then(|line| line.split_whitespace().nth(1))
                    .map(|uid| uid.to_string())
            })
    })
}
