// ABOUTME: Bollard-based container runtime driver over the local unix socket.
// ABOUTME: Implements ImageOps, ContainerOps, and LogOps for Docker and Podman.

use crate::manifest::{Protocol, RestartPolicy};
use crate::runtime::traits::{
    ContainerError, ContainerFilters, ContainerInfo, ContainerOps, ContainerSpec, ContainerState,
    ContainerSummary, ImageError, ImageOps, LogError, LogLine, LogOps, LogOptions, LogSource,
};
use crate::runtime::types::{RuntimeInfo, RuntimeType};
use crate::types::{ContainerId, ImageRef};
use async_trait::async_trait;
use bollard::Docker;
use bollard::models::{
    ContainerCreateBody, HostConfig, PortBinding as BollardPortBinding, RestartPolicy as BollardRestartPolicy,
    RestartPolicyNameEnum,
};
use bollard::query_parameters::{
    CreateContainerOptions, CreateImageOptions, InspectContainerOptions, ListContainersOptions,
    LogsOptions, RemoveContainerOptions, StopContainerOptions,
};
use futures::{Stream, StreamExt};
use std::collections::HashMap;
use std::pin::Pin;
use std::time::Duration;

/// Error connecting to the runtime socket.
#[derive(Debug, thiserror::Error)]
#[error("failed to connect to container runtime: {0}")]
pub struct ConnectError(String);

// =============================================================================
// Error mapping helpers
// =============================================================================

fn map_pull_error(e: bollard::errors::Error, image: &str) -> ImageError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ImageError::NotFound(format!("{image}: {message}")),
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code >= 500 => ImageError::RegistryUnreachable(format!("{image}: {message}")),
        bollard::errors::Error::DockerResponseServerError { message, .. } => {
            ImageError::Runtime(format!("{image}: {message}"))
        }
        // Anything that never produced an HTTP status is a transport failure.
        _ => ImageError::RegistryUnreachable(format!("{image}: {e}")),
    }
}

fn map_create_error(e: bollard::errors::Error) -> ContainerError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ContainerError::ImageMissing(message.clone()),
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 409 => ContainerError::AlreadyExists(message.clone()),
        bollard::errors::Error::DockerResponseServerError { message, .. }
            if message.contains("port is already allocated")
                || message.contains("address already in use") =>
        {
            ContainerError::PortInUse(message.clone())
        }
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_start_error(e: bollard::errors::Error) -> ContainerError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ContainerError::NotFound(message.clone()),
        bollard::errors::Error::DockerResponseServerError { message, .. }
            if message.contains("port is already allocated")
                || message.contains("address already in use") =>
        {
            ContainerError::PortInUse(message.clone())
        }
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_stop_error(e: bollard::errors::Error) -> ContainerError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ContainerError::NotFound(message.clone()),
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 304 => ContainerError::NotRunning(message.clone()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_not_found_error(e: bollard::errors::Error) -> ContainerError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ContainerError::NotFound(message.clone()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_state(state: bollard::models::ContainerStateStatusEnum) -> ContainerState {
    use bollard::models::ContainerStateStatusEnum as S;
    match state {
        S::CREATED => ContainerState::Created,
        S::RUNNING => ContainerState::Running,
        S::PAUSED => ContainerState::Paused,
        S::RESTARTING => ContainerState::Restarting,
        S::REMOVING => ContainerState::Removing,
        S::DEAD => ContainerState::Dead,
        _ => ContainerState::Exited,
    }
}

// =============================================================================
// BollardDriver
// =============================================================================

/// Container runtime driver using bollard over a local unix socket.
///
/// Docker and Podman are both driven through the Docker-compatible API.
pub struct BollardDriver {
    client: Docker,
    runtime_type: RuntimeType,
}

impl BollardDriver {
    pub fn new(client: Docker, runtime_type: RuntimeType) -> Self {
        Self {
            client,
            runtime_type,
        }
    }

    /// Connect to a detected runtime socket.
    pub fn connect(info: &RuntimeInfo) -> Result<Self, ConnectError> {
        let client = Docker::connect_with_unix(&info.socket_path, 120, bollard::API_DEFAULT_VERSION)
            .map_err(|e| ConnectError(format!("{}: {e}", info.socket_path)))?;
        Ok(Self::new(client, info.runtime_type))
    }

    pub fn runtime_type(&self) -> RuntimeType {
        self.runtime_type
    }

    /// Verify the runtime answers on the socket.
    pub async fn ping(&self) -> Result<(), ConnectError> {
        self.client
            .ping()
            .await
            .map_err(|e| ConnectError(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl ImageOps for BollardDriver {
    async fn pull_image(&self, reference: &ImageRef) -> Result<(), ImageError> {
        let image_name = reference.to_string();

        let opts = CreateImageOptions {
            from_image: Some(image_name.clone()),
            ..Default::default()
        };

        // Pull returns a stream of progress updates; consume it fully.
        let mut stream = self.client.create_image(Some(opts), None, None);
        while let Some(result) = stream.next().await {
            result.map_err(|e| map_pull_error(e, &image_name))?;
        }

        Ok(())
    }

    async fn image_exists(&self, reference: &ImageRef) -> Result<bool, ImageError> {
        let image_name = reference.to_string();
        match self.client.inspect_image(&image_name).await {
            Ok(_) => Ok(true),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(false),
            Err(e) => Err(ImageError::Runtime(format!(
                "failed to inspect {image_name}: {e}"
            ))),
        }
    }
}

#[async_trait]
impl ContainerOps for BollardDriver {
    async fn create_container(&self, spec: &ContainerSpec) -> Result<ContainerId, ContainerError> {
        let env: Vec<String> = spec
            .env
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();

        let restart_policy = BollardRestartPolicy {
            name: Some(match spec.restart {
                RestartPolicy::No => RestartPolicyNameEnum::NO,
                RestartPolicy::Always => RestartPolicyNameEnum::ALWAYS,
                RestartPolicy::UnlessStopped => RestartPolicyNameEnum::UNLESS_STOPPED,
            }),
            maximum_retry_count: None,
        };

        let mut port_bindings: HashMap<String, Option<Vec<BollardPortBinding>>> = HashMap::new();
        let mut exposed_ports: Vec<String> = Vec::new();
        for binding in &spec.ports {
            let proto = match binding.protocol {
                Protocol::Tcp => "tcp",
                Protocol::Udp => "udp",
            };
            let port_key = format!("{}/{}", binding.container, proto);
            exposed_ports.push(port_key.clone());
            port_bindings.insert(
                port_key,
                Some(vec![BollardPortBinding {
                    host_ip: None,
                    host_port: Some(binding.host.to_string()),
                }]),
            );
        }

        let host_config = HostConfig {
            restart_policy: Some(restart_policy),
            port_bindings: if port_bindings.is_empty() {
                None
            } else {
                Some(port_bindings)
            },
            ..Default::default()
        };

        let body = ContainerCreateBody {
            image: Some(spec.image.to_string()),
            env: if env.is_empty() { None } else { Some(env) },
            labels: if spec.labels.is_empty() {
                None
            } else {
                Some(spec.labels.clone())
            },
            exposed_ports: if exposed_ports.is_empty() {
                None
            } else {
                Some(exposed_ports)
            },
            host_config: Some(host_config),
            stop_timeout: Some(spec.stop_grace.as_secs() as i64),
            ..Default::default()
        };

        let opts = CreateContainerOptions {
            name: Some(spec.name.clone()),
            ..Default::default()
        };

        let response = self
            .client
            .create_container(Some(opts), body)
            .await
            .map_err(map_create_error)?;

        Ok(ContainerId::new(response.id))
    }

    async fn start_container(&self, id: &ContainerId) -> Result<(), ContainerError> {
        self.client
            .start_container(
                id.as_str(),
                None::<bollard::query_parameters::StartContainerOptions>,
            )
            .await
            .map_err(map_start_error)
    }

    async fn stop_container(
        &self,
        id: &ContainerId,
        grace: Duration,
    ) -> Result<(), ContainerError> {
        let opts = StopContainerOptions {
            t: Some(grace.as_secs() as i32),
            signal: None,
        };

        self.client
            .stop_container(id.as_str(), Some(opts))
            .await
            .map_err(map_stop_error)
    }

    async fn remove_container(&self, id: &ContainerId, force: bool) -> Result<(), ContainerError> {
        let opts = RemoveContainerOptions {
            force,
            ..Default::default()
        };

        self.client
            .remove_container(id.as_str(), Some(opts))
            .await
            .map_err(map_not_found_error)
    }

    async fn inspect_container(&self, id: &ContainerId) -> Result<ContainerInfo, ContainerError> {
        let details = self
            .client
            .inspect_container(id.as_str(), None::<InspectContainerOptions>)
            .await
            .map_err(map_not_found_error)?;

        let state = details
            .state
            .as_ref()
            .and_then(|s| s.status)
            .map(map_state)
            .unwrap_or(ContainerState::Exited);

        Ok(ContainerInfo {
            id: id.clone(),
            name: details
                .name
                .unwrap_or_default()
                .trim_start_matches('/')
                .to_string(),
            image: details
                .config
                .as_ref()
                .and_then(|c| c.image.clone())
                .unwrap_or_default(),
            state,
            labels: details.config.and_then(|c| c.labels).unwrap_or_default(),
        })
    }

    async fn list_containers(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError> {
        let mut filter_map: HashMap<String, Vec<String>> = HashMap::new();
        if let Some(name) = &filters.name {
            filter_map.insert("name".to_string(), vec![name.clone()]);
        }
        for (key, value) in &filters.labels {
            filter_map
                .entry("label".to_string())
                .or_default()
                .push(format!("{key}={value}"));
        }

        let opts = ListContainersOptions {
            all: filters.all,
            filters: Some(filter_map),
            ..Default::default()
        };

        let containers = self
            .client
            .list_containers(Some(opts))
            .await
            .map_err(|e| ContainerError::Runtime(e.to_string()))?;

        Ok(containers
            .into_iter()
            .map(|c| {
                let name = c
                    .names
                    .unwrap_or_default()
                    .first()
                    .map(|n| n.trim_start_matches('/').to_string())
                    .unwrap_or_default();

                // The summary state enum Debug-formats to the wire value.
                let state_str = c
                    .state
                    .map(|s| format!("{s:?}").to_lowercase())
                    .unwrap_or_default();
                let state = match state_str.as_str() {
                    "created" => ContainerState::Created,
                    "running" => ContainerState::Running,
                    "paused" => ContainerState::Paused,
                    "restarting" => ContainerState::Restarting,
                    "removing" => ContainerState::Removing,
                    "dead" => ContainerState::Dead,
                    _ => ContainerState::Exited,
                };

                ContainerSummary {
                    id: ContainerId::new(c.id.unwrap_or_default()),
                    name,
                    image: c.image.unwrap_or_default(),
                    state,
                    labels: c.labels.unwrap_or_default(),
                }
            })
            .collect())
    }
}

#[async_trait]
impl LogOps for BollardDriver {
    async fn container_logs(
        &self,
        id: &ContainerId,
        opts: &LogOptions,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<LogLine, LogError>> + Send>>, LogError> {
        let log_opts = LogsOptions {
            stdout: true,
            stderr: true,
            follow: opts.follow,
            timestamps: opts.timestamps,
            tail: opts
                .tail
                .map(|n| n.to_string())
                .unwrap_or_else(|| "all".to_string()),
            ..Default::default()
        };

        let stream = self.client.logs(id.as_str(), Some(log_opts));

        let mapped = stream.map(|result| {
            result
                .map(|output| {
                    let (source, data) = match output {
                        bollard::container::LogOutput::StdErr { message } => {
                            (LogSource::Stderr, message)
                        }
                        bollard::container::LogOutput::StdOut { message }
                        | bollard::container::LogOutput::StdIn { message }
                        | bollard::container::LogOutput::Console { message } => {
                            (LogSource::Stdout, message)
                        }
                    };
                    LogLine {
                        content: String::from_utf8_lossy(&data).to_string(),
                        source,
                    }
                })
                .map_err(|e| LogError::Stream(e.to_string()))
        });

        Ok(Box::pin(mapped))
    }
}
