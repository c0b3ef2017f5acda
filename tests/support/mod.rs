// ABOUTME: Test support utilities: scripted runtime, probe, and notifier stubs.
// ABOUTME: Each test binary only uses some of these, so dead_code is allowed throughout.

#![allow(dead_code)]

use async_trait::async_trait;
use relevo::health::Probe;
use relevo::proxy::{Notifier, NotifyError, UpstreamTarget};
use relevo::runtime::{
    ContainerError, ContainerFilters, ContainerInfo, ContainerOps, ContainerSpec, ContainerState,
    ContainerSummary, ImageError, ImageOps,
};
use relevo::types::{ContainerId, ImageRef};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// What the stub runtime was asked to do, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    PullAttempt(String),
    Created(String),
    Started(String),
    Stopped(String),
    Removed(String),
}

#[derive(Debug, Clone)]
pub struct StubContainer {
    pub id: ContainerId,
    pub name: String,
    pub image: String,
    pub state: ContainerState,
    pub labels: HashMap<String, String>,
    pub host_ports: Vec<u16>,
}

/// In-memory container runtime with scripted failures.
#[derive(Default)]
pub struct StubRuntime {
    /// Errors returned by successive pull attempts before pulls succeed.
    pub pull_failures: Mutex<VecDeque<ImageError>>,
    /// When true, start_container always fails.
    pub fail_start: bool,
    containers: Mutex<HashMap<String, StubContainer>>,
    events: Mutex<Vec<Event>>,
    next_id: AtomicU64,
}

impl StubRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pull_failures(failures: Vec<ImageError>) -> Self {
        Self {
            pull_failures: Mutex::new(failures.into()),
            ..Default::default()
        }
    }

    /// Seed a running managed container holding the given host ports, as if
    /// from an earlier rollout.
    pub fn seed_running(
        &self,
        service: &str,
        slot: &str,
        image: &str,
        host_ports: &[u16],
    ) -> ContainerSummary {
        let id = ContainerId::new(format!("seed-{service}-{slot}"));
        let labels = HashMap::from([
            ("relevo.managed".to_string(), "true".to_string()),
            ("relevo.service".to_string(), service.to_string()),
            ("relevo.slot".to_string(), slot.to_string()),
        ]);
        let container = StubContainer {
            id: id.clone(),
            name: format!("{service}-{slot}"),
            image: image.to_string(),
            state: ContainerState::Running,
            labels: labels.clone(),
            host_ports: host_ports.to_vec(),
        };
        self.containers
            .lock()
            .unwrap()
            .insert(id.as_str().to_string(), container);
        ContainerSummary {
            id,
            name: format!("{service}-{slot}"),
            image: image.to_string(),
            state: ContainerState::Running,
            labels,
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn pull_attempts(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Event::PullAttempt(_)))
            .count()
    }

    pub fn container(&self, id: &ContainerId) -> Option<StubContainer> {
        self.containers.lock().unwrap().get(id.as_str()).cloned()
    }

    pub fn container_by_name(&self, name: &str) -> Option<StubContainer> {
        self.containers
            .lock()
            .unwrap()
            .values()
            .find(|c| c.name == name)
            .cloned()
    }

    pub fn running_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .containers
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.state.is_running())
            .map(|c| c.name.clone())
            .collect();
        names.sort();
        names
    }

    fn record(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

#[async_trait]
impl ImageOps for StubRuntime {
    async fn pull_image(&self, reference: &ImageRef) -> Result<(), ImageError> {
        self.record(Event::PullAttempt(reference.to_string()));
        if let Some(error) = self.pull_failures.lock().unwrap().pop_front() {
            return Err(error);
        }
        Ok(())
    }

    async fn image_exists(&self, _reference: &ImageRef) -> Result<bool, ImageError> {
        Ok(true)
    }
}

#[async_trait]
impl ContainerOps for StubRuntime {
    async fn create_container(&self, spec: &ContainerSpec) -> Result<ContainerId, ContainerError> {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let id = ContainerId::new(format!("stub-{n}"));
        let container = StubContainer {
            id: id.clone(),
            name: spec.name.clone(),
            image: spec.image.to_string(),
            state: ContainerState::Created,
            labels: spec.labels.clone(),
            host_ports: spec.ports.iter().map(|b| b.host).collect(),
        };
        self.containers
            .lock()
            .unwrap()
            .insert(id.as_str().to_string(), container);
        self.record(Event::Created(spec.name.clone()));
        Ok(id)
    }

    async fn start_container(&self, id: &ContainerId) -> Result<(), ContainerError> {
        if self.fail_start {
            return Err(ContainerError::Runtime("scripted start failure".into()));
        }
        let mut containers = self.containers.lock().unwrap();

        // Host ports are exclusive, as they are on a real runtime: starting a
        // container whose binding is already held by a running one fails.
        if let Some(port) = containers.get(id.as_str()).and_then(|c| {
            c.host_ports.iter().copied().find(|port| {
                containers
                    .values()
                    .any(|other| other.id != c.id && other.state.is_running()
                        && other.host_ports.contains(port))
            })
        }) {
            return Err(ContainerError::PortInUse(format!(
                "Bind for 0.0.0.0:{port} failed: port is already allocated"
            )));
        }

        let container = containers
            .get_mut(id.as_str())
            .ok_or_else(|| ContainerError::NotFound(id.as_str().to_string()))?;
        container.state = ContainerState::Running;
        self.record(Event::Started(id.as_str().to_string()));
        Ok(())
    }

    async fn stop_container(
        &self,
        id: &ContainerId,
        _grace: Duration,
    ) -> Result<(), ContainerError> {
        let mut containers = self.containers.lock().unwrap();
        let container = containers
            .get_mut(id.as_str())
            .ok_or_else(|| ContainerError::NotFound(id.as_str().to_string()))?;
        container.state = ContainerState::Exited;
        self.record(Event::Stopped(id.as_str().to_string()));
        Ok(())
    }

    async fn remove_container(&self, id: &ContainerId, _force: bool) -> Result<(), ContainerError> {
        let removed = self.containers.lock().unwrap().remove(id.as_str());
        if removed.is_none() {
            return Err(ContainerError::NotFound(id.as_str().to_string()));
        }
        self.record(Event::Removed(id.as_str().to_string()));
        Ok(())
    }

    async fn inspect_container(&self, id: &ContainerId) -> Result<ContainerInfo, ContainerError> {
        let containers = self.containers.lock().unwrap();
        let container = containers
            .get(id.as_str())
            .ok_or_else(|| ContainerError::NotFound(id.as_str().to_string()))?;
        Ok(ContainerInfo {
            id: container.id.clone(),
            name: container.name.clone(),
            image: container.image.clone(),
            state: container.state,
            labels: container.labels.clone(),
        })
    }

    async fn list_containers(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError> {
        let containers = self.containers.lock().unwrap();
        Ok(containers
            .values()
            .filter(|c| filters.all || c.state.is_running())
            .filter(|c| {
                filters
                    .labels
                    .iter()
                    .all(|(k, v)| c.labels.get(k) == Some(v))
            })
            .filter(|c| {
                filters
                    .name
                    .as_ref()
                    .is_none_or(|name| c.name.contains(name.as_str()))
            })
            .map(|c| ContainerSummary {
                id: c.id.clone(),
                name: c.name.clone(),
                image: c.image.clone(),
                state: c.state,
                labels: c.labels.clone(),
            })
            .collect())
    }
}

/// Probe returning a scripted sequence of verdicts, then `after` forever.
pub struct SequenceProbe {
    sequence: Mutex<VecDeque<bool>>,
    after: bool,
}

impl SequenceProbe {
    pub fn new(sequence: Vec<bool>, after: bool) -> Self {
        Self {
            sequence: Mutex::new(sequence.into()),
            after,
        }
    }

    pub fn always(value: bool) -> Self {
        Self::new(Vec::new(), value)
    }

    pub fn remaining(&self) -> usize {
        self.sequence.lock().unwrap().len()
    }
}

#[async_trait]
impl Probe for SequenceProbe {
    async fn check(&self) -> bool {
        self.sequence
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.after)
    }
}

/// Notifier recording every published target.
#[derive(Default)]
pub struct StubNotifier {
    pub fail: bool,
    targets: Mutex<Vec<UpstreamTarget>>,
}

impl StubNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn targets(&self) -> Vec<UpstreamTarget> {
        self.targets.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for StubNotifier {
    async fn publish(&self, target: &UpstreamTarget) -> Result<(), NotifyError> {
        if self.fail {
            return Err(NotifyError::ReloadSpawn(std::io::Error::other(
                "scripted notify failure",
            )));
        }
        self.targets.lock().unwrap().push(target.clone());
        Ok(())
    }
}
