// ABOUTME: The rollout pipeline as a typestate: pull, start, health-gate, swap, retire.
// ABOUTME: Fallible transitions hand back the rollout so the caller can roll back or abandon.

use super::error::RolloutError;
use super::record::{Outcome, RolloutRecord};
use super::state::{Completed, HealthChecked, Initialized, Pulled, Started, State, Swapped};
use crate::health::{CancelToken, GateSettings, Probe, Verdict, await_healthy};
use crate::manifest::{PortBinding, ReleaseDescriptor};
use crate::proxy::{Notifier, UpstreamTarget};
use crate::runtime::{
    ContainerOps, ContainerSpec, ContainerSummary, ImageError, ImageOps, RetryPolicy,
    pull_with_retry,
};
use crate::types::ContainerId;
use std::collections::HashMap;
use std::marker::PhantomData;

/// Deployment slot for the blue/green naming scheme. The new container always
/// takes the slot the currently running one does not hold.
///
/// Slots also partition host ports: a manifest port is the base of an
/// adjacent pair, blue publishes the base and green the port above it. Both
/// containers can therefore listen side by side while the health gate runs;
/// a single shared host port would make the new container's start fail with
/// a bind conflict as long as the old one serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Blue,
    Green,
}

impl Slot {
    pub fn as_str(self) -> &'static str {
        match self {
            Slot::Blue => "blue",
            Slot::Green => "green",
        }
    }

    pub fn other(self) -> Self {
        match self {
            Slot::Blue => Slot::Green,
            Slot::Green => Slot::Blue,
        }
    }

    /// Host port this slot publishes for a manifest base port.
    pub fn host_port(self, base: u16) -> u16 {
        match self {
            Slot::Blue => base,
            Slot::Green => base + 1,
        }
    }
}

/// Result of a fallible transition: the next state, or the unchanged rollout
/// plus the error so the caller decides between rollback and abandonment.
pub type TransitionResult<T, S> = Result<Rollout<T>, (Rollout<S>, RolloutError)>;

/// One rollout attempt, parameterized over its pipeline state.
pub struct Rollout<S: State> {
    descriptor: ReleaseDescriptor,
    slot: Slot,
    previous: Option<ContainerId>,
    new_container: Option<ContainerId>,
    record: RolloutRecord,
    _state: PhantomData<S>,
}

impl<S: State> Rollout<S> {
    fn transition<T: State>(self) -> Rollout<T> {
        Rollout {
            descriptor: self.descriptor,
            slot: self.slot,
            previous: self.previous,
            new_container: self.new_container,
            record: self.record,
            _state: PhantomData,
        }
    }

    pub fn descriptor(&self) -> &ReleaseDescriptor {
        &self.descriptor
    }

    pub fn slot(&self) -> Slot {
        self.slot
    }

    /// Name for the new container: `{service}-{slot}`.
    pub fn container_name(&self) -> String {
        format!("{}-{}", self.descriptor.service, self.slot.as_str())
    }

    /// Port bindings the new container publishes: each manifest base port
    /// shifted to this slot's side of the pair.
    fn slot_bindings(&self) -> Vec<PortBinding> {
        self.descriptor
            .ports
            .iter()
            .map(|b| PortBinding {
                host: self.slot.host_port(b.host),
                ..*b
            })
            .collect()
    }

    /// Host port the health probe should hit for this slot.
    pub fn probe_port(&self) -> u16 {
        self.slot.host_port(self.descriptor.health.port)
    }

    /// Loopback target the proxy should route to once this slot serves.
    /// `None` when the manifest publishes no ports.
    fn upstream_target(&self) -> Option<UpstreamTarget> {
        self.descriptor.ports.first().map(|b| UpstreamTarget {
            upstream: self.descriptor.upstream_name().to_string(),
            addr: format!("127.0.0.1:{}", self.slot.host_port(b.host)),
        })
    }

    fn labels(&self) -> HashMap<String, String> {
        HashMap::from([
            ("relevo.managed".to_string(), "true".to_string()),
            (
                "relevo.service".to_string(),
                self.descriptor.service.to_string(),
            ),
            ("relevo.slot".to_string(), self.slot.as_str().to_string()),
        ])
    }

    /// Give up without touching containers: finalize the record as failed.
    pub fn abandon(mut self, error: &RolloutError) -> RolloutRecord {
        self.record.error = Some(error.to_string());
        self.record.finish(Outcome::Failed);
        self.record
    }
}

impl Rollout<Initialized> {
    /// Begin a rollout against whatever is currently running for the service.
    pub fn new(descriptor: ReleaseDescriptor, previous: Option<&ContainerSummary>) -> Self {
        let previous_slot = previous.and_then(|c| {
            c.labels
                .get("relevo.slot")
                .map(|s| match s.as_str() {
                    "green" => Slot::Green,
                    _ => Slot::Blue,
                })
        });
        let slot = previous_slot.map_or(Slot::Blue, Slot::other);
        let previous_id = previous.map(|c| c.id.clone());
        let record = RolloutRecord::new(descriptor.clone(), previous_id.clone());

        Self {
            descriptor,
            slot,
            previous: previous_id,
            new_container: None,
            record,
            _state: PhantomData,
        }
    }

    /// Ensure the image is present locally, retrying transient registry
    /// failures. Nothing has been created yet, so failure needs no rollback.
    pub async fn pull<R: ImageOps + ?Sized>(
        self,
        runtime: &R,
        policy: &RetryPolicy,
    ) -> TransitionResult<Pulled, Initialized> {
        tracing::info!(image = %self.descriptor.image, "pulling image");
        match pull_with_retry(runtime, &self.descriptor.image, policy).await {
            Ok(()) => Ok(self.transition()),
            Err(ImageError::NotFound(message)) => {
                Err((self, RolloutError::ImageNotFound(message)))
            }
            Err(ImageError::RegistryUnreachable(message)) => Err((
                self,
                RolloutError::RegistryUnreachable {
                    attempts: policy.attempts,
                    message,
                },
            )),
            Err(ImageError::Runtime(message)) => Err((self, RolloutError::Runtime(message))),
        }
    }
}

impl Rollout<Pulled> {
    /// Create and start the new container alongside the old one. If start
    /// fails after create, the created container is removed before returning.
    pub async fn start<R: ContainerOps + ?Sized>(
        mut self,
        runtime: &R,
        env: HashMap<String, String>,
    ) -> TransitionResult<Started, Pulled> {
        let spec = ContainerSpec {
            name: self.container_name(),
            image: self.descriptor.image.clone(),
            env,
            labels: self.labels(),
            ports: self.slot_bindings(),
            restart: self.descriptor.restart,
            stop_grace: self.descriptor.stop_grace,
        };

        tracing::info!(container = %spec.name, "starting new container");
        let id = match runtime.create_container(&spec).await {
            Ok(id) => id,
            Err(e) => return Err((self, RolloutError::StartFailed(e.to_string()))),
        };

        if let Err(e) = runtime.start_container(&id).await {
            // Leave no created-but-dead container behind.
            if let Err(remove_err) = runtime.remove_container(&id, true).await {
                tracing::warn!(
                    container = %id.short(),
                    "failed to remove container after failed start: {remove_err}"
                );
            }
            return Err((self, RolloutError::StartFailed(e.to_string())));
        }

        self.new_container = Some(id.clone());
        self.record.new_container = Some(id);
        Ok(self.transition())
    }
}

impl Rollout<Started> {
    /// Gate on the new container's health endpoint. Traffic has not moved,
    /// so a failed gate leaves the old container serving untouched.
    pub async fn await_healthy<P: Probe + ?Sized>(
        self,
        probe: &P,
        cancel: &CancelToken,
    ) -> TransitionResult<HealthChecked, Started> {
        let settings = GateSettings::from_spec(&self.descriptor.health);
        tracing::info!(
            port = self.probe_port(),
            path = %self.descriptor.health.path,
            "waiting for new container to become healthy"
        );
        match await_healthy(probe, &settings, cancel).await {
            Verdict::Healthy => Ok(self.transition()),
            Verdict::Timeout => Err((self, RolloutError::HealthCheckTimeout)),
            Verdict::Aborted => Err((self, RolloutError::Aborted)),
        }
    }

    /// Undo a failed attempt: stop and remove the new container. The old
    /// container never stopped serving.
    pub async fn roll_back<R: ContainerOps + ?Sized>(
        mut self,
        runtime: &R,
        cause: &RolloutError,
    ) -> RolloutRecord {
        self.record.error = Some(cause.to_string());

        if let Some(id) = &self.new_container {
            tracing::warn!(container = %id.short(), "rolling back: removing new container");
            if let Err(e) = runtime.stop_container(id, self.descriptor.stop_grace).await {
                tracing::debug!("stop during rollback: {e}");
            }
            if let Err(e) = runtime.remove_container(id, true).await {
                self.record.error = Some(format!(
                    "{cause}; rollback incomplete, container {} not removed: {e}",
                    id.short()
                ));
                self.record.finish(Outcome::Failed);
                return self.record;
            }
        }

        self.record.finish(Outcome::RolledBack);
        self.record
    }
}

impl Rollout<HealthChecked> {
    /// Point traffic at the new container. The cutover itself is the port
    /// binding already in place; the proxy notify is best effort and a
    /// failure there never undoes the swap.
    pub async fn swap<N: Notifier + ?Sized>(mut self, notifier: &N) -> Rollout<Swapped> {
        if let Some(target) = self.upstream_target()
            && let Err(e) = notifier.publish(&target).await
        {
            tracing::warn!(
                "proxy notify failed, traffic cutover stands but the proxy \
                 config may be stale: {e}"
            );
            self.record.proxy_error = Some(e.to_string());
        }
        self.transition()
    }
}

impl Rollout<Swapped> {
    /// Stop and remove the previous container. Failures here are logged, not
    /// fatal: the new container already serves traffic.
    pub async fn retire_previous<R: ContainerOps + ?Sized>(
        mut self,
        runtime: &R,
    ) -> Rollout<Completed> {
        if let Some(id) = self.previous.clone() {
            tracing::info!(container = %id.short(), "retiring previous container");
            if let Err(e) = runtime.stop_container(&id, self.descriptor.stop_grace).await {
                tracing::warn!(container = %id.short(), "failed to stop previous container: {e}");
            }
            if let Err(e) = runtime.remove_container(&id, true).await {
                tracing::warn!(container = %id.short(), "failed to remove previous container: {e}");
            }
        }
        self.record.finish(Outcome::Healthy);
        self.transition()
    }
}

impl Rollout<Completed> {
    pub fn into_record(self) -> RolloutRecord {
        self.record
    }
}
