// ABOUTME: Typestate markers for the rollout pipeline.
// ABOUTME: Each marker is a ZST; transitions consume the rollout and return the next state.

/// A rollout pipeline state.
pub trait State: Send + Sync + 'static {}

/// Manifest loaded, nothing touched yet.
pub struct Initialized;
impl State for Initialized {}

/// Image is present locally.
pub struct Pulled;
impl State for Pulled {}

/// New container created and started, not yet trusted.
pub struct Started;
impl State for Started {}

/// New container passed the health gate.
pub struct HealthChecked;
impl State for HealthChecked {}

/// Traffic points at the new container.
pub struct Swapped;
impl State for Swapped {}

/// Previous container retired; rollout finished.
pub struct Completed;
impl State for Completed {}
