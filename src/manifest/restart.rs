// ABOUTME: Container restart policy declared in the manifest.
// ABOUTME: Defaults to "always" so crashed containers come back without a supervisor.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestartPolicy {
    No,
    #[default]
    Always,
    UnlessStopped,
}
