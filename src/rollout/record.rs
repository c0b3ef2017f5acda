// ABOUTME: Rollout history: one JSON record per attempt, persisted under the state dir.
// ABOUTME: Records are append-only; status reads the latest record for a service.

use crate::manifest::ReleaseDescriptor;
use crate::types::{ContainerId, ContainerName};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Final (or pending) outcome of a rollout attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    /// Still running.
    Pending,
    /// New container took traffic and the old one was retired.
    Healthy,
    /// New container failed the health gate and was removed; the old one
    /// kept serving throughout.
    RolledBack,
    /// Stopped partway; see `error`.
    Failed,
}

impl Outcome {
    /// Process exit code for this outcome: 0 healthy, 2 rolled back,
    /// 1 anything else.
    pub fn exit_code(self) -> i32 {
        match self {
            Outcome::Healthy => 0,
            Outcome::RolledBack => 2,
            Outcome::Pending | Outcome::Failed => 1,
        }
    }
}

/// Everything recorded about one rollout attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RolloutRecord {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub descriptor: ReleaseDescriptor,
    pub previous_container: Option<ContainerId>,
    pub new_container: Option<ContainerId>,
    pub outcome: Outcome,
    /// Set when the proxy notify failed after a successful cutover.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RolloutRecord {
    pub fn new(descriptor: ReleaseDescriptor, previous_container: Option<ContainerId>) -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            descriptor,
            previous_container,
            new_container: None,
            outcome: Outcome::Pending,
            proxy_error: None,
            error: None,
        }
    }

    pub fn finish(&mut self, outcome: Outcome) {
        self.outcome = outcome;
        self.finished_at = Some(Utc::now());
    }
}

/// Errors reading or writing rollout history.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("failed to access rollout history: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt rollout record {}: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// On-disk rollout history under `{state_dir}/history/`.
pub struct HistoryStore {
    dir: PathBuf,
}

impl HistoryStore {
    pub fn open(state_dir: &Path) -> Result<Self, HistoryError> {
        let dir = state_dir.join("history");
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Persist a record. The filename is derived from the service and start
    /// time, so re-persisting the same attempt overwrites in place.
    pub fn persist(&self, record: &RolloutRecord) -> Result<PathBuf, HistoryError> {
        let path = self.dir.join(format!(
            "{}-{}.json",
            record.descriptor.service,
            record.started_at.format("%Y%m%dT%H%M%S%.3fZ")
        ));
        let json = serde_json::to_vec_pretty(record).map_err(|source| HistoryError::Corrupt {
            path: path.clone(),
            source,
        })?;
        std::fs::write(&path, json)?;
        Ok(path)
    }

    /// The most recent record for a service, if any.
    pub fn latest(&self, service: &ContainerName) -> Result<Option<RolloutRecord>, HistoryError> {
        Ok(self.records_for(service)?.pop())
    }

    /// All records for a service, oldest first.
    pub fn records_for(
        &self,
        service: &ContainerName,
    ) -> Result<Vec<RolloutRecord>, HistoryError> {
        let prefix = format!("{service}-");
        let mut named: Vec<(String, PathBuf)> = Vec::new();

        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with(&prefix) && name.ends_with(".json") {
                named.push((name, entry.path()));
            }
        }
        named.sort();

        let mut records = Vec::new();
        for (_, path) in named {
            let content = std::fs::read_to_string(&path)?;
            let record: RolloutRecord =
                serde_json::from_str(&content).map_err(|source| HistoryError::Corrupt {
                    path: path.clone(),
                    source,
                })?;
            // Filename prefix alone is ambiguous when one service name is a
            // prefix of another ("web" vs "web-api").
            if record.descriptor.service == *service {
                records.push(record);
            }
        }
        Ok(records)
    }
}
