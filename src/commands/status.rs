// ABOUTME: The status command: active container plus the latest rollout record.
// ABOUTME: Runtime queries are best effort so status works on hosts without a runtime.

use crate::error::Result;
use crate::manifest::ReleaseDescriptor;
use crate::output::{Output, OutputMode};
use crate::rollout::{HistoryStore, Outcome, state_dir};
use crate::runtime::{BollardDriver, ContainerSummary, detect_local};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct StatusReport {
    service: String,
    image: String,
    active_container: Option<ActiveContainer>,
    last_rollout: Option<LastRollout>,
}

#[derive(Serialize)]
struct ActiveContainer {
    name: String,
    id: String,
    image: String,
}

#[derive(Serialize)]
struct LastRollout {
    outcome: Outcome,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    proxy_error: Option<String>,
}

pub async fn status(manifest_path: &Path, output: &Output) -> Result<()> {
    let descriptor = ReleaseDescriptor::load(manifest_path)?;
    let history = HistoryStore::open(&state_dir())?;
    let last = history.latest(&descriptor.service)?;

    let active = active_container(&descriptor).await;

    let report = StatusReport {
        service: descriptor.service.to_string(),
        image: descriptor.image.to_string(),
        active_container: active.map(|c| ActiveContainer {
            name: c.name,
            id: c.id.short().to_string(),
            image: c.image,
        }),
        last_rollout: last.map(|r| LastRollout {
            outcome: r.outcome,
            started_at: r.started_at,
            finished_at: r.finished_at,
            image: r.descriptor.image.to_string(),
            error: r.error,
            proxy_error: r.proxy_error,
        }),
    };

    if output.mode() == OutputMode::Json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Service: {}", report.service);
    println!("Image: {}", report.image);
    match &report.active_container {
        Some(c) => println!("Running: {} ({}, {})", c.name, c.id, c.image),
        None => println!("Running: none"),
    }
    match &report.last_rollout {
        Some(r) => {
            let outcome = match r.outcome {
                Outcome::Pending => "pending",
                Outcome::Healthy => "healthy",
                Outcome::RolledBack => "rolled back",
                Outcome::Failed => "failed",
            };
            println!("Last rollout: {} ({} at {})", outcome, r.image, r.started_at);
            if let Some(error) = &r.error {
                println!("  error: {error}");
            }
            if let Some(proxy_error) = &r.proxy_error {
                println!("  proxy: {proxy_error}");
            }
        }
        None => println!("Last rollout: none"),
    }

    Ok(())
}

/// The running managed container, or None when the runtime is unreachable.
async fn active_container(descriptor: &ReleaseDescriptor) -> Option<ContainerSummary> {
    let info = detect_local().ok()?;
    let driver = BollardDriver::connect(&info).ok()?;
    crate::rollout::find_active_container(&driver, &descriptor.service)
        .await
        .ok()
        .flatten()
}
