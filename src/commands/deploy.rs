// ABOUTME: The deploy command: one idempotent rollout attempt for a manifest.
// ABOUTME: Drives the typestate pipeline and persists a history record either way.

use crate::error::{Error, Result};
use crate::health::{CancelToken, HttpProbe};
use crate::manifest::{ReleaseDescriptor, resolve_env_refs};
use crate::output::Output;
use crate::proxy::{FileNotifier, NoopNotifier};
use crate::rollout::{
    HistoryStore, LockError, Outcome, Rollout, RolloutError, RolloutLock, RolloutRecord,
    find_active_container, state_dir,
};
use crate::runtime::{BollardDriver, RetryPolicy, detect_local};
use std::path::Path;

/// Run a rollout for the given manifest. Returns the final outcome so the
/// caller can map it to an exit code.
pub async fn deploy(manifest_path: &Path, force: bool, output: &mut Output) -> Result<Outcome> {
    output.start_timer();

    let descriptor = ReleaseDescriptor::load(manifest_path)?;
    // Resolve env before any side effect so a missing variable cannot strand
    // a half-started rollout.
    let env = resolve_env_refs(&descriptor.env)?;

    let state_dir = state_dir();
    let lock = RolloutLock::acquire(&state_dir, descriptor.service.as_str(), force).map_err(
        |e| match e {
            LockError::Held {
                holder,
                pid,
                started_at,
                ..
            } => Error::Rollout(RolloutError::RolloutInProgress {
                holder,
                pid,
                started_at,
            }),
            other => Error::Lock(other),
        },
    )?;
    let history = HistoryStore::open(&state_dir)?;

    output.progress(&format!(
        "Deploying {} ({})",
        descriptor.service, descriptor.image
    ));

    let info = detect_local()?;
    output.progress(&format!(
        "  → Found {} at {}",
        info.runtime_type, info.socket_path
    ));
    let driver = BollardDriver::connect(&info)?;
    driver.ping().await?;

    let previous = find_active_container(&driver, &descriptor.service).await?;
    match &previous {
        Some(c) => output.progress(&format!("  → Found existing container: {}", c.name)),
        None => output.progress("  → No existing container (first deploy)"),
    }

    // Ctrl-C aborts the health gate; the pipeline then rolls back cleanly.
    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, aborting rollout");
                cancel.cancel();
            }
        });
    }

    let rollout = Rollout::new(descriptor.clone(), previous.as_ref());

    output.progress("  → Pulling image...");
    let rollout = match rollout.pull(&driver, &RetryPolicy::default()).await {
        Ok(r) => r,
        Err((r, e)) => return Err(fail(&history, r.abandon(&e), e)),
    };

    output.progress("  → Starting new container...");
    let rollout = match rollout.start(&driver, env).await {
        Ok(r) => r,
        Err((r, e)) => return Err(fail(&history, r.abandon(&e), e)),
    };

    output.progress("  → Waiting for health check...");
    let probe = HttpProbe::new(rollout.probe_port(), descriptor.health.path.clone());
    let rollout = match rollout.await_healthy(&probe, &cancel).await {
        Ok(r) => r,
        Err((r, e)) => {
            output.error(&format!("health gate failed: {e}"));
            output.progress("  → Rolling back...");
            let record = r.roll_back(&driver, &e).await;
            persist(&history, &record);
            return match record.outcome {
                Outcome::RolledBack => {
                    lock.release()?;
                    output.success("Rolled back; previous container kept serving");
                    Ok(Outcome::RolledBack)
                }
                _ => Err(Error::Rollout(RolloutError::RollbackFailed(
                    record.error.unwrap_or_else(|| e.to_string()),
                ))),
            };
        }
    };

    output.progress("  → Cutting over traffic...");
    let rollout = match &descriptor.proxy {
        Some(spec) => rollout.swap(&FileNotifier::from_spec(spec)).await,
        None => rollout.swap(&NoopNotifier).await,
    };

    output.progress("  → Retiring previous container...");
    let rollout = rollout.retire_previous(&driver).await;

    let record = rollout.into_record();
    if let Some(proxy_error) = &record.proxy_error {
        output.warn(&format!(
            "deployed, but the reverse proxy was not notified: {proxy_error}"
        ));
    }
    persist(&history, &record);
    lock.release()?;

    output.success(&format!("Deployed {}", descriptor.service));
    Ok(Outcome::Healthy)
}

/// Persist the record for a failed attempt and surface the cause. The lock is
/// released by its drop guard when the caller returns.
fn fail(history: &HistoryStore, record: RolloutRecord, cause: RolloutError) -> Error {
    persist(history, &record);
    Error::Rollout(cause)
}

fn persist(history: &HistoryStore, record: &RolloutRecord) {
    if let Err(e) = history.persist(record) {
        tracing::warn!("failed to persist rollout record: {e}");
    }
}
