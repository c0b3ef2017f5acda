// ABOUTME: Health gate: polls a probe until a success streak, a deadline, or cancellation.
// ABOUTME: The deadline is a total budget; probe failures reset the streak, never the clock.

mod http;

pub use http::HttpProbe;

use crate::manifest::HealthCheckSpec;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

/// A single health probe attempt. Implementations report reachable-and-healthy
/// as `true`; connection errors and bad statuses are both `false`.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn check(&self) -> bool;
}

/// Outcome of running the health gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The required streak of consecutive successes was reached.
    Healthy,
    /// The total deadline elapsed without reaching the streak.
    Timeout,
    /// Cancelled from outside before a verdict.
    Aborted,
}

/// Gate parameters, lifted out of the manifest health block.
#[derive(Debug, Clone)]
pub struct GateSettings {
    /// Delay between probe attempts.
    pub interval: Duration,
    /// Total budget for the whole gate.
    pub timeout: Duration,
    /// Consecutive successes required.
    pub retries: u32,
}

impl GateSettings {
    pub fn from_spec(spec: &HealthCheckSpec) -> Self {
        Self {
            interval: spec.interval,
            timeout: spec.timeout,
            retries: spec.retries,
        }
    }
}

/// Cooperative cancellation handle shared between the gate and a signal task.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

#[derive(Default)]
struct CancelInner {
    flag: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.flag.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.flag.load(Ordering::SeqCst)
    }

    /// Resolves once `cancel` has been called.
    pub async fn cancelled(&self) {
        // Register for notification before checking the flag, otherwise a
        // cancel between the check and the await would be missed.
        let notified = self.inner.notify.notified();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

/// Poll `probe` until `settings.retries` consecutive successes, the total
/// deadline, or cancellation. A failed probe resets the success streak; the
/// deadline is never extended.
pub async fn await_healthy<P: Probe + ?Sized>(
    probe: &P,
    settings: &GateSettings,
    cancel: &CancelToken,
) -> Verdict {
    let deadline = Instant::now() + settings.timeout;
    let mut streak: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            return Verdict::Aborted;
        }
        let now = Instant::now();
        if now >= deadline {
            return Verdict::Timeout;
        }

        let healthy = tokio::select! {
            _ = cancel.cancelled() => return Verdict::Aborted,
            result = tokio::time::timeout(deadline - now, probe.check()) => match result {
                Ok(healthy) => healthy,
                // The probe itself outlived the remaining budget.
                Err(_) => return Verdict::Timeout,
            },
        };

        if healthy {
            streak += 1;
            tracing::debug!(streak, required = settings.retries, "health probe succeeded");
            if streak >= settings.retries {
                return Verdict::Healthy;
            }
        } else {
            if streak > 0 {
                tracing::debug!("health probe failed, success streak reset");
            }
            streak = 0;
        }

        let wake = std::cmp::min(deadline, Instant::now() + settings.interval);
        tokio::select! {
            _ = cancel.cancelled() => return Verdict::Aborted,
            _ = tokio::time::sleep_until(wake) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysHealthy;

    #[async_trait]
    impl Probe for AlwaysHealthy {
        async fn check(&self) -> bool {
            true
        }
    }

    fn settings(interval_ms: u64, timeout_ms: u64, retries: u32) -> GateSettings {
        GateSettings {
            interval: Duration::from_millis(interval_ms),
            timeout: Duration::from_millis(timeout_ms),
            retries,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn healthy_after_streak() {
        let verdict = await_healthy(&AlwaysHealthy, &settings(100, 5000, 3), &CancelToken::new()).await;
        assert_eq!(verdict, Verdict::Healthy);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_before_start_aborts() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let verdict = await_healthy(&AlwaysHealthy, &settings(100, 5000, 3), &cancel).await;
        assert_eq!(verdict, Verdict::Aborted);
    }

    #[tokio::test]
    async fn cancelled_future_resolves_after_cancel() {
        let cancel = CancelToken::new();
        let waiter = {
            let cancel = cancel.clone();
            tokio::spawn(async move { cancel.cancelled().await })
        };
        cancel.cancel();
        waiter.await.unwrap();
        assert!(cancel.is_cancelled());
    }
}
