// ABOUTME: Rollout lock tests: non-blocking acquisition, release, stale-lock breaking.
// ABOUTME: Uses a temp state dir per test.

use relevo::rollout::{LockError, RolloutLock};
use std::time::{Duration, Instant};

#[test]
fn second_acquire_fails_immediately() {
    let dir = tempfile::tempdir().unwrap();
    let _held = RolloutLock::acquire(dir.path(), "web", false).unwrap();

    let start = Instant::now();
    let result = RolloutLock::acquire(dir.path(), "web", false);
    let elapsed = start.elapsed();

    // Non-blocking: failure is reported at once, never after a wait.
    assert!(elapsed < Duration::from_millis(200), "took {elapsed:?}");
    match result {
        Err(LockError::Held {
            service,
            holder,
            pid,
            ..
        }) => {
            assert_eq!(service, "web");
            assert!(!holder.is_empty());
            assert_eq!(pid, std::process::id());
        }
        Err(other) => panic!("expected Held, got {other:?}"),
        Ok(_) => panic!("expected Held, but the lock was acquired"),
    }
}

#[test]
fn locks_are_per_service() {
    let dir = tempfile::tempdir().unwrap();
    let _web = RolloutLock::acquire(dir.path(), "web", false).unwrap();
    let api = RolloutLock::acquire(dir.path(), "api", false);
    assert!(api.is_ok());
}

#[test]
fn release_allows_reacquire() {
    let dir = tempfile::tempdir().unwrap();
    let lock = RolloutLock::acquire(dir.path(), "web", false).unwrap();
    lock.release().unwrap();
    assert!(RolloutLock::acquire(dir.path(), "web", false).is_ok());
}

#[test]
fn drop_releases_the_lock() {
    let dir = tempfile::tempdir().unwrap();
    {
        let _lock = RolloutLock::acquire(dir.path(), "web", false).unwrap();
    }
    assert!(RolloutLock::acquire(dir.path(), "web", false).is_ok());
}

#[test]
fn force_breaks_a_held_lock() {
    let dir = tempfile::tempdir().unwrap();
    let _held = RolloutLock::acquire(dir.path(), "web", false).unwrap();
    assert!(RolloutLock::acquire(dir.path(), "web", true).is_ok());
}

#[test]
fn stale_lock_is_broken() {
    let dir = tempfile::tempdir().unwrap();
    let two_hours_ago = chrono::Utc::now() - chrono::Duration::hours(2);
    let stale = serde_json::json!({
        "holder": "old-host",
        "pid": 12345,
        "started_at": two_hours_ago,
        "service": "web",
    });
    std::fs::write(
        dir.path().join("web.lock"),
        serde_json::to_string(&stale).unwrap(),
    )
    .unwrap();

    assert!(RolloutLock::acquire(dir.path(), "web", false).is_ok());
}

#[test]
fn corrupt_lock_is_broken() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("web.lock"), "not json").unwrap();
    assert!(RolloutLock::acquire(dir.path(), "web", false).is_ok());
}
