//! Integration tests for the keyed deadline scheduler.
//!
//! Uses paused Tokio time: sleeps resolve as soon as every task is idle,
//! so a 30 s turn timer fires instantly and deterministically.

use std::time::Duration;

use rankwar_timer::{DeadlineScheduler, TimerStats};
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Task {
    Timeout,
    Step,
}

fn scheduler() -> DeadlineScheduler<String, Task> {
    DeadlineScheduler::new()
}

// =========================================================================
// Arming and cancelling
// =========================================================================

#[test]
fn test_new_scheduler_is_empty() {
    let s = scheduler();
    assert!(s.is_empty());
    assert_eq!(s.stats(), TimerStats::default());
}

#[tokio::test(start_paused = true)]
async fn test_arm_replaces_pending_deadline() {
    let mut s = scheduler();
    assert_eq!(s.arm("A".into(), Duration::from_secs(30), Task::Timeout), None);

    let replaced = s.arm("A".into(), Duration::from_millis(600), Task::Step);

    assert_eq!(replaced, Some(Task::Timeout));
    assert_eq!(s.len(), 1);
    assert_eq!(s.pending(&"A".to_string()), Some(&Task::Step));
    assert_eq!(s.stats().armed, 2);
    assert_eq!(s.stats().cancelled, 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_is_idempotent() {
    let mut s = scheduler();
    s.arm("A".into(), Duration::from_secs(30), Task::Timeout);

    assert_eq!(s.cancel(&"A".to_string()), Some(Task::Timeout));
    assert_eq!(s.cancel(&"A".to_string()), None);
    assert_eq!(s.cancel(&"never-armed".to_string()), None);
    assert!(!s.is_armed(&"A".to_string()));
    assert_eq!(s.stats().cancelled, 1);
}

#[tokio::test(start_paused = true)]
async fn test_deadline_reports_fire_time() {
    let mut s = scheduler();
    let before = Instant::now();
    s.arm("A".into(), Duration::from_secs(30), Task::Timeout);

    let at = s.deadline(&"A".to_string()).unwrap();
    assert_eq!(at - before, Duration::from_secs(30));
}

// =========================================================================
// Firing
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_next_due_fires_after_duration_and_consumes() {
    let mut s = scheduler();
    let start = Instant::now();
    s.arm("A".into(), Duration::from_secs(30), Task::Timeout);

    let due = s.next_due().await;

    assert_eq!(due.key, "A");
    assert_eq!(due.task, Task::Timeout);
    assert!(start.elapsed() >= Duration::from_secs(30));
    assert!(s.is_empty());
    assert_eq!(s.stats().fired, 1);
}

#[tokio::test(start_paused = true)]
async fn test_next_due_returns_earliest_first() {
    let mut s = scheduler();
    s.arm("slow".into(), Duration::from_secs(30), Task::Timeout);
    s.arm("fast".into(), Duration::from_millis(600), Task::Step);

    assert_eq!(s.next_due().await.key, "fast");
    assert_eq!(s.next_due().await.key, "slow");
}

#[tokio::test(start_paused = true)]
async fn test_equal_deadlines_fire_in_arming_order() {
    let mut s = scheduler();
    let at = Instant::now() + Duration::from_secs(1);
    s.arm_at("second".into(), at, Task::Step);
    s.arm_at("first".into(), at - Duration::from_millis(1), Task::Step);
    s.arm_at("third".into(), at, Task::Step);

    assert_eq!(s.next_due().await.key, "first");
    assert_eq!(s.next_due().await.key, "second");
    assert_eq!(s.next_due().await.key, "third");
}

#[tokio::test(start_paused = true)]
async fn test_empty_scheduler_pends_forever() {
    let mut s = scheduler();
    let result =
        tokio::time::timeout(Duration::from_secs(3600), s.next_due()).await;
    assert!(result.is_err(), "nothing armed, nothing should fire");
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_deadline_never_fires() {
    let mut s = scheduler();
    s.arm("A".into(), Duration::from_secs(1), Task::Timeout);
    s.cancel(&"A".to_string());

    let result =
        tokio::time::timeout(Duration::from_secs(10), s.next_due()).await;
    assert!(result.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_dropped_wait_keeps_deadline() {
    let mut s = scheduler();
    s.arm("A".into(), Duration::from_secs(30), Task::Timeout);

    // Lose a race against a shorter timeout, as a select! loop would.
    let raced =
        tokio::time::timeout(Duration::from_secs(1), s.next_due()).await;
    assert!(raced.is_err());
    assert!(s.is_armed(&"A".to_string()));

    let due = s.next_due().await;
    assert_eq!(due.task, Task::Timeout);
}
