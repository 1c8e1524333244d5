//! Keyed deadline scheduler for rankwar.
//!
//! Each key (a room name) owns at most one pending deadline. Arming a key
//! replaces whatever was pending for it, cancelling an unarmed key is a
//! no-op, and a deadline is consumed only when it fires. The owner polls
//! [`DeadlineScheduler::next_due`] from its `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = commands.recv() => { /* may arm or cancel */ }
//!         due = timers.next_due() => { /* handle due.task for due.key */ }
//!     }
//! }
//! ```
//!
//! `next_due` only removes the entry after its sleep completes, so
//! dropping the future (another `select!` branch won) loses nothing.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::trace;

/// A deadline that has fired, returned by [`DeadlineScheduler::next_due`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Due<K, T> {
    /// The key the deadline was armed for.
    pub key: K,
    /// The task it was armed with.
    pub task: T,
    /// How far past the deadline the scheduler woke up.
    pub late_by: Duration,
}

/// Counters kept across the scheduler's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerStats {
    /// Deadlines armed, including ones that replaced a pending deadline.
    pub armed: u64,
    /// Pending deadlines dropped by `arm` (replaced) or `cancel`.
    pub cancelled: u64,
    /// Deadlines handed out by `next_due`.
    pub fired: u64,
}

#[derive(Debug)]
struct Slot<T> {
    at: Instant,
    /// Arming order; breaks ties between equal deadlines.
    seq: u64,
    task: T,
}

/// One pending deadline per key.
#[derive(Debug)]
pub struct DeadlineScheduler<K, T> {
    slots: HashMap<K, Slot<T>>,
    next_seq: u64,
    stats: TimerStats,
}

impl<K, T> DeadlineScheduler<K, T>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
{
    /// Creates an empty scheduler.
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
            next_seq: 0,
            stats: TimerStats::default(),
        }
    }

    /// Arms `key` to fire `task` after `after`, replacing any deadline
    /// already pending for it. Returns the replaced task.
    pub fn arm(&mut self, key: K, after: Duration, task: T) -> Option<T> {
        self.arm_at(key, Instant::now() + after, task)
    }

    /// Arms `key` to fire `task` at `at`, replacing any pending deadline.
    pub fn arm_at(&mut self, key: K, at: Instant, task: T) -> Option<T> {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.stats.armed += 1;
        trace!(?key, "deadline armed");

        let replaced = self.slots.insert(key, Slot { at, seq, task });
        if replaced.is_some() {
            self.stats.cancelled += 1;
        }
        replaced.map(|slot| slot.task)
    }

    /// Drops the deadline pending for `key`, if any. Idempotent.
    pub fn cancel(&mut self, key: &K) -> Option<T> {
        let slot = self.slots.remove(key)?;
        self.stats.cancelled += 1;
        trace!(?key, "deadline cancelled");
        Some(slot.task)
    }

    /// `true` if a deadline is pending for `key`.
    pub fn is_armed(&self, key: &K) -> bool {
        self.slots.contains_key(key)
    }

    /// The task pending for `key`.
    pub fn pending(&self, key: &K) -> Option<&T> {
        self.slots.get(key).map(|slot| &slot.task)
    }

    /// When the deadline for `key` fires.
    pub fn deadline(&self, key: &K) -> Option<Instant> {
        self.slots.get(key).map(|slot| slot.at)
    }

    /// Number of pending deadlines.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// `true` when nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Lifetime counters.
    pub fn stats(&self) -> TimerStats {
        self.stats
    }

    /// Waits for the earliest pending deadline and removes it.
    ///
    /// Pends forever while nothing is armed, which lets `tokio::select!`
    /// keep serving its other branches. Deadlines armed while this future
    /// is alive are not seen until it is polled afresh, which is what a
    /// `select!` loop does on every iteration.
    pub async fn next_due(&mut self) -> Due<K, T> {
        loop {
            let Some((key, at)) = self
                .slots
                .iter()
                .min_by_key(|(_, slot)| (slot.at, slot.seq))
                .map(|(key, slot)| (key.clone(), slot.at))
            else {
                return std::future::pending().await;
            };

            time::sleep_until(at).await;

            if let Some(slot) = self.slots.remove(&key) {
                let late_by = Instant::now().saturating_duration_since(at);
                self.stats.fired += 1;
                trace!(?key, late_ms = late_by.as_millis() as u64, "deadline fired");
                return Due {
                    key,
                    task: slot.task,
                    late_by,
                };
            }
        }
    }
}

impl<K, T> Default for DeadlineScheduler<K, T>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
{
    fn default() -> Self {
        Self::new()
    }
}
