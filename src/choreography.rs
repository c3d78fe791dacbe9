//! Cancellable deferred steps.
//!
//! A `Scheduler` owns a virtual clock that only moves when `advance` is called with the frame delta,
//! so the same sequence plays back identically in tests and at runtime. Every scheduled payload is
//! addressed by a `TaskHandle`; the owner keeps the handles next to the state the steps will touch
//! and cancels them on re-entry or teardown.

use std::time::Duration;

/// Identifies one scheduled step. Handles are never reused within a scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

#[derive(Debug)]
struct Scheduled<T> {
    handle: TaskHandle,
    due: Duration,
    payload: T,
}

#[derive(Debug)]
pub struct Scheduler<T> {
    now: Duration,
    next_id: u64,
    pending: Vec<Scheduled<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            pending: Vec::new(),
        }
    }
}

impl<T> Scheduler<T> {
    /// Schedules `payload` to fire `delay` after the current virtual time.
    pub fn schedule(&mut self, delay: Duration, payload: T) -> TaskHandle {
        let handle = TaskHandle(self.next_id);
        self.next_id += 1;
        self.pending.push(Scheduled {
            handle,
            due: self.now + delay,
            payload,
        });
        handle
    }

    /// Returns `false` when the step already fired or was cancelled.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|step| step.handle != handle);
        self.pending.len() != before
    }

    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.pending.iter().any(|step| step.handle == handle)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Moves the clock forward and returns every payload that came due, earliest first. Steps
    /// with the same due time fire in scheduling order.
    pub fn advance(&mut self, delta: Duration) -> Vec<(TaskHandle, T)> {
        self.now += delta;

        let now = self.now;
        let (mut due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|step| step.due <= now);
        self.pending = waiting;

        due.sort_by_key(|step| (step.due, step.handle.0));
        due.into_iter()
            .map(|step| (step.handle, step.payload))
            .collect()
    }
}
