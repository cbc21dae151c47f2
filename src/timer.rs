//! Cancelable scheduled tasks on a virtual clock.
//!
//! The window manager never sleeps. Animation completions and hover grace
//! periods are queued here as plain values with a deadline, and the owner
//! drains whatever became due each time it advances the clock. Tests drive
//! the clock explicitly; the terminal front-end feeds it wall time.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Handle to a scheduled task, used to cancel it before it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

#[derive(Debug)]
pub struct Scheduler<T> {
    now: Duration,
    next_id: u64,
    // (deadline, id) keeps equal deadlines in scheduling order
    queue: BTreeMap<(Duration, u64), T>,
    deadlines: HashMap<u64, Duration>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            queue: BTreeMap::new(),
            deadlines: HashMap::new(),
        }
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn schedule(&mut self, delay: Duration, task: T) -> TimerHandle {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        let deadline = self.now.saturating_add(delay);
        self.queue.insert((deadline, id), task);
        self.deadlines.insert(id, deadline);
        TimerHandle(id)
    }

    /// Cancel a pending task. Returns `false` if it already fired or was
    /// cancelled before.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let Some(deadline) = self.deadlines.remove(&handle.0) else {
            return false;
        };
        self.queue.remove(&(deadline, handle.0)).is_some()
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.deadlines.contains_key(&handle.0)
    }

    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Pop the earliest task due at or before `until`, moving the clock to
    /// its deadline. Tasks scheduled while draining are picked up by later
    /// calls if they also fall due before `until`.
    pub fn pop_due(&mut self, until: Duration) -> Option<T> {
        let (&(deadline, id), _) = self.queue.first_key_value()?;
        if deadline > until {
            return None;
        }
        let task = self.queue.remove(&(deadline, id))?;
        self.deadlines.remove(&id);
        if deadline > self.now {
            self.now = deadline;
        }
        Some(task)
    }

    /// Move the clock forward to `until` once every due task was drained.
    pub fn settle(&mut self, until: Duration) {
        if until > self.now {
            self.now = until;
        }
    }

    /// Convenience for owners without re-entrant scheduling: advance by `dt`
    /// and return every task that fell due, in deadline order.
    pub fn advance(&mut self, dt: Duration) -> Vec<T> {
        let until = self.now.saturating_add(dt);
        let mut due = Vec::new();
        while let Some(task) = self.pop_due(until) {
            due.push(task);
        }
        self.settle(until);
        due
    }
}
