use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::host::clock::Clock;

/// Handle returned by [`Scheduler::schedule_after`], used to revoke the task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub u64);

/// Deferred unit of work.
pub type Task = Box<dyn FnOnce()>;

/// Host timer capability: a clock that can also run work later.
///
/// Tasks never run synchronously inside `schedule_after`; they run from the host's event
/// loop, one at a time.
pub trait Scheduler: Clock {
    /// Run `task` once `delay_ms` has elapsed (negative or NaN delays count as zero).
    fn schedule_after(&self, delay_ms: f64, task: Task) -> TaskId;

    /// Revoke a task. Returns `false` if it already ran or was never scheduled.
    fn cancel(&self, id: TaskId) -> bool;

    /// Number of tasks scheduled but not yet run.
    fn pending_tasks(&self) -> usize;
}

/// Deadline ordered with `total_cmp` so it can key a `BTreeMap`.
#[derive(Clone, Copy, Debug)]
struct Deadline(f64);

impl PartialEq for Deadline {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Deadline {}

impl PartialOrd for Deadline {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Deadline {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Default)]
struct QueueState {
    next_id: u64,
    // Keyed by (deadline, id): equal deadlines run in scheduling order.
    queue: BTreeMap<(Deadline, TaskId), Task>,
    deadlines: HashMap<TaskId, Deadline>,
}

impl QueueState {
    fn pop_due(&mut self, limit: f64) -> Option<(f64, Task)> {
        let (&(deadline, id), _) = self.queue.first_key_value()?;
        if deadline.0 > limit {
            return None;
        }
        self.deadlines.remove(&id);
        let task = self.queue.remove(&(deadline, id))?;
        Some((deadline.0, task))
    }

    fn next_deadline(&self) -> Option<f64> {
        self.queue.first_key_value().map(|(&(d, _), _)| d.0)
    }
}

/// Single-threaded event loop: a deadline-ordered timer queue over a [`Clock`].
///
/// With a [`crate::VirtualClock`] it is a deterministic simulator; with a
/// [`crate::SystemClock`] it sleeps between deadlines like a real host loop.
pub struct TimerQueue<C> {
    clock: C,
    state: RefCell<QueueState>,
}

impl<C: Clock> TimerQueue<C> {
    /// Queue driven by `clock`.
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            state: RefCell::new(QueueState::default()),
        }
    }

    /// Borrow the underlying clock.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Deadline of the earliest pending task.
    pub fn next_deadline(&self) -> Option<f64> {
        self.state.borrow().next_deadline()
    }

    /// Let `ms` elapse, running every task that falls due on the way, in deadline order.
    ///
    /// Returns the number of tasks run. Tasks scheduled by tasks run in the same call when
    /// they fall due within the window.
    pub fn advance_by(&self, ms: f64) -> usize {
        let target = self.clock.now_ms() + ms.max(0.0);
        let ran = self.run_due(target);
        self.clock.wait_until(target);
        ran
    }

    /// Run tasks until the queue is empty or only never-firing (infinite) deadlines remain.
    pub fn run_until_idle(&self) -> usize {
        self.run_due(f64::MAX)
    }

    fn run_due(&self, limit: f64) -> usize {
        let mut ran = 0;
        loop {
            // The borrow must end before the task runs: tasks schedule and cancel.
            let next = self.state.borrow_mut().pop_due(limit);
            let Some((deadline, task)) = next else {
                break;
            };
            self.clock.wait_until(deadline);
            tracing::trace!(deadline, "running timer task");
            task();
            ran += 1;
        }
        ran
    }
}

impl<C: Clock> Clock for TimerQueue<C> {
    fn now_ms(&self) -> f64 {
        self.clock.now_ms()
    }

    fn wait_until(&self, deadline_ms: f64) {
        self.clock.wait_until(deadline_ms);
    }
}

impl<C: Clock> Scheduler for TimerQueue<C> {
    fn schedule_after(&self, delay_ms: f64, task: Task) -> TaskId {
        let delay = if delay_ms.is_nan() {
            0.0
        } else {
            delay_ms.max(0.0)
        };
        let deadline = Deadline(self.clock.now_ms() + delay);
        let mut state = self.state.borrow_mut();
        let id = TaskId(state.next_id);
        state.next_id += 1;
        state.queue.insert((deadline, id), task);
        state.deadlines.insert(id, deadline);
        id
    }

    fn cancel(&self, id: TaskId) -> bool {
        let mut state = self.state.borrow_mut();
        match state.deadlines.remove(&id) {
            Some(deadline) => state.queue.remove(&(deadline, id)).is_some(),
            None => false,
        }
    }

    fn pending_tasks(&self) -> usize {
        self.state.borrow().queue.len()
    }
}

impl<C: fmt::Debug> fmt::Debug for TimerQueue<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("TimerQueue")
            .field("clock", &self.clock)
            .field("pending", &state.queue.len())
            .field("next_id", &state.next_id)
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/host/timer.rs"]
mod tests;
