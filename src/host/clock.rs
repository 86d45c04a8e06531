use std::cell::Cell;
use std::time::{Duration, Instant};

/// Monotonic millisecond time source.
pub trait Clock {
    /// Current time in milliseconds; only differences are meaningful.
    fn now_ms(&self) -> f64;

    /// Block (or jump) until `now_ms() >= deadline_ms`.
    fn wait_until(&self, deadline_ms: f64);
}

/// Wall-clock time measured from construction.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Start a clock at zero.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }

    fn wait_until(&self, deadline_ms: f64) {
        let remaining = deadline_ms - self.now_ms();
        if remaining > 0.0 && remaining.is_finite() {
            std::thread::sleep(Duration::from_secs_f64(remaining / 1000.0));
        }
    }
}

/// Manually driven clock for deterministic tests and simulations.
///
/// Time never moves unless [`VirtualClock::set`], [`VirtualClock::advance`] or
/// [`Clock::wait_until`] move it, and it never moves backwards.
#[derive(Debug, Default)]
pub struct VirtualClock {
    now: Cell<f64>,
}

impl VirtualClock {
    /// Clock starting at `0`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock starting at `ms`.
    pub fn starting_at(ms: f64) -> Self {
        Self { now: Cell::new(ms) }
    }

    /// Jump to `ms` (ignored if it is in the past).
    pub fn set(&self, ms: f64) {
        if ms > self.now.get() {
            self.now.set(ms);
        }
    }

    /// Move forward by `ms`.
    pub fn advance(&self, ms: f64) {
        self.set(self.now.get() + ms);
    }
}

impl Clock for VirtualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }

    fn wait_until(&self, deadline_ms: f64) {
        if deadline_ms.is_finite() {
            self.set(deadline_ms);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/host/clock.rs"]
mod tests;
