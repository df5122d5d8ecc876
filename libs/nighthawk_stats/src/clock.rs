use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Abstracts the monotonic clock so the rate limiter and sequencer can be
/// driven deterministically in tests instead of racing real wall time.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Instant;
}

/// Production clock: a thin wrapper over [`std::time::Instant`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A manually-advanced clock for tests. Every [`SimulatedClock::advance`]
/// call is the stand-in for the cooperative yield the sequencer's idle spin
/// performs against the real platform util.
#[derive(Debug, Clone)]
pub struct SimulatedClock {
    now: Arc<Mutex<Instant>>,
}

impl SimulatedClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: std::time::Duration) {
        let mut guard = self.now.lock().expect("simulated clock lock poisoned");
        *guard += by;
    }
}

impl Default for SimulatedClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SimulatedClock {
    fn now(&self) -> Instant {
        *self.now.lock().expect("simulated clock lock poisoned")
    }
}
