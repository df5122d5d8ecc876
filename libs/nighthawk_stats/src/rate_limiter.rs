use std::sync::Arc;

use crate::clock::Clock;
use crate::frequency::Frequency;

/// A budget accountant that grants at most one acquisition per `interval` on
/// average, measured from its construction instant.
pub trait RateLimiter: Send {
    /// Attempts to consume one unit of budget. Never blocks.
    fn try_acquire(&mut self) -> bool;

    /// Returns one previously-acquired unit of budget to the pool.
    fn release(&mut self);
}

/// `LinearRateLimiter` grants exactly `floor(elapsed / interval)` cumulative
/// acquisitions since construction, net of releases: no lookahead, no
/// bursting beyond the number of whole intervals that have actually elapsed.
pub struct LinearRateLimiter<C: Clock> {
    clock: Arc<C>,
    created_at: std::time::Instant,
    interval: std::time::Duration,
    acquired: u64,
    budget: u64,
}

impl<C: Clock> LinearRateLimiter<C> {
    pub fn new(clock: Arc<C>, frequency: Frequency) -> Self {
        let created_at = clock.now();
        Self {
            clock,
            created_at,
            interval: frequency.interval(),
            acquired: 0,
            budget: 0,
        }
    }

    /// Number of intervals that have elapsed since construction: `N(t)`.
    fn elapsed_intervals(&self) -> u64 {
        let elapsed = self.clock.now().saturating_duration_since(self.created_at);
        (elapsed.as_secs_f64() / self.interval.as_secs_f64()).floor() as u64
    }

    pub fn acquired(&self) -> u64 {
        self.acquired
    }
}

impl<C: Clock> RateLimiter for LinearRateLimiter<C> {
    fn try_acquire(&mut self) -> bool {
        if self.budget == 0 {
            let n = self.elapsed_intervals();
            self.budget = n.saturating_sub(self.acquired);
            if self.budget == 0 {
                return false;
            }
        }
        self.budget -= 1;
        self.acquired += 1;
        true
    }

    fn release(&mut self) {
        self.budget += 1;
        self.acquired = self.acquired.saturating_sub(1);
    }
}
