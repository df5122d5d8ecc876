use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use nighthawk_stats::{AnyStatistic, Clock, RateLimiter};

/// Invoked exactly once by the target when its work finishes, regardless of
/// whether the work succeeded — the sequencer only cares about timing, not
/// outcome (a `BenchmarkHttpClient`'s success/failure bookkeeping is the
/// client's own concern).
pub type SequencerCompletion = Box<dyn FnOnce() + Send>;

/// A callable accepting a one-shot completion callback and returning whether
/// it accepted the call. `ClientWorker` adapts `BenchmarkHttpClient::
/// try_start_one` to this shape.
pub type SequencerTarget = Box<dyn Fn(SequencerCompletion) -> bool + Send + Sync>;

pub const CALLBACK_LATENCY_ID: &str = "sequencer.callback";
pub const BLOCKED_ID: &str = "sequencer.blocking";

/// The minimum-resolution periodic timer's period. Every spin of the loop
/// already re-checks the drain conditions, so the periodic timer and the
/// spin timer collapse into one `tokio::task::yield_now` per iteration; this
/// constant survives only to document the target precision.
const MIN_RESOLUTION: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    Idle,
    Running,
    Draining,
    Stopped,
}

/// Single-use: `start_and_wait` consumes the idle-to-stopped lifecycle in
/// one call, since the "event loop" here is this async task's own
/// `.await` points rather than a separate loop object the caller drives.
pub struct Sequencer<C: Clock> {
    clock: Arc<C>,
    rate_limiter: Mutex<Box<dyn RateLimiter>>,
    target: SequencerTarget,
    duration: Duration,
    grace_timeout: Duration,
    state: Mutex<SequencerState>,
    t0: Mutex<Option<Instant>>,
    initiated: Arc<AtomicU64>,
    completed: Arc<AtomicU64>,
    latency_stat: Arc<Mutex<AnyStatistic>>,
    blocked_stat: Arc<Mutex<AnyStatistic>>,
    timed_out: AtomicBool,
}

impl<C: Clock> Sequencer<C> {
    pub fn new(
        clock: Arc<C>,
        rate_limiter: Box<dyn RateLimiter>,
        target: SequencerTarget,
        duration: Duration,
        grace_timeout: Duration,
        stat_template: AnyStatistic,
    ) -> Self {
        Self {
            clock,
            rate_limiter: Mutex::new(rate_limiter),
            target,
            duration,
            grace_timeout,
            state: Mutex::new(SequencerState::Idle),
            t0: Mutex::new(None),
            initiated: Arc::new(AtomicU64::new(0)),
            completed: Arc::new(AtomicU64::new(0)),
            latency_stat: Arc::new(Mutex::new(stat_template.clone())),
            blocked_stat: Arc::new(Mutex::new(stat_template)),
            timed_out: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> SequencerState {
        *self.state.lock().expect("sequencer state lock poisoned")
    }

    pub fn initiated(&self) -> u64 {
        self.initiated.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn timed_out(&self) -> bool {
        self.timed_out.load(Ordering::SeqCst)
    }

    /// Monotone estimate based on `completed / (now - t0)`; zero before
    /// `start_and_wait` has run.
    pub fn completions_per_second(&self) -> f64 {
        let t0 = *self.t0.lock().expect("sequencer t0 lock poisoned");
        match t0 {
            None => 0.0,
            Some(t0) => {
                let elapsed = self.clock.now().saturating_duration_since(t0).as_secs_f64();
                if elapsed <= 0.0 {
                    0.0
                } else {
                    self.completed() as f64 / elapsed
                }
            }
        }
    }

    pub fn statistics(&self) -> Vec<(&'static str, AnyStatistic)> {
        vec![
            (
                CALLBACK_LATENCY_ID,
                self.latency_stat
                    .lock()
                    .expect("latency stat lock poisoned")
                    .clone(),
            ),
            (
                BLOCKED_ID,
                self.blocked_stat
                    .lock()
                    .expect("blocked stat lock poisoned")
                    .clone(),
            ),
        ]
    }

    /// Runs the sequencer to completion: `Idle -> Running -> Draining ->
    /// Stopped`. Panics if called more than once on the same sequencer —
    /// the state machine is single-use by contract.
    pub async fn start_and_wait(&self) {
        {
            let mut state = self.state.lock().expect("sequencer state lock poisoned");
            assert_eq!(*state, SequencerState::Idle, "sequencer is single-use");
            *state = SequencerState::Running;
        }
        let t0 = self.clock.now();
        *self.t0.lock().expect("sequencer t0 lock poisoned") = Some(t0);

        let mut blocked_since: Option<Instant> = None;

        loop {
            let now = self.clock.now();
            let elapsed = now.saturating_duration_since(t0);

            if self.state() == SequencerState::Running && elapsed > self.duration {
                *self.state.lock().expect("sequencer state lock poisoned") =
                    SequencerState::Draining;
                tracing::debug!("sequencer entering drain");
            }

            if self.state() == SequencerState::Draining {
                let initiated = self.initiated();
                let completed = self.completed();
                let grace_elapsed = elapsed.saturating_sub(self.duration);

                if initiated > 0 && initiated == completed {
                    *self.state.lock().expect("sequencer state lock poisoned") =
                        SequencerState::Stopped;
                    tracing::info!(initiated, completed, "sequencer drained cleanly");
                    break;
                }
                if grace_elapsed > self.grace_timeout {
                    self.timed_out.store(true, Ordering::SeqCst);
                    *self.state.lock().expect("sequencer state lock poisoned") =
                        SequencerState::Stopped;
                    tracing::warn!(
                        initiated,
                        completed,
                        "sequencer hit its grace timeout with work still in flight"
                    );
                    break;
                }

                // Draining: no new work is admitted, only drain conditions
                // are polled, so `initiated` can only shrink its gap to
                // `completed`, never grow it.
                tokio::task::yield_now().await;
                continue;
            }

            // Running: admit as many calls as the rate limiter currently
            // allows, then fall back to a blocked wait the first time the
            // target itself refuses a call it had budget for.
            loop {
                let acquired = {
                    let mut limiter = self.rate_limiter.lock().expect("rate limiter poisoned");
                    limiter.try_acquire()
                };
                if !acquired {
                    break;
                }

                let call_instant = self.clock.now();
                let latency_stat = self.latency_stat.clone();
                let completed = self.completed.clone();
                let clock = self.clock.clone();

                let accepted = (self.target)(Box::new(move || {
                    let now = clock.now();
                    let latency_ns = now.saturating_duration_since(call_instant).as_nanos() as i64;
                    latency_stat
                        .lock()
                        .expect("latency stat lock poisoned")
                        .add(latency_ns);
                    completed.fetch_add(1, Ordering::SeqCst);
                }));

                if accepted {
                    self.initiated.fetch_add(1, Ordering::SeqCst);
                    if let Some(since) = blocked_since.take() {
                        let blocked_ns =
                            self.clock.now().saturating_duration_since(since).as_nanos() as i64;
                        self.blocked_stat
                            .lock()
                            .expect("blocked stat lock poisoned")
                            .add(blocked_ns);
                    }
                } else {
                    self.rate_limiter
                        .lock()
                        .expect("rate limiter poisoned")
                        .release();
                    if blocked_since.is_none() {
                        blocked_since = Some(self.clock.now());
                    }
                    break;
                }
            }

            tokio::task::yield_now().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nighthawk_stats::{Frequency, HdrStatistic, LinearRateLimiter, MonotonicClock};
    use std::sync::atomic::AtomicUsize;

    fn hdr_template() -> AnyStatistic {
        AnyStatistic::Hdr(HdrStatistic::new())
    }

    #[tokio::test]
    async fn ten_hz_for_half_a_second_completes_synchronously_five_times() {
        let clock = Arc::new(MonotonicClock);
        let limiter: Box<dyn RateLimiter> = Box::new(LinearRateLimiter::new(
            clock.clone(),
            Frequency::from_hz(10.0).unwrap(),
        ));
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_target = call_count.clone();
        let target: SequencerTarget = Box::new(move |on_complete: SequencerCompletion| {
            call_count_target.fetch_add(1, Ordering::SeqCst);
            on_complete();
            true
        });

        let sequencer = Sequencer::new(
            clock,
            limiter,
            target,
            Duration::from_millis(500),
            Duration::from_millis(200),
            hdr_template(),
        );

        sequencer.start_and_wait().await;

        assert_eq!(sequencer.state(), SequencerState::Stopped);
        assert!(!sequencer.timed_out());
        assert_eq!(call_count.load(Ordering::SeqCst), 5);
        assert_eq!(sequencer.completed(), 5);
        assert_eq!(sequencer.initiated(), 5);

        let stats = sequencer.statistics();
        let latency = stats.iter().find(|(id, _)| *id == CALLBACK_LATENCY_ID).unwrap();
        assert_eq!(latency.1.count(), 5);
    }

    #[tokio::test]
    async fn a_target_that_always_refuses_times_out_at_grace_and_records_no_latency() {
        let clock = Arc::new(MonotonicClock);
        let limiter: Box<dyn RateLimiter> = Box::new(LinearRateLimiter::new(
            clock.clone(),
            Frequency::from_hz(50.0).unwrap(),
        ));
        let target: SequencerTarget = Box::new(|_on_complete: SequencerCompletion| false);

        let sequencer = Sequencer::new(
            clock,
            limiter,
            target,
            Duration::from_millis(50),
            Duration::from_millis(50),
            hdr_template(),
        );

        sequencer.start_and_wait().await;

        assert_eq!(sequencer.state(), SequencerState::Stopped);
        assert!(sequencer.timed_out());
        assert_eq!(sequencer.completed(), 0);

        let stats = sequencer.statistics();
        let latency = stats.iter().find(|(id, _)| *id == CALLBACK_LATENCY_ID).unwrap();
        assert_eq!(latency.1.count(), 0);
        let blocked = stats.iter().find(|(id, _)| *id == BLOCKED_ID).unwrap();
        assert!(blocked.1.count() >= 1);
    }

    #[tokio::test]
    #[should_panic(expected = "single-use")]
    async fn cannot_be_started_twice() {
        let clock = Arc::new(MonotonicClock);
        let limiter: Box<dyn RateLimiter> = Box::new(LinearRateLimiter::new(
            clock.clone(),
            Frequency::from_hz(1000.0).unwrap(),
        ));
        let target: SequencerTarget = Box::new(|on_complete: SequencerCompletion| {
            on_complete();
            true
        });

        let sequencer = Sequencer::new(
            clock,
            limiter,
            target,
            Duration::from_millis(1),
            Duration::from_millis(5),
            hdr_template(),
        );

        sequencer.start_and_wait().await;
        sequencer.start_and_wait().await;
    }
}
