use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use nighthawk_client::{BenchmarkHttpClient, ClientLimits, Endpoint};
use nighthawk_sequencer::{Sequencer, SequencerTarget};
use nighthawk_stats::{
    AnyStatistic, Frequency, HdrStatistic, LinearRateLimiter, MonotonicClock, RateLimiter,
};

/// Everything one worker needs to run to completion on its own OS thread.
/// `connections`/`rps` are per-worker, already divided out by the
/// orchestrator; `start_at` is the absolute monotonic instant this worker is
/// phase-offset to begin at.
#[derive(Clone)]
pub struct Cfg {
    pub worker_id: usize,
    pub endpoint: Endpoint,
    pub use_h2: bool,
    pub connections: u64,
    pub rps: f64,
    pub duration: Duration,
    /// Gates both the HTTP client's connect timeout and the sequencer's
    /// grace period; there's no separate per-request timeout flag.
    pub timeout: Duration,
    pub start_at: Instant,
}

/// What one worker reports back to the orchestrator once its thread joins.
/// `statistics`/`counters` are empty when `success` is false: a worker that
/// fails `initialize()` never runs its sequencer.
pub struct Outcome {
    pub worker_id: usize,
    pub success: bool,
    pub statistics: Vec<(String, AnyStatistic)>,
    pub counters: HashMap<String, u64>,
}

/// One per OS thread. Owns its event loop, stats store, HTTP client, and
/// sequencer exclusively for the duration of the run — no mutable state
/// crosses a thread boundary until `Outcome` is handed back to the
/// orchestrator.
pub struct ClientWorker;

impl ClientWorker {
    /// Builds a single-threaded cooperative runtime and runs `cfg` to
    /// completion on the calling thread. Intended to be the body of a
    /// dedicated `std::thread::spawn` closure — see `Orchestrator::run`.
    pub fn run(cfg: Cfg) -> Outcome {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("can build a single-threaded worker runtime");
        runtime.block_on(Self::run_async(cfg))
    }

    async fn run_async(cfg: Cfg) -> Outcome {
        let worker_id = cfg.worker_id;

        let limits = ClientLimits {
            connection_limit: cfg.connections,
            max_pending: cfg.connections.max(1),
            timeout: cfg.timeout,
        };
        let http = BenchmarkHttpClient::new(cfg.endpoint.clone(), cfg.use_h2, limits);

        if !http.initialize().await {
            tracing::error!(worker_id, "failed to initialize HTTP client; worker failing");
            return Outcome {
                worker_id,
                success: false,
                statistics: Vec::new(),
                counters: HashMap::new(),
            };
        }

        Self::warm_up(&http, worker_id).await;
        http.set_measure_latencies(true);
        Self::delay_start(cfg.start_at, worker_id).await;

        let clock = Arc::new(MonotonicClock);
        let rate_limiter: Box<dyn RateLimiter> = Box::new(LinearRateLimiter::new(
            clock.clone(),
            Frequency::from_hz(cfg.rps).expect("rps is validated positive at the CLI boundary"),
        ));

        let target_client = http.clone();
        let target: SequencerTarget = Box::new(move |on_complete| {
            target_client.try_start_one(Box::new(move |_success| on_complete()))
        });

        let sequencer = Sequencer::new(
            clock,
            rate_limiter,
            target,
            cfg.duration,
            cfg.timeout,
            AnyStatistic::Hdr(HdrStatistic::new()),
        );
        sequencer.start_and_wait().await;

        http.terminate();

        let mut statistics: Vec<(String, AnyStatistic)> = sequencer
            .statistics()
            .into_iter()
            .map(|(id, stat)| (id.to_string(), stat))
            .collect();
        statistics.extend(
            http.statistics()
                .await
                .into_iter()
                .map(|(id, stat)| (id.to_string(), stat)),
        );
        let counters = http.counters(None).await;

        tracing::info!(
            worker_id,
            initiated = sequencer.initiated(),
            completed = sequencer.completed(),
            timed_out = sequencer.timed_out(),
            "worker completed"
        );

        Outcome {
            worker_id,
            success: true,
            statistics,
            counters,
        }
    }

    /// Issues exactly one request with latencies off, to force pool
    /// creation. More than one connection may remain unopened if this first
    /// request completes quickly; that's accepted as known behavior rather
    /// than worked around.
    async fn warm_up(http: &BenchmarkHttpClient, worker_id: usize) {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let accepted = http.try_start_one(Box::new(move |success| {
            let _ = tx.send(success);
        }));

        if accepted {
            let _ = rx.await;
        } else {
            tracing::warn!(worker_id, "warm-up request was not accepted by the client");
        }
    }

    /// Spins on the monotonic clock, yielding cooperatively, until
    /// `start_at`. Workers are phase-offset this way so that across the
    /// fleet, request starts are spread evenly across one global tick
    /// instead of bunching at `T0`.
    async fn delay_start(start_at: Instant, worker_id: usize) {
        if Instant::now() >= start_at {
            tracing::warn!(
                worker_id,
                "arrived late to its phase-offset start instant, proceeding immediately"
            );
            return;
        }
        while Instant::now() < start_at {
            tokio::task::yield_now().await;
        }
    }
}
