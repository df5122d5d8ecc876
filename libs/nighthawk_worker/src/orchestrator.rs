use std::collections::HashMap;
use std::thread;
use std::time::{Duration, Instant};

use nighthawk_client::{Endpoint, EndpointError};
use nighthawk_stats::AnyStatistic;

use crate::client_worker::{self, ClientWorker};
use crate::result::{CounterEntry, GlobalResult};

/// Safety margin added to every worker's phase-offset start instant, so that
/// the slowest worker to finish bootstrapping (DNS, pool warm-up) is still
/// ready before the measured run begins.
const START_SAFETY_MARGIN: Duration = Duration::from_secs(2);

/// `--concurrency`: either a positive thread count or `"auto"`, meaning "the
/// number of CPUs this process has affinity to".
#[derive(Debug, Clone, Copy)]
pub enum ConcurrencySpec {
    Auto,
    Fixed(usize),
}

impl ConcurrencySpec {
    pub fn parse(raw: &str) -> Result<Self, OrchestratorError> {
        if raw.eq_ignore_ascii_case("auto") {
            return Ok(ConcurrencySpec::Auto);
        }
        match raw.parse::<usize>() {
            Ok(n) if n > 0 => Ok(ConcurrencySpec::Fixed(n)),
            _ => Err(OrchestratorError::InvalidConcurrency(raw.to_string())),
        }
    }

    fn resolve(self) -> usize {
        match self {
            ConcurrencySpec::Auto => num_cpus::get(),
            ConcurrencySpec::Fixed(n) => n,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("invalid concurrency {0:?}, expected a positive integer or \"auto\"")]
    InvalidConcurrency(String),
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
}

/// Run-wide parameters; `connections`/`rps` are **per worker** — both are
/// already per-worker quantities on the CLI, and the global figure is
/// `value × concurrency`.
pub struct Cfg {
    pub endpoint: Endpoint,
    pub use_h2: bool,
    pub connections: u64,
    pub rps: u64,
    pub duration: Duration,
    pub timeout: Duration,
    pub concurrency: ConcurrencySpec,
}

pub struct Outcome {
    pub success: bool,
    pub concurrency: usize,
    pub global: GlobalResult,
    pub worker_outcomes: Vec<client_worker::Outcome>,
}

/// Determines concurrency, creates and starts `concurrency` workers, joins
/// them, and merges their statistics and counters into one result. Owns the
/// worker set exclusively; nothing here survives across runs.
pub struct Orchestrator;

impl Orchestrator {
    pub fn run(cfg: Cfg) -> Result<Outcome, OrchestratorError> {
        let concurrency = cfg.concurrency.resolve();

        let global_rps = cfg.rps * concurrency as u64;
        let global_connections = cfg.connections * concurrency as u64;
        tracing::info!(
            concurrency,
            connections_total = global_connections,
            rps_total = global_rps,
            "starting run"
        );

        // Resolved once on the main thread so a bad endpoint fails fast,
        // before any worker thread is spawned. Each worker's
        // `BenchmarkHttpClient::initialize` resolves again independently —
        // the endpoint is an immutable value shared by copy, not a
        // connection the main thread hands off.
        let resolver_runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("can build the resolver runtime");
        resolver_runtime.block_on(cfg.endpoint.resolve())?;

        let t0 = Instant::now() + START_SAFETY_MARGIN;
        let inter_worker_delay = if global_rps > 0 {
            Duration::from_secs_f64(1.0 / global_rps as f64)
        } else {
            Duration::ZERO
        };

        let handles: Vec<_> = (0..concurrency)
            .map(|worker_id| {
                let worker_cfg = client_worker::Cfg {
                    worker_id,
                    endpoint: cfg.endpoint.clone(),
                    use_h2: cfg.use_h2,
                    connections: cfg.connections,
                    rps: cfg.rps as f64,
                    duration: cfg.duration,
                    timeout: cfg.timeout,
                    start_at: t0 + inter_worker_delay * worker_id as u32,
                };
                thread::Builder::new()
                    .name(format!("nighthawk-worker-{worker_id}"))
                    .spawn(move || ClientWorker::run(worker_cfg))
                    .expect("can spawn a worker OS thread")
            })
            .collect();

        let worker_outcomes: Vec<client_worker::Outcome> = handles
            .into_iter()
            .map(|handle| handle.join().expect("worker thread panicked"))
            .collect();

        let success = worker_outcomes.iter().all(|o| o.success);
        let global = merge(&worker_outcomes);

        Ok(Outcome {
            success,
            concurrency,
            global,
            worker_outcomes,
        })
    }
}

/// Combines every worker's per-id statistics with `AnyStatistic::combine`
/// and sums counters by name.
fn merge(outcomes: &[client_worker::Outcome]) -> GlobalResult {
    let mut stats: HashMap<String, AnyStatistic> = HashMap::new();
    let mut counters: HashMap<String, u64> = HashMap::new();

    for outcome in outcomes {
        for (id, stat) in &outcome.statistics {
            stats
                .entry(id.clone())
                .and_modify(|existing| {
                    *existing = existing
                        .combine(stat)
                        .expect("every worker's sequencer/client builds the same statistic kind per id");
                })
                .or_insert_with(|| stat.clone());
        }
        for (name, value) in &outcome.counters {
            *counters.entry(name.clone()).or_insert(0) += value;
        }
    }

    let mut statistics: Vec<_> = stats.iter().map(|(id, stat)| stat.to_record(id)).collect();
    statistics.sort_by(|a, b| a.id.cmp(&b.id));

    let mut counters: Vec<CounterEntry> = counters
        .into_iter()
        .map(|(name, value)| CounterEntry { name, value })
        .collect();
    counters.sort_by(|a, b| a.name.cmp(&b.name));

    GlobalResult {
        statistics,
        counters,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concurrency_auto_parses() {
        assert!(matches!(
            ConcurrencySpec::parse("auto").unwrap(),
            ConcurrencySpec::Auto
        ));
        assert!(matches!(
            ConcurrencySpec::parse("AUTO").unwrap(),
            ConcurrencySpec::Auto
        ));
    }

    #[test]
    fn concurrency_rejects_zero_and_non_numeric() {
        assert!(ConcurrencySpec::parse("0").is_err());
        assert!(ConcurrencySpec::parse("nope").is_err());
        assert!(ConcurrencySpec::parse("-1").is_err());
    }

    #[test]
    fn concurrency_accepts_positive_integer() {
        assert!(matches!(
            ConcurrencySpec::parse("4").unwrap(),
            ConcurrencySpec::Fixed(4)
        ));
    }

    #[test]
    fn merge_sums_counters_and_combines_statistics_by_id() {
        use nighthawk_stats::HdrStatistic;

        let mut a_stat = AnyStatistic::Hdr(HdrStatistic::new());
        a_stat.add(1_000);
        let mut b_stat = AnyStatistic::Hdr(HdrStatistic::new());
        b_stat.add(2_000);

        let outcomes = vec![
            client_worker::Outcome {
                worker_id: 0,
                success: true,
                statistics: vec![("sequencer.callback".to_string(), a_stat)],
                counters: HashMap::from([("benchmark.http_2xx".to_string(), 5u64)]),
            },
            client_worker::Outcome {
                worker_id: 1,
                success: true,
                statistics: vec![("sequencer.callback".to_string(), b_stat)],
                counters: HashMap::from([("benchmark.http_2xx".to_string(), 5u64)]),
            },
        ];

        let merged = merge(&outcomes);
        let stat = merged
            .statistics
            .iter()
            .find(|s| s.id == "sequencer.callback")
            .unwrap();
        assert_eq!(stat.count, 2);

        let counter = merged
            .counters
            .iter()
            .find(|c| c.name == "benchmark.http_2xx")
            .unwrap();
        assert_eq!(counter.value, 10);
    }

    #[test]
    fn success_is_false_if_any_worker_failed() {
        let outcomes = vec![
            client_worker::Outcome {
                worker_id: 0,
                success: true,
                statistics: Vec::new(),
                counters: HashMap::new(),
            },
            client_worker::Outcome {
                worker_id: 1,
                success: false,
                statistics: Vec::new(),
                counters: HashMap::new(),
            },
        ];
        assert!(!outcomes.iter().all(|o| o.success));
    }
}
