use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use nighthawk_stats::{AnyStatistic, HdrStatistic};
use tokio::sync::{Mutex, OnceCell, Semaphore};

use crate::counters::{CounterMap, status_bucket_counter_name};
use crate::endpoint::Endpoint;

/// Invoked exactly once, whether the request succeeded or failed.
pub type CompletionCallback = Box<dyn FnOnce(bool) + Send>;

pub const QUEUE_TO_CONNECT_ID: &str = "benchmark_http_client.queue_to_connect";
pub const REQUEST_TO_RESPONSE_ID: &str = "benchmark_http_client.request_to_response";

/// Cluster-style resource limits applied to the upstream. `max_retries` is
/// fixed to 0: a failed attempt is never silently retried, it is reported
/// to the sequencer as a completion with `success = false`.
#[derive(Debug, Clone, Copy)]
pub struct ClientLimits {
    pub connection_limit: u64,
    pub max_pending: u64,
    pub timeout: Duration,
}

impl ClientLimits {
    pub const MAX_RETRIES: u32 = 0;
}

struct ClientInner {
    endpoint: Endpoint,
    use_h2: bool,
    limits: ClientLimits,
    http: OnceCell<reqwest::Client>,
    measure_latencies: AtomicBool,
    requests_initiated: AtomicU64,
    requests_completed: AtomicU64,
    stream_reset_count: AtomicU64,
    pending: Arc<Semaphore>,
    connection_slots: Arc<Semaphore>,
    connect_stat: Mutex<AnyStatistic>,
    response_stat: Mutex<AnyStatistic>,
    counters: CounterMap,
}

/// Per-worker asynchronous HTTP issuer over one resolved upstream endpoint.
/// Cheaply `Clone`-able (an `Arc` around the mutable state) so in-flight
/// completions spawned onto the worker's event loop can hold their own
/// handle back to it.
#[derive(Clone)]
pub struct BenchmarkHttpClient {
    inner: Arc<ClientInner>,
}

impl BenchmarkHttpClient {
    pub fn new(endpoint: Endpoint, use_h2: bool, limits: ClientLimits) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                endpoint,
                use_h2,
                limits,
                http: OnceCell::new(),
                measure_latencies: AtomicBool::new(false),
                requests_initiated: AtomicU64::new(0),
                requests_completed: AtomicU64::new(0),
                stream_reset_count: AtomicU64::new(0),
                pending: Arc::new(Semaphore::new(limits.max_pending.max(1) as usize)),
                connection_slots: Arc::new(Semaphore::new(limits.connection_limit.max(1) as usize)),
                connect_stat: Mutex::new(AnyStatistic::Hdr(HdrStatistic::new())),
                response_stat: Mutex::new(AnyStatistic::Hdr(HdrStatistic::new())),
                counters: CounterMap::new(),
            }),
        }
    }

    /// Resolves DNS (if not already resolved) and builds the connection
    /// pool. Returns `false` if resolution fails; called once on the
    /// worker thread before any `try_start_one`.
    pub async fn initialize(&self) -> bool {
        let addr = match self.inner.endpoint.resolve().await {
            Ok(addr) => addr,
            Err(e) => {
                tracing::error!(error = %e, host = %self.inner.endpoint.host, "DNS resolution failed");
                return false;
            }
        };

        let mut builder = reqwest::Client::builder()
            .connect_timeout(self.inner.limits.timeout)
            .resolve(&self.inner.endpoint.host, addr)
            .pool_max_idle_per_host(self.inner.limits.connection_limit as usize);

        if self.inner.use_h2 {
            builder = builder.http2_prior_knowledge();
        }
        if self.inner.endpoint.is_https() {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = match builder.build() {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "failed to build HTTP client");
                return false;
            }
        };

        self.inner
            .http
            .set(client)
            .ok(); // idempotent: initialize() is documented single-use per worker
        true
    }

    pub fn set_measure_latencies(&self, enabled: bool) {
        self.inner.measure_latencies.store(enabled, Ordering::Relaxed);
    }

    /// Non-blocking. Returns `false` iff the pending-request limit is
    /// reached or `requests_initiated - requests_completed >=
    /// connection_limit` — the same gate applied identically for HTTP/1 and
    /// HTTP/2.
    pub fn try_start_one(&self, on_complete: CompletionCallback) -> bool {
        let initiated = self.inner.requests_initiated.load(Ordering::SeqCst);
        let completed = self.inner.requests_completed.load(Ordering::SeqCst);
        if initiated.saturating_sub(completed) >= self.inner.limits.connection_limit {
            return false;
        }

        let pending_permit = match Arc::clone(&self.inner.pending).try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => return false,
        };

        self.inner.requests_initiated.fetch_add(1, Ordering::SeqCst);
        let client = self.clone();
        tokio::spawn(async move {
            client.issue_request(on_complete, pending_permit).await;
        });
        true
    }

    async fn issue_request(
        &self,
        on_complete: CompletionCallback,
        _pending_permit: tokio::sync::OwnedSemaphorePermit,
    ) {
        let connect_start = Instant::now();
        let conn_permit = self.inner.connection_slots.clone().acquire_owned().await;
        let request_start = Instant::now();
        if self.inner.measure_latencies.load(Ordering::Relaxed) {
            let ns = (request_start - connect_start).as_nanos() as i64;
            self.inner.connect_stat.lock().await.add(ns);
        }

        let http = self
            .inner
            .http
            .get()
            .expect("initialize() must run before try_start_one");
        let result = http
            .get(self.inner.endpoint.base_url())
            .timeout(self.inner.limits.timeout)
            .send()
            .await;

        // The connection is considered free for the next queued request once
        // headers are back, whether or not the body has been consumed yet.
        drop(conn_permit);

        self.inner.requests_completed.fetch_add(1, Ordering::SeqCst);

        match result {
            Ok(response) => {
                let status = response.status().as_u16();
                // Drain the body so it never accumulates unread in memory.
                let body_result = response.bytes().await;

                if let Err(e) = body_result {
                    self.inner.stream_reset_count.fetch_add(1, Ordering::SeqCst);
                    self.inner.counters.increment("benchmark.stream_resets").await;
                    tracing::warn!(error = %e, "stream reset while reading response body");
                    on_complete(false);
                    return;
                }

                if self.inner.measure_latencies.load(Ordering::Relaxed) {
                    let ns = (Instant::now() - request_start).as_nanos() as i64;
                    self.inner.response_stat.lock().await.add(ns);
                }
                self.inner
                    .counters
                    .increment(status_bucket_counter_name(status))
                    .await;
                on_complete(true);
            }
            Err(e) => {
                if e.is_connect() {
                    self.inner.counters.increment("upstream_cx_connect_fail").await;
                    self.inner
                        .counters
                        .increment("upstream_rq_pending_failure_eject")
                        .await;
                    self.inner.stream_reset_count.fetch_add(1, Ordering::SeqCst);
                    self.inner.counters.increment("benchmark.stream_resets").await;
                } else if e.is_timeout() {
                    self.inner
                        .counters
                        .increment("upstream_rq_pending_failure_eject")
                        .await;
                    self.inner.stream_reset_count.fetch_add(1, Ordering::SeqCst);
                    self.inner.counters.increment("benchmark.stream_resets").await;
                } else {
                    self.inner.stream_reset_count.fetch_add(1, Ordering::SeqCst);
                    self.inner.counters.increment("benchmark.stream_resets").await;
                }
                tracing::debug!(error = %e, "request failed");
                on_complete(false);
            }
        }
    }

    pub fn terminate(&self) {
        tracing::debug!("benchmark http client terminated");
    }

    pub fn requests_initiated(&self) -> u64 {
        self.inner.requests_initiated.load(Ordering::SeqCst)
    }

    pub fn requests_completed(&self) -> u64 {
        self.inner.requests_completed.load(Ordering::SeqCst)
    }

    pub fn stream_reset_count(&self) -> u64 {
        self.inner.stream_reset_count.load(Ordering::SeqCst)
    }

    pub async fn statistics(&self) -> Vec<(&'static str, AnyStatistic)> {
        vec![
            (QUEUE_TO_CONNECT_ID, self.inner.connect_stat.lock().await.clone()),
            (
                REQUEST_TO_RESPONSE_ID,
                self.inner.response_stat.lock().await.clone(),
            ),
        ]
    }

    pub async fn counters(&self, filter: Option<&str>) -> std::collections::HashMap<String, u64> {
        let snapshot = self.inner.counters.snapshot().await;
        match filter {
            None => snapshot,
            Some(prefix) => snapshot
                .into_iter()
                .filter(|(name, _)| name.starts_with(prefix))
                .collect(),
        }
    }
}
