use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

/// A per-worker, by-name counter store. Counters are merged across workers
/// by summing same-named entries, so the map itself needs no cross-worker
/// coordination — only within-worker interior mutability for the concurrent
/// in-flight completion callbacks sharing one client.
#[derive(Debug, Clone, Default)]
pub struct CounterMap {
    inner: Arc<Mutex<HashMap<String, u64>>>,
}

impl CounterMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn increment(&self, name: &str) {
        self.add(name, 1).await;
    }

    pub async fn add(&self, name: &str, by: u64) {
        let mut guard = self.inner.lock().await;
        *guard.entry(name.to_string()).or_insert(0) += by;
    }

    pub async fn snapshot(&self) -> HashMap<String, u64> {
        self.inner.lock().await.clone()
    }
}

/// Buckets an HTTP status code into the `benchmark.http_{1,2,3,4,5,x}xx`
/// counter name.
pub fn status_bucket_counter_name(status: u16) -> &'static str {
    match status {
        100..=199 => "benchmark.http_1xx",
        200..=299 => "benchmark.http_2xx",
        300..=399 => "benchmark.http_3xx",
        400..=499 => "benchmark.http_4xx",
        500..=599 => "benchmark.http_5xx",
        _ => "benchmark.http_xxx",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buckets_status_codes() {
        assert_eq!(status_bucket_counter_name(101), "benchmark.http_1xx");
        assert_eq!(status_bucket_counter_name(200), "benchmark.http_2xx");
        assert_eq!(status_bucket_counter_name(404), "benchmark.http_4xx");
        assert_eq!(status_bucket_counter_name(503), "benchmark.http_5xx");
        assert_eq!(status_bucket_counter_name(42), "benchmark.http_xxx");
        assert_eq!(status_bucket_counter_name(700), "benchmark.http_xxx");
    }

    #[tokio::test]
    async fn counters_accumulate_and_snapshot() {
        let counters = CounterMap::new();
        counters.increment("a").await;
        counters.increment("a").await;
        counters.add("b", 5).await;

        let snapshot = counters.snapshot().await;
        assert_eq!(snapshot.get("a"), Some(&2));
        assert_eq!(snapshot.get("b"), Some(&5));
    }
}
