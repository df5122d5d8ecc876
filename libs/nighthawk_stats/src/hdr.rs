use hdrhistogram::Histogram;

use crate::statistic::{PERCENTILE_LADDER, PercentileEntry, StatRecord, Statistic};

/// Lower/upper trackable bounds, in nanoseconds: 1 ns .. 60 s. Lifted from
/// the original `HdrStatistic`'s `hdr_init(1, 60_000_000_000, 4, …)`.
const MIN_TRACKABLE_NS: u64 = 1;
const MAX_TRACKABLE_NS: u64 = 60 * 1_000_000_000;
const SIGNIFICANT_DIGITS: u8 = 4;

/// A statistic backed by a high-dynamic-range histogram: bounded memory,
/// accurate tail percentiles, at the cost of `SIGNIFICANT_DIGITS` of
/// precision per bucket.
#[derive(Debug, Clone)]
pub struct HdrStatistic {
    histogram: Histogram<u64>,
    dropped: u64,
}

impl HdrStatistic {
    pub fn new() -> Self {
        let histogram = Histogram::new_with_bounds(
            MIN_TRACKABLE_NS,
            MAX_TRACKABLE_NS,
            SIGNIFICANT_DIGITS as u8,
        )
        .expect("fixed bounds/precision are valid for hdrhistogram");
        Self {
            histogram,
            dropped: 0,
        }
    }

    /// Number of samples dropped for falling outside `[1 ns, 60 s]`.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    fn cumulative_count_up_to(&self, value: u64) -> u64 {
        self.histogram
            .iter_recorded()
            .filter(|iv| iv.value_iterated_to() <= value)
            .map(|iv| iv.count_at_value())
            .sum()
    }

    /// Iterates bucket-equivalent values to compute the population variance;
    /// the library only gives us the mean directly.
    fn population_pvariance(&self) -> f64 {
        let total = self.histogram.len();
        if total == 0 {
            return f64::NAN;
        }
        let mean = self.histogram.mean();
        let mut sum_sq = 0.0f64;
        for iv in self.histogram.iter_recorded() {
            let count = iv.count_at_value();
            if count == 0 {
                continue;
            }
            let equivalent_value = iv.value_iterated_to() as f64;
            let dev = equivalent_value - mean;
            sum_sq += dev * dev * count as f64;
        }
        sum_sq / total as f64
    }

    pub fn combine(&self, other: &Self) -> Self {
        let mut combined = self.clone();
        if let Err(e) = combined.histogram.add(&other.histogram) {
            tracing::warn!(error = %e, "combining HDR histograms dropped values");
            combined.dropped += other.histogram.len();
        }
        combined.dropped += other.dropped;
        combined
    }
}

impl Default for HdrStatistic {
    fn default() -> Self {
        Self::new()
    }
}

impl Statistic for HdrStatistic {
    fn add(&mut self, value: i64) {
        let clamped = value.clamp(0, i64::MAX) as u64;
        if clamped < MIN_TRACKABLE_NS || clamped > MAX_TRACKABLE_NS {
            self.dropped += 1;
            tracing::warn!(value_ns = value, "HDR sample out of range, dropping");
            return;
        }
        if let Err(e) = self.histogram.record(clamped) {
            self.dropped += 1;
            tracing::warn!(error = %e, "failed to record value into HDR histogram");
        }
    }

    fn count(&self) -> u64 {
        self.histogram.len()
    }

    fn mean(&self) -> f64 {
        if self.histogram.is_empty() {
            f64::NAN
        } else {
            self.histogram.mean()
        }
    }

    fn pvariance(&self) -> f64 {
        self.population_pvariance()
    }

    fn significant_digits(&self) -> u32 {
        SIGNIFICANT_DIGITS as u32
    }

    fn to_record(&self, id: &str) -> StatRecord {
        let percentiles = if self.histogram.is_empty() {
            Vec::new()
        } else {
            PERCENTILE_LADDER
                .iter()
                .map(|&p| {
                    let latency_ns = self.histogram.value_at_quantile(p / 100.0) as f64;
                    PercentileEntry {
                        percentile: p,
                        latency_ns,
                        cumulative_count: self.cumulative_count_up_to(latency_ns as u64),
                    }
                })
                .collect()
        };

        StatRecord {
            id: id.to_string(),
            count: self.count(),
            mean_ns: self.mean(),
            pstdev_ns: self.pstdev(),
            percentiles: Some(percentiles),
        }
    }
}
