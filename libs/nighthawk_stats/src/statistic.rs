use serde::Serialize;

/// Common, object-safe contract shared by all statistic implementations.
///
/// Combining is deliberately *not* part of this trait: the concrete kinds
/// are a tagged sum (see [`AnyStatistic`]), and attempting to combine two
/// different kinds is a programmer error (`CombineError::TypeMismatch`)
/// rather than an implicit coercion.
pub trait Statistic: std::fmt::Debug + Send {
    fn add(&mut self, value: i64);
    fn count(&self) -> u64;
    fn mean(&self) -> f64;
    fn pvariance(&self) -> f64;

    fn pstdev(&self) -> f64 {
        self.pvariance().sqrt()
    }

    /// Declared numeric precision, used to relax equality comparisons in
    /// tests. 0 means exact.
    fn significant_digits(&self) -> u32 {
        0
    }

    /// Only the Welford streaming variant declares `true`.
    fn resists_catastrophic_cancellation(&self) -> bool {
        false
    }

    fn to_record(&self, id: &str) -> StatRecord;
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PercentileEntry {
    pub percentile: f64,
    pub latency_ns: f64,
    pub cumulative_count: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatRecord {
    pub id: String,
    pub count: u64,
    pub mean_ns: f64,
    pub pstdev_ns: f64,
    /// Populated only for the HDR variant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentiles: Option<Vec<PercentileEntry>>,
}

/// The percentile ladder `to_record()` emits for the HDR variant, lifted
/// from the original `HdrStatistic::toString()`.
pub const PERCENTILE_LADDER: &[f64] = &[50.0, 75.0, 90.0, 99.0, 99.9, 99.99, 99.999, 100.0];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CombineError {
    #[error("cannot combine statistics of different kinds: {0} vs {1}")]
    TypeMismatch(&'static str, &'static str),
}

use crate::hdr::HdrStatistic;
use crate::simple::SimpleStatistic;
use crate::streaming::StreamingStatistic;

/// The tagged sum of statistic implementations. This is the type stored in
/// per-worker and merged stats stores: callers never juggle trait objects,
/// they pick a kind up front and `combine` refuses to cross kinds.
#[derive(Debug, Clone)]
pub enum AnyStatistic {
    Simple(SimpleStatistic),
    Streaming(StreamingStatistic),
    Hdr(HdrStatistic),
}

impl AnyStatistic {
    pub fn kind_name(&self) -> &'static str {
        match self {
            AnyStatistic::Simple(_) => "simple",
            AnyStatistic::Streaming(_) => "streaming",
            AnyStatistic::Hdr(_) => "hdr",
        }
    }

    pub fn add(&mut self, value: i64) {
        match self {
            AnyStatistic::Simple(s) => s.add(value),
            AnyStatistic::Streaming(s) => s.add(value),
            AnyStatistic::Hdr(s) => s.add(value),
        }
    }

    pub fn count(&self) -> u64 {
        match self {
            AnyStatistic::Simple(s) => s.count(),
            AnyStatistic::Streaming(s) => s.count(),
            AnyStatistic::Hdr(s) => s.count(),
        }
    }

    pub fn mean(&self) -> f64 {
        match self {
            AnyStatistic::Simple(s) => s.mean(),
            AnyStatistic::Streaming(s) => s.mean(),
            AnyStatistic::Hdr(s) => s.mean(),
        }
    }

    pub fn pvariance(&self) -> f64 {
        match self {
            AnyStatistic::Simple(s) => s.pvariance(),
            AnyStatistic::Streaming(s) => s.pvariance(),
            AnyStatistic::Hdr(s) => s.pvariance(),
        }
    }

    pub fn pstdev(&self) -> f64 {
        match self {
            AnyStatistic::Simple(s) => s.pstdev(),
            AnyStatistic::Streaming(s) => s.pstdev(),
            AnyStatistic::Hdr(s) => s.pstdev(),
        }
    }

    pub fn significant_digits(&self) -> u32 {
        match self {
            AnyStatistic::Simple(s) => s.significant_digits(),
            AnyStatistic::Streaming(s) => s.significant_digits(),
            AnyStatistic::Hdr(s) => s.significant_digits(),
        }
    }

    pub fn resists_catastrophic_cancellation(&self) -> bool {
        match self {
            AnyStatistic::Simple(s) => s.resists_catastrophic_cancellation(),
            AnyStatistic::Streaming(s) => s.resists_catastrophic_cancellation(),
            AnyStatistic::Hdr(s) => s.resists_catastrophic_cancellation(),
        }
    }

    pub fn to_record(&self, id: &str) -> StatRecord {
        match self {
            AnyStatistic::Simple(s) => s.to_record(id),
            AnyStatistic::Streaming(s) => s.to_record(id),
            AnyStatistic::Hdr(s) => s.to_record(id),
        }
    }

    /// Combines two statistics of the same kind. Combining an empty
    /// statistic with `s` yields a statistic equal to `s`; combining across
    /// kinds is a `TypeMismatch`.
    pub fn combine(&self, other: &AnyStatistic) -> Result<AnyStatistic, CombineError> {
        match (self, other) {
            (AnyStatistic::Simple(a), AnyStatistic::Simple(b)) => {
                Ok(AnyStatistic::Simple(a.combine(b)))
            }
            (AnyStatistic::Streaming(a), AnyStatistic::Streaming(b)) => {
                Ok(AnyStatistic::Streaming(a.combine(b)))
            }
            (AnyStatistic::Hdr(a), AnyStatistic::Hdr(b)) => Ok(AnyStatistic::Hdr(a.combine(b))),
            (a, b) => Err(CombineError::TypeMismatch(a.kind_name(), b.kind_name())),
        }
    }
}
