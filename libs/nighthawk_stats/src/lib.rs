//! Frequency/clock utilities, the linear rate limiter, and the `Statistic`
//! family (simple/streaming/HDR). No I/O: the leaf crate of the workspace.

pub mod clock;
pub mod frequency;
pub mod hdr;
pub mod rate_limiter;
pub mod simple;
pub mod statistic;
pub mod streaming;

#[cfg(test)]
pub mod test_suite;

pub use clock::{Clock, MonotonicClock, SimulatedClock};
pub use frequency::{Frequency, FrequencyError};
pub use hdr::HdrStatistic;
pub use rate_limiter::{LinearRateLimiter, RateLimiter};
pub use simple::SimpleStatistic;
pub use statistic::{AnyStatistic, CombineError, PercentileEntry, StatRecord, Statistic};
pub use streaming::StreamingStatistic;
