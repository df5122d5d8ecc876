//! Drives a caller-supplied target at the pace a rate limiter dictates,
//! until a deadline, then waits up to a grace period for in-flight work to
//! settle. The one consumer of `nighthawk_stats`'s clock and rate-limiter
//! abstractions that isn't itself a statistic.

pub mod sequencer;

pub use sequencer::{
    BLOCKED_ID, CALLBACK_LATENCY_ID, Sequencer, SequencerCompletion, SequencerState,
    SequencerTarget,
};
