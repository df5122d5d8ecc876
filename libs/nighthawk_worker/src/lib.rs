//! `ClientWorker` (one per OS thread) and `Orchestrator` (determines
//! concurrency, starts/joins workers, merges their results). The top of the
//! load-generation core; the `nighthawk` binary crate is the only consumer.

pub mod client_worker;
pub mod orchestrator;
pub mod result;

pub use client_worker::ClientWorker;
pub use orchestrator::{ConcurrencySpec, Orchestrator, OrchestratorError};
pub use result::{CounterEntry, GlobalResult};
