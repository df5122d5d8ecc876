//! The per-worker asynchronous HTTP issuer (`BenchmarkHttpClient`) and the
//! endpoint parsing/resolution it depends on.

pub mod benchmark_client;
pub mod counters;
pub mod endpoint;

pub use benchmark_client::{
    BenchmarkHttpClient, ClientLimits, CompletionCallback, QUEUE_TO_CONNECT_ID,
    REQUEST_TO_RESPONSE_ID,
};
pub use counters::{CounterMap, status_bucket_counter_name};
pub use endpoint::{Endpoint, EndpointError, Scheme};
