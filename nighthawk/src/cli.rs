use serde::Serialize;

/// Command-line surface. Echoed verbatim into the result document's
/// `options` field.
#[derive(Debug, Clone, Serialize, clap::Parser)]
#[command(
    name = "nighthawk",
    version,
    about = "A layer-7 HTTP/1.1 and HTTP/2 load generator."
)]
pub struct Cli {
    /// Target URI, e.g. http://example.com/ or https://[::1]:8443/path
    pub uri: String,

    /// Requests per second, per worker.
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
    pub rps: u64,

    /// Max connections, per worker.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    pub connections: u64,

    /// Duration of the measured run, in seconds.
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
    pub duration: u64,

    /// Connection timeout and grace period, in seconds.
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,

    /// Request HTTP/2 instead of HTTP/1.1.
    #[arg(long)]
    pub h2: bool,

    /// Number of worker threads: a positive integer, or "auto" for the
    /// number of CPUs this process has affinity to.
    #[arg(long, default_value = "1")]
    pub concurrency: String,

    /// Logging verbosity.
    #[arg(long, value_enum, default_value_t = Verbosity::Info)]
    pub verbosity: Verbosity,

    /// How to render the result document to stdout.
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::EnumString, strum::Display, clap::ValueEnum,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    /// Folded into `tracing::Level::ERROR`: no separate tracing level
    /// exists below error.
    Critical,
}

impl Verbosity {
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Verbosity::Trace => tracing::Level::TRACE,
            Verbosity::Debug => tracing::Level::DEBUG,
            Verbosity::Info => tracing::Level::INFO,
            Verbosity::Warn => tracing::Level::WARN,
            Verbosity::Error | Verbosity::Critical => tracing::Level::ERROR,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::EnumString, strum::Display, clap::ValueEnum,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Human,
    Json,
    Yaml,
}
