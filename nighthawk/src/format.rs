use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use nighthawk_stats::StatRecord;
use nighthawk_worker::orchestrator::Outcome as OrchestratorOutcome;
use nighthawk_worker::result::CounterEntry;

use crate::cli::{Cli, OutputFormat};

/// Wall-clock seconds+nanos at run completion.
#[derive(Debug, Serialize)]
pub struct Timestamp {
    pub seconds: u64,
    pub nanos: u32,
}

impl Timestamp {
    pub fn now() -> Self {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self {
            seconds: since_epoch.as_secs(),
            nanos: since_epoch.subsec_nanos(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ResultEntry {
    pub name: String,
    pub statistics: Vec<StatRecord>,
    pub counters: Vec<CounterEntry>,
}

/// The structured result document: the core's merged statistics and
/// counters, wrapped with the echoed options and a completion timestamp.
/// This is the binary layer's sole responsibility — the core
/// (`nighthawk_worker::Outcome`) knows nothing of `Cli`.
#[derive(Debug, Serialize)]
pub struct RunResultDocument {
    pub options: Cli,
    pub timestamp: Timestamp,
    pub results: Vec<ResultEntry>,
}

impl RunResultDocument {
    pub fn new(cli: &Cli, outcome: &OrchestratorOutcome) -> Self {
        Self {
            options: cli.clone(),
            timestamp: Timestamp::now(),
            results: vec![ResultEntry {
                name: "global".to_string(),
                statistics: outcome.global.statistics.clone(),
                counters: outcome.global.counters.clone(),
            }],
        }
    }
}

pub fn render(format: OutputFormat, doc: &RunResultDocument) -> anyhow::Result<()> {
    match format {
        OutputFormat::Human => render_human(doc),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(doc)?);
            Ok(())
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(doc)?);
            Ok(())
        }
    }
}

fn render_human(doc: &RunResultDocument) -> anyhow::Result<()> {
    for result in &doc.results {
        println!("--- {} ---", result.name);
        for stat in &result.statistics {
            println!(
                "{:<45} count={:<10} mean={:>14.1}ns pstdev={:>14.1}ns",
                stat.id, stat.count, stat.mean_ns, stat.pstdev_ns
            );
            if let Some(percentiles) = &stat.percentiles {
                for entry in percentiles {
                    println!(
                        "    p{:<9} {:>14.1}ns  (n={})",
                        entry.percentile, entry.latency_ns, entry.cumulative_count
                    );
                }
            }
        }
        for counter in &result.counters {
            println!("{:<45} {}", counter.name, counter.value);
        }
    }
    Ok(())
}
