use std::time::Duration;

use clap::Parser;

use cli::Cli;
use nighthawk_client::Endpoint;
use nighthawk_worker::orchestrator::Cfg as OrchestratorCfg;
use nighthawk_worker::{ConcurrencySpec, Orchestrator};

mod cli;
mod format;
mod persistence;

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity.to_tracing_level())
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:?}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let endpoint = Endpoint::parse(&cli.uri)?;
    let concurrency = ConcurrencySpec::parse(&cli.concurrency)?;

    let orchestrator_cfg = OrchestratorCfg {
        endpoint,
        use_h2: cli.h2,
        connections: cli.connections,
        rps: cli.rps,
        duration: Duration::from_secs(cli.duration),
        timeout: Duration::from_secs(cli.timeout),
        concurrency,
    };

    let outcome = Orchestrator::run(orchestrator_cfg)?;
    let document = format::RunResultDocument::new(&cli, &outcome);

    let path = persistence::persist(&document)?;
    tracing::info!(path = %path.display(), "wrote measurements");
    format::render(cli.output_format, &document)?;

    if !outcome.success {
        anyhow::bail!("one or more workers failed to initialize; see log output above");
    }
    Ok(())
}
