//! Binary entrypoint for the cell script runner.
use anyhow::{bail, Context};
use cellbridge_cli::{run_script_with, CellScript, Cli, OutputLine};
use cellbridge_context::{BridgeConfig, ChannelSink, ContextBindingBroker, SimpleBindings};
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = BridgeConfig::resolve(cli.config.as_deref())
        .context("failed to load bridge configuration")?;
    init_tracing(cli.log_level.as_deref().unwrap_or(&config.log_level));

    let script = CellScript::load(&cli.script)
        .with_context(|| format!("failed to load cell script {}", cli.script.display()))?;
    info!(cells = script.cells.len(), scope = ?config.scope, "running cell script");

    // Emissions stream out while the cells run.
    let (sink, mut rx) = ChannelSink::unbounded();
    let writer = tokio::spawn(async move {
        while let Some(emission) = rx.recv().await {
            match OutputLine::emission(&emission).to_line() {
                Ok(line) => println!("{line}"),
                Err(e) => error!(unit = %emission.unit, error = %e, "cannot encode emission"),
            }
        }
    });

    let mut broker = ContextBindingBroker::new(&config, Arc::new(sink));
    let mut bindings = SimpleBindings::new();
    let outcome = run_script_with(&script, cli.unit_naming(), &mut broker, &mut bindings);
    broker.close(&mut bindings);
    drop(broker);
    writer.await.context("output writer task failed")?;

    let reports = outcome?;
    for report in &reports {
        println!("{}", OutputLine::result(report).to_line()?);
    }

    let failed = reports.iter().filter(|r| !r.is_ok()).count();
    if failed > 0 {
        bail!("{failed} call(s) failed");
    }
    Ok(())
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
