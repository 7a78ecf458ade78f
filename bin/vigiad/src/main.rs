//! ---
//! vigia_section: "01-core-functionality"
//! vigia_subsection: "binary"
//! vigia_type: "source"
//! vigia_scope: "code"
//! vigia_description: "Binary entrypoint for the Vigia daemon."
//! vigia_version: "v0.0.0-prealpha"
//! vigia_owner: "tbd"
//! ---
mod alerts;
mod simulate;

use std::io;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::{info, warn};
use vigia_common::config::AppConfig;
use vigia_common::logging::init_tracing;
use vigia_core::{AlertFeedBridge, MonitorRuntime};
use vigia_metrics::{new_registry, spawn_http_server, DaemonMetrics, MonitorMetrics};

use crate::alerts::AlertCommand;
use crate::simulate::SimulateArgs;

const DEFAULT_CONFIG_CANDIDATES: &[&str] = &["configs/vigia.toml", "configs/vigia.example.toml"];

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Vigia offshore rig telemetry monitor",
    long_about = None
)]
struct Cli {
    #[arg(long, global = true, value_name = "FILE", help = "Path to configuration file")]
    config: Option<PathBuf>,

    #[arg(long, global = true, help = "Seed the simulation RNG for reproducible runs")]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Run the live monitoring loop until interrupted")]
    Run,
    #[command(about = "Generate telemetry without timers and export it as CSV or JSON")]
    Simulate(SimulateArgs),
    #[command(subcommand, about = "Inspect or manage the persisted alert feed")]
    Alerts(AlertCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let load_started = Instant::now();
    let mut config = load_config(cli.config.as_ref())?;
    let load_duration = load_started.elapsed();
    if let Some(seed) = cli.seed {
        config.simulation.random_seed = Some(seed);
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_daemon(config, load_duration.as_secs_f64()).await?,
        Commands::Simulate(args) => simulate::execute(&args, config.simulation)?,
        Commands::Alerts(command) => {
            let feed = alerts::open_feed(&config.alerts)?;
            alerts::execute(&command, &feed, &mut io::stdout().lock())?;
        }
    }

    Ok(())
}

fn load_config(explicit: Option<&PathBuf>) -> Result<AppConfig> {
    let mut candidates = Vec::new();
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(anyhow!("config file {} does not exist", path.display()));
        }
        candidates.push(path.clone());
    }
    candidates.extend(DEFAULT_CONFIG_CANDIDATES.iter().map(PathBuf::from));
    Ok(AppConfig::load_with_source(&candidates)?.config)
}

async fn run_daemon(config: AppConfig, config_load_seconds: f64) -> Result<()> {
    init_tracing("vigiad", &config.logging)?;

    let registry = new_registry();
    let daemon_metrics = DaemonMetrics::new(registry.clone())?;
    daemon_metrics.observe_config_load(config_load_seconds);
    daemon_metrics.inc_start();

    let (metrics_server, monitor_metrics) = if config.metrics.enabled {
        let monitor_metrics = MonitorMetrics::new(registry.clone())?;
        let server = spawn_http_server(registry, config.metrics.listen)?;
        info!(address = %server.addr(), "metrics exporter enabled");
        (Some(server), Some(monitor_metrics))
    } else {
        info!("metrics exporter disabled by configuration");
        (None, None)
    };

    let feed = AlertFeedBridge::from_config(&config.alerts)?.with_metrics(monitor_metrics.clone());
    let mut runtime = MonitorRuntime::new(config.simulation.clone())?.with_feed(feed);
    if let Some(metrics) = monitor_metrics {
        runtime = runtime.with_metrics(metrics);
    }
    let handle = runtime.start();

    info!(
        store = %config.alerts.directory.display(),
        "daemon running; waiting for termination signal"
    );
    signal::ctrl_c().await?;
    info!("ctrl-c received; shutting down");
    let last = handle.shutdown().await?;
    info!(ticks = last.tick, "monitor stopped");

    if let Some(server) = metrics_server {
        if let Err(err) = server.shutdown().await {
            warn!(error = %err, "metrics exporter did not stop cleanly");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn seed_is_accepted_after_subcommand() {
        let cli = Cli::parse_from(["vigiad", "simulate", "--ticks", "10", "--seed", "7"]);
        assert_eq!(cli.seed, Some(7));
        match cli.command {
            Some(Commands::Simulate(args)) => assert_eq!(args.ticks, 10),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn config_is_accepted_after_nested_subcommand() {
        let cli = Cli::parse_from(["vigiad", "alerts", "list", "--config", "ops/vigia.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("ops/vigia.toml")));
        assert!(matches!(
            cli.command,
            Some(Commands::Alerts(AlertCommand::List { json: false, .. }))
        ));
    }

    #[test]
    fn alerts_ack_parses_uuid() {
        let id = uuid::Uuid::new_v4();
        let id_text = id.to_string();
        let cli = Cli::parse_from(["vigiad", "alerts", "ack", id_text.as_str()]);
        assert!(matches!(cli.command, Some(Commands::Alerts(AlertCommand::Ack { id: parsed })) if parsed == id));
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let path = PathBuf::from("definitely/not/here.toml");
        assert!(load_config(Some(&path)).is_err());
    }
}
