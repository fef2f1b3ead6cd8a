use anyhow::Context;
use clap::Parser;
use influx_reporter::application::report;
use influx_reporter::config::ReporterConfig;
use influx_reporter::domain::metrics::Registry;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{Level, info, warn};

/// Report this process's own metrics to InfluxDB until interrupted.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// TOML config file; environment variables are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides the InfluxDB address
    #[arg(long)]
    url: Option<String>,

    /// Overrides the target database
    #[arg(long)]
    database: Option<String>,

    /// Overrides the flush interval
    #[arg(long)]
    interval_secs: Option<u64>,
}

fn load_config(cli: &Cli) -> anyhow::Result<ReporterConfig> {
    let mut config = match &cli.config {
        Some(path) => ReporterConfig::from_file(path)?,
        // --database may supply the only required variable, so defer validation
        None if cli.database.is_some() => ReporterConfig::from_lookup(|key| match key {
            "INFLUXDB_DATABASE" => cli.database.clone(),
            _ => std::env::var(key).ok(),
        })?,
        None => ReporterConfig::from_env()?,
    };

    if let Some(url) = &cli.url {
        config.address = url.clone();
    }
    if let Some(database) = &cli.database {
        config.database = database.clone();
    }
    if let Some(secs) = cli.interval_secs {
        config.flush_interval = Duration::from_secs(secs);
    }
    config.validate()?;
    Ok(config)
}

/// Keep a few process metrics moving so every flush has something to send
fn spawn_process_metrics(registry: &Registry, shutdown: CancellationToken) -> anyhow::Result<()> {
    let uptime = registry.gauge("process.uptime_secs")?;
    let heartbeats = registry.counter("process.heartbeats")?;
    let loop_lag = registry.timer("process.loop_lag")?;

    tokio::spawn(async move {
        let started = Instant::now();
        let mut ticker = tokio::time::interval(Duration::from_secs(1));
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let expected = Instant::now();
                    tokio::task::yield_now().await;
                    loop_lag.update_since(expected);
                    heartbeats.inc(1);
                    uptime.update(started.elapsed().as_secs() as i64);
                }
            }
        }
    });
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli).context("Invalid reporter configuration")?;
    info!("Starting influx-reporter with {:?}", config);

    let registry = Arc::new(Registry::new());
    let shutdown = CancellationToken::new();
    spawn_process_metrics(&registry, shutdown.clone())?;

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Unable to listen for Ctrl-C: {}", e);
            return;
        }
        info!("Ctrl-C received, shutting down");
        signal_token.cancel();
    });

    report(registry, config, shutdown.clone())
        .await
        .context("Reporter failed to start")?;

    shutdown.cancel();
    info!("influx-reporter stopped");
    Ok(())
}
