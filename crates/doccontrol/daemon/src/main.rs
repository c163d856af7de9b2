//! doccontrold - document control daemon
//!
//! Hosts the document control engine and runs the effectivity sweep.

use clap::Parser;
use doccontrol_daemon::{build_engine, DaemonConfig, DaemonError, DaemonResult, SweepTrigger};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Document control daemon
#[derive(Parser, Debug)]
#[command(name = "doccontrold")]
#[command(about = "Regulated document lifecycle daemon")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "DOCCONTROL_CONFIG")]
    config: Option<String>,

    /// Log level (overrides the configuration file)
    #[arg(long, env = "DOCCONTROL_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "DOCCONTROL_LOG_JSON")]
    json: bool,

    /// Run a single sweep and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> DaemonResult<()> {
    let cli = Cli::parse();

    let config = DaemonConfig::load(cli.config.as_deref())
        .map_err(|e| DaemonError::Config(e.to_string()))?;

    let log_level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| log_level.into());

    if cli.json || config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        sweep_interval_secs = config.scheduler.sweep_interval_secs,
        grace_window_hours = config.engine.grace_window_hours,
        "Starting doccontrold"
    );

    let engine = Arc::new(build_engine(&config)?);
    let (trigger, trigger_rx) = SweepTrigger::new(config.scheduler.clone(), engine);

    if cli.once {
        let report = trigger.run_once(chrono::Utc::now())?;
        tracing::info!(processed = report.processed(), "Single sweep complete");
        return Ok(());
    }

    let handle = tokio::spawn(trigger.clone().start(trigger_rx));

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    trigger.stop().await;
    trigger.trigger_now().await;
    if let Err(e) = handle.await {
        tracing::error!(error = %e, "Sweep trigger task failed");
    }

    tracing::info!("doccontrold stopped");
    Ok(())
}
