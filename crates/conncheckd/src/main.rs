//! conncheckd — the conncheck daemon.
//!
//! Runs one reachability monitor per peer of the service described in the
//! configuration file:
//! - Static directory (re-read on an interval)
//! - Peer registry with one monitor task per peer
//! - HTTP ping probe
//!
//! # Usage
//!
//! ```text
//! conncheckd run --config /etc/conncheck/conncheck.toml
//! conncheckd validate --config /etc/conncheck/conncheck.toml
//! ```

mod config;
mod sync;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use conncheck_health::HttpProbe;
use tracing::{info, warn};

use crate::config::DaemonConfig;
use crate::sync::DirectorySync;

#[derive(Parser)]
#[command(name = "conncheckd", about = "conncheck peer reachability daemon")]
struct Cli {
    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Monitor every peer in the configuration until interrupted.
    Run {
        /// Path to conncheck.toml.
        #[arg(long, short)]
        config: PathBuf,

        /// Seconds between directory re-reads.
        #[arg(long, default_value = "30")]
        refresh_interval: u64,

        /// Seconds between peer status log lines.
        #[arg(long, default_value = "60")]
        status_interval: u64,

        /// Seconds to wait for monitors to stop on shutdown.
        #[arg(long, default_value = "10")]
        shutdown_grace: u64,
    },
    /// Parse the configuration and print it as JSON.
    Validate {
        /// Path to conncheck.toml.
        #[arg(long, short)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.command {
        Command::Run {
            config,
            refresh_interval,
            status_interval,
            shutdown_grace,
        } => {
            run(
                &config,
                cli.log_format,
                Duration::from_secs(refresh_interval.max(1)),
                Duration::from_secs(status_interval.max(1)),
                Duration::from_secs(shutdown_grace),
            )
            .await
        }
        Command::Validate { config } => validate(&config),
    }
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new("info,conncheckd=debug,conncheck=debug")
    });
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn validate(path: &Path) -> anyhow::Result<()> {
    let config = DaemonConfig::from_file(path)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

async fn run(
    path: &Path,
    log_format: LogFormat,
    refresh_interval: Duration,
    status_interval: Duration,
    shutdown_grace: Duration,
) -> anyhow::Result<()> {
    info!(config = ?path, "conncheckd starting");

    let config = DaemonConfig::from_file(path)?;
    let monitor_config = config.monitor.clone();
    info!(
        check_interval_ms = monitor_config.check_interval_ms,
        probe_timeout_ms = monitor_config.probe_timeout_ms,
        peers = config.directory.peers.len(),
        "configuration loaded"
    );

    let mut sync = DirectorySync::new(monitor_config.clone(), Arc::new(HttpProbe::new()));
    sync.apply(&config.directory).await;

    let mut refresh = tokio::time::interval(refresh_interval);
    let mut status = tokio::time::interval(status_interval);
    // Both fire immediately; the directory was just applied.
    refresh.tick().await;
    status.tick().await;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = refresh.tick() => {
                match DaemonConfig::from_file(path) {
                    Ok(reloaded) => {
                        if reloaded.monitor != monitor_config {
                            warn!("monitor settings changed; restart conncheckd to apply them");
                        }
                        sync.apply(&reloaded.directory).await;
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to reload configuration, keeping last directory");
                    }
                }
            }
            _ = status.tick() => {
                let statuses = sync.registry().statuses().await;
                match log_format {
                    LogFormat::Json => {
                        info!(statuses = %serde_json::to_string(&statuses)?, "peer status");
                    }
                    LogFormat::Text => {
                        for peer in &statuses {
                            info!(peer = %peer.id, reachable = peer.reachable, "peer status");
                        }
                    }
                }
            }
            res = &mut shutdown => {
                res?;
                info!("shutdown signal received");
                break;
            }
        }
    }

    let stopped = sync.registry().stop_all().await;
    let waited = tokio::time::timeout(shutdown_grace, async {
        for monitor in &stopped {
            monitor.wait().await;
        }
    })
    .await;
    if waited.is_err() {
        warn!(grace = ?shutdown_grace, "peer monitors did not stop within grace period");
    }

    info!("conncheckd stopped");
    Ok(())
}
