//! tmsimap master node
//!
//! Accepts slave connections and drives them from an interactive console.
//!
//! # Usage
//!
//! ```bash
//! tmsi-master -p 8888
//! tmsi-master -c config/master.yaml
//! ```

use std::io::BufRead;
use std::net::IpAddr;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

use tmsimap_common::{init_logging, LogLevel, MasterConfig};
use tmsimap_master::{bind, MasterApp, StopReason};

/// Capacity of the console line channel.
const CONSOLE_CHANNEL_CAPACITY: usize = 16;

/// tmsimap master - TMSI mapping controller
#[derive(Parser, Debug)]
#[command(name = "tmsi-master")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a master configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config_file: Option<String>,

    /// Address to listen on (default 0.0.0.0)
    #[arg(short = 'a', long = "listen-addr", value_name = "ADDR")]
    listen_addr: Option<IpAddr>,

    /// Port to listen on (default 8888)
    #[arg(short = 'p', long = "port", value_name = "PORT")]
    port: Option<u16>,

    /// Soft cap on connected slaves (default 10)
    #[arg(long = "max-connections", value_name = "N")]
    max_connections: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long = "log-level", value_name = "LEVEL")]
    log_level: Option<LogLevel>,
}

impl Args {
    /// Builds the effective configuration: file values, then flags.
    fn into_config(self) -> Result<MasterConfig> {
        let mut config = match &self.config_file {
            Some(path) => MasterConfig::from_yaml_file(path)
                .with_context(|| format!("Failed to load configuration from {path}"))?,
            None => MasterConfig::default(),
        };

        if let Some(addr) = self.listen_addr {
            config.listen_addr = addr;
        }
        if let Some(port) = self.port {
            config.listen_port = port;
        }
        if let Some(max) = self.max_connections {
            config.max_connections = max;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let config = match Args::parse().into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ERROR: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(config.log_level);

    match run_master(config).await {
        Ok(reason) => {
            info!("Master exited ({:?})", reason);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Master failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Reads stdin on a dedicated thread so a pending read never holds up
/// shutdown.
fn spawn_console_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(CONSOLE_CHANNEL_CAPACITY);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Main master execution logic
async fn run_master(config: MasterConfig) -> Result<StopReason> {
    let listener = bind(&config).await.context("Failed to start master")?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C, initiating shutdown...");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                warn!("Cannot listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        }
    });

    let mut app = MasterApp::new(config.max_connections, tokio::io::stdout());
    Ok(app.run(listener, spawn_console_reader(), shutdown_rx).await)
}
