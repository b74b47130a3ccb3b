//! tmsimap slave node
//!
//! Connects to the master, listens for GSMTAP frames from the local receiver
//! front-end and records paged TMSIs on command.
//!
//! # Usage
//!
//! ```bash
//! tmsi-slave -i 192.168.1.10 -g 40 --ppm -12
//! tmsi-slave -c config/slave.yaml
//! ```

use std::net::{IpAddr, SocketAddr};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};

use tmsimap_common::{init_logging, LogLevel, SlaveConfig};
use tmsimap_slave::{SlaveNode, StopReason};

/// tmsimap slave - GSM paging recorder
#[derive(Parser, Debug)]
#[command(name = "tmsi-slave")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a slave configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config_file: Option<String>,

    /// IP address of the master
    #[arg(short = 'i', long = "master-addr", value_name = "ADDR")]
    master_addr: Option<IpAddr>,

    /// Control port of the master (default 8888)
    #[arg(short = 'p', long = "master-port", value_name = "PORT")]
    master_port: Option<u16>,

    /// Local UDP port receiving front-end frames (default 4729)
    #[arg(short = 'l', long = "local-port", value_name = "PORT")]
    local_port: Option<u16>,

    /// Front-end device arguments
    #[arg(short = 'a', long = "device-args", value_name = "ARGS")]
    device_args: Option<String>,

    /// Front-end sample rate (default 2000000)
    #[arg(short = 's', long = "sample-rate", value_name = "SPS")]
    sample_rate: Option<u64>,

    /// Front-end sub-device specification
    #[arg(short = 'S', long = "subdev-spec", value_name = "SPEC")]
    subdev_spec: Option<String>,

    /// Front-end gain in dB (default 30)
    #[arg(short = 'g', long = "gain", value_name = "DB")]
    gain: Option<f64>,

    /// Front-end frequency correction in ppm (default 0)
    #[arg(long = "ppm", value_name = "PPM", allow_hyphen_values = true)]
    ppm: Option<i32>,

    /// UDP address the front-end accepts parameter changes on
    #[arg(long = "frontend-ctrl", value_name = "ADDR")]
    frontend_ctrl: Option<SocketAddr>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long = "log-level", value_name = "LEVEL")]
    log_level: Option<LogLevel>,
}

impl Args {
    /// Builds the effective configuration: file values, then flags.
    fn into_config(self) -> Result<SlaveConfig> {
        let mut config = match &self.config_file {
            Some(path) => SlaveConfig::from_yaml_file(path)
                .with_context(|| format!("Failed to load configuration from {path}"))?,
            None => SlaveConfig::default(),
        };

        if let Some(addr) = self.master_addr {
            config.master_addr = addr;
        }
        if let Some(port) = self.master_port {
            config.master_port = port;
        }
        if let Some(port) = self.local_port {
            config.local_port = port;
        }
        if let Some(args) = self.device_args {
            config.frontend.device_args = args;
        }
        if let Some(rate) = self.sample_rate {
            config.frontend.sample_rate = rate;
        }
        if let Some(spec) = self.subdev_spec {
            config.frontend.subdev_spec = spec;
        }
        if let Some(gain) = self.gain {
            config.frontend.gain = gain;
        }
        if let Some(ppm) = self.ppm {
            config.frontend.ppm = ppm;
        }
        if self.frontend_ctrl.is_some() {
            config.frontend_ctrl = self.frontend_ctrl;
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

    match run_slave(config).await {
        Ok(reason) => {
            info!("Slave exited ({:?})", reason);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Slave failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Main slave execution logic
async fn run_slave(config: SlaveConfig) -> Result<StopReason> {
    let node = SlaveNode::start(&config)
        .await
        .context("Failed to start slave node")?;

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

    Ok(node.run(shutdown_rx).await)
}
