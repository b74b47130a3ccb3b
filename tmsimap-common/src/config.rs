//! Configuration structures for the master and slave nodes
//!
//! Both nodes can be configured from an optional YAML file. Every field has a
//! default, so an empty document (or no file at all) yields a working setup
//! on a single host. Command-line flags are applied on top by the binaries.

use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::logging::LogLevel;
use crate::Error;

/// Default TCP port of the master's control interface.
pub const DEFAULT_CONTROL_PORT: u16 = 8888;

/// Default UDP port the slave receives front-end frames on (GSMTAP).
pub const DEFAULT_GSMTAP_PORT: u16 = 4729;

/// Default soft cap on simultaneously connected slaves.
pub const DEFAULT_MAX_CONNECTIONS: usize = 10;

/// Initial center frequency: downlink of ARFCN 0.
pub const DEFAULT_CENTER_FREQ_HZ: u64 = 935_000_000;

/// Radio front-end parameters.
///
/// These values are forwarded verbatim to the front-end; tmsimap never
/// reinterprets them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontendParams {
    /// Device arguments passed to the SDR source
    pub device_args: String,
    /// Sub-device specification
    pub subdev_spec: String,
    /// Sample rate in samples per second
    pub sample_rate: u64,
    /// RF gain in dB
    pub gain: f64,
    /// Frequency correction in parts per million
    pub ppm: i32,
    /// Center frequency in Hz
    pub center_freq: u64,
    /// Offset between the hardware tuning point and the channel, in Hz
    pub shift_offset: u64,
}

impl Default for FrontendParams {
    fn default() -> Self {
        Self {
            device_args: String::new(),
            subdev_spec: String::new(),
            sample_rate: 2_000_000,
            gain: 30.0,
            ppm: 0,
            center_freq: DEFAULT_CENTER_FREQ_HZ,
            shift_offset: 400_000,
        }
    }
}

impl FrontendParams {
    /// Returns the frequency the hardware is actually tuned to.
    ///
    /// The channel of interest sits `shift_offset` above the hardware center
    /// to keep it clear of the DC spike.
    pub fn hardware_center(&self) -> u64 {
        self.center_freq.saturating_sub(self.shift_offset)
    }
}

/// Slave node configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlaveConfig {
    /// Address of the master's control interface
    pub master_addr: IpAddr,
    /// Port of the master's control interface
    pub master_port: u16,
    /// Local UDP port receiving front-end frames
    pub local_port: u16,
    /// Where front-end parameter changes are sent, if anywhere
    pub frontend_ctrl: Option<SocketAddr>,
    /// Radio front-end parameters
    pub frontend: FrontendParams,
    /// Log level
    pub log_level: LogLevel,
}

impl Default for SlaveConfig {
    fn default() -> Self {
        Self {
            master_addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
            master_port: DEFAULT_CONTROL_PORT,
            local_port: DEFAULT_GSMTAP_PORT,
            frontend_ctrl: None,
            frontend: FrontendParams::default(),
            log_level: LogLevel::Info,
        }
    }
}

impl SlaveConfig {
    /// Parses a slave configuration from a YAML string.
    ///
    /// ```
    /// use tmsimap_common::SlaveConfig;
    ///
    /// let yaml = r#"
    /// master_addr: 10.0.0.1
    /// frontend:
    ///   gain: 42
    /// "#;
    ///
    /// let config = SlaveConfig::from_yaml(yaml).unwrap();
    /// assert_eq!(config.master_port, 8888);
    /// assert_eq!(config.frontend.gain, 42.0);
    /// ```
    pub fn from_yaml(yaml: &str) -> Result<Self, Error> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Loads a slave configuration from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Returns the master's control address.
    pub fn master_socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.master_addr, self.master_port)
    }

    /// Returns the address the front-end channel binds to.
    ///
    /// The front-end runs on the same host, so the channel stays on loopback.
    pub fn frontend_bind_addr(&self) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), self.local_port)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a port is zero or the sample rate is zero.
    pub fn validate(&self) -> Result<(), Error> {
        if self.master_port == 0 {
            return Err(Error::Config("master_port cannot be 0".to_string()));
        }
        if self.local_port == 0 {
            return Err(Error::Config("local_port cannot be 0".to_string()));
        }
        if self.frontend.sample_rate == 0 {
            return Err(Error::Config(
                "frontend.sample_rate must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Master node configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MasterConfig {
    /// Address the control interface listens on
    pub listen_addr: IpAddr,
    /// Port the control interface listens on
    pub listen_port: u16,
    /// Soft cap on connected slaves; exceeding it only logs a warning
    pub max_connections: usize,
    /// Log level
    pub log_level: LogLevel,
}

impl Default for MasterConfig {
    fn default() -> Self {
        Self {
            listen_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            listen_port: DEFAULT_CONTROL_PORT,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            log_level: LogLevel::Info,
        }
    }
}

impl MasterConfig {
    /// Parses a master configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, Error> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Loads a master configuration from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Returns the address the control listener binds to.
    pub fn listen_socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.listen_addr, self.listen_port)
    }

    /// Validates the configuration.
    ///
    /// A listen port of 0 binds an ephemeral port.
    pub fn validate(&self) -> Result<(), Error> {
        if self.max_connections == 0 {
            return Err(Error::Config(
                "max_connections must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
