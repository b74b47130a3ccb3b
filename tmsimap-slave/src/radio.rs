//! Radio front-end handle
//!
//! The receiver and demodulator run outside this process. The slave only
//! tracks the parameters it has asked for and, when a control address is
//! configured, forwards every change to the front-end as a text datagram:
//!
//! ```text
//! SET center_freq 941600000
//! SET gain 30
//! SET ppm -12
//! SET sample_rate 2000000
//! SHUTDOWN
//! ```

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};

use tracing::{debug, info, warn};

use tmsimap_common::{Error, FrontendParams};

/// Control surface of a radio front-end.
pub trait Frontend {
    /// Tunes the channel of interest to `hz`.
    fn set_center_freq(&mut self, hz: u64);

    /// Sets the RF gain in dB.
    fn set_gain(&mut self, db: f64);

    /// Sets the frequency correction in parts per million.
    fn set_ppm(&mut self, ppm: i32);

    /// Sets the sample rate in samples per second.
    fn set_sample_rate(&mut self, sps: u64);

    /// Returns the parameters currently requested.
    fn params(&self) -> &FrontendParams;

    /// Stops the front-end.
    fn shutdown(&mut self);
}

/// Front-end reached over a local UDP control socket.
pub struct UdpFrontend {
    params: FrontendParams,
    ctrl: Option<(UdpSocket, SocketAddr)>,
}

impl UdpFrontend {
    /// Creates a handle that only tracks parameters.
    pub fn detached(params: FrontendParams) -> Self {
        Self { params, ctrl: None }
    }

    /// Opens a handle forwarding parameter changes to `ctrl_addr`.
    ///
    /// The full initial parameter set is sent once the socket is bound. The
    /// socket is non-blocking; a datagram that cannot be sent is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the control socket cannot be bound.
    pub fn open(params: FrontendParams, ctrl_addr: Option<SocketAddr>) -> Result<Self, Error> {
        let Some(ctrl_addr) = ctrl_addr else {
            info!(target: "tmsimap::radio", "No front-end control address, parameters are tracked only");
            return Ok(Self::detached(params));
        };

        let bind_ip = match ctrl_addr.ip() {
            IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        };
        let socket = UdpSocket::bind(SocketAddr::new(bind_ip, 0))?;
        socket.set_nonblocking(true)?;
        info!(target: "tmsimap::radio", "Front-end control at {}", ctrl_addr);

        let frontend = Self {
            params,
            ctrl: Some((socket, ctrl_addr)),
        };
        frontend.push_all();
        Ok(frontend)
    }

    /// Sends every parameter to the front-end.
    fn push_all(&self) {
        if !self.params.device_args.is_empty() {
            self.send_set("device_args", &self.params.device_args);
        }
        if !self.params.subdev_spec.is_empty() {
            self.send_set("subdev_spec", &self.params.subdev_spec);
        }
        self.send_set("sample_rate", self.params.sample_rate);
        self.send_set("center_freq", self.params.center_freq);
        self.send_set("gain", self.params.gain);
        self.send_set("ppm", self.params.ppm);
    }

    fn send_set(&self, param: &str, value: impl std::fmt::Display) {
        self.send(&format!("SET {param} {value}"));
    }

    fn send(&self, msg: &str) {
        let Some((socket, addr)) = &self.ctrl else {
            return;
        };
        debug!(target: "tmsimap::radio", "-> {}: {}", addr, msg);
        if let Err(e) = socket.send_to(msg.as_bytes(), *addr) {
            warn!(target: "tmsimap::radio", "Failed to reach front-end at {}: {}", addr, e);
        }
    }
}

impl Frontend for UdpFrontend {
    fn set_center_freq(&mut self, hz: u64) {
        self.params.center_freq = hz;
        info!(
            target: "tmsimap::radio",
            "Switching to {} Hz (hardware center {} Hz)",
            hz,
            self.params.hardware_center()
        );
        self.send_set("center_freq", hz);
    }

    fn set_gain(&mut self, db: f64) {
        self.params.gain = db;
        self.send_set("gain", db);
    }

    fn set_ppm(&mut self, ppm: i32) {
        self.params.ppm = ppm;
        self.send_set("ppm", ppm);
    }

    fn set_sample_rate(&mut self, sps: u64) {
        self.params.sample_rate = sps;
        self.send_set("sample_rate", sps);
    }

    fn params(&self) -> &FrontendParams {
        &self.params
    }

    fn shutdown(&mut self) {
        info!(target: "tmsimap::radio", "Shutdown radio front-end");
        self.send("SHUTDOWN");
        self.ctrl = None;
    }
}
