//! Common types and utilities for tmsimap
//!
//! This crate provides the TMSI type, configuration structures, logging
//! setup and transport helpers shared by the master and slave nodes.

pub mod config;
pub mod error;
pub mod logging;
pub mod transport;
pub mod types;

pub use config::{FrontendParams, MasterConfig, SlaveConfig};
pub use error::Error;
pub use logging::{init_logging, init_logging_with_filter, HexDump, LogLevel};
pub use transport::{LinkAction, LinkHandler, LinkId, UdpTransport};
pub use types::Tmsi;
