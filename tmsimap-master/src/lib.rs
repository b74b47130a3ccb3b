//! tmsimap master node
//!
//! The master accepts slave connections, turns operator console input into
//! control commands broadcast to every slave, and relays whatever the slaves
//! send back (correlation listings) to the operator.
//!
//! # Architecture
//!
//! - [`server`]: the connection set and broadcast
//! - [`app`]: listener, console and the dispatcher loop

pub mod app;
pub mod server;

pub use app::{bind, LinkEvent, MasterApp, StopReason};
pub use server::{BroadcastReport, MasterController};
