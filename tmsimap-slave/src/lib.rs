//! tmsimap slave node
//!
//! A slave sits next to a GSM receiver front-end. It follows the master's
//! control commands (retune, start/stop recording, correlate, flush) and
//! records the TMSIs paged on the tuned cell into per-window sessions.
//!
//! # Architecture
//!
//! - [`session`]: recording windows and their correlation
//! - [`radio`]: the front-end handle
//! - [`agent`]: command application and frame intake
//! - [`app`]: connection setup and the dispatcher loop

pub mod agent;
pub mod app;
pub mod radio;
pub mod session;

pub use agent::SlaveAgent;
pub use app::{run_dispatcher, SlaveNode, StopReason, MASTER_LINK};
pub use radio::{Frontend, UdpFrontend};
pub use session::{Observation, SessionStore};
