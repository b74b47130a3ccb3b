//! Slave agent
//!
//! Applies control commands from the master and feeds paging frames from the
//! front-end into the session store. The agent does no I/O of its own; the
//! dispatcher in [`crate::app`] moves bytes between sockets and the agent.

use bytes::Bytes;
use tracing::{debug, info, trace, warn};

use tmsimap_common::{HexDump, LinkAction, LinkHandler, LinkId, Tmsi};
use tmsimap_ctl::{decode_line, ControlCommand, ControlError, CrossReport, LineFramer};
use tmsimap_paging::{decode_frame, L3Message, MobileIdentity};

use crate::radio::Frontend;
use crate::session::{Observation, SessionStore};

/// A slave node's command and paging state.
pub struct SlaveAgent<F: Frontend> {
    frontend: F,
    sessions: SessionStore,
    framer: LineFramer,
    disconnected: bool,
}

impl<F: Frontend> SlaveAgent<F> {
    /// Creates an idle agent driving `frontend`.
    pub fn new(frontend: F) -> Self {
        Self {
            frontend,
            sessions: SessionStore::new(),
            framer: LineFramer::new(),
            disconnected: false,
        }
    }

    /// Returns the front-end handle.
    pub fn frontend(&self) -> &F {
        &self.frontend
    }

    /// Returns the session store.
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Returns true once the master has closed the control connection.
    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }

    /// Applies one control command.
    ///
    /// Returns the reply to send back, if the command has one.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::FrequencyOutOfRange`] if a retune target does
    /// not fit in Hz.
    pub fn apply(&mut self, command: ControlCommand) -> Result<Option<CrossReport>, ControlError> {
        info!(target: "tmsimap::ctrl", "Recv {} cmd", command.name());

        match command {
            ControlCommand::RxTune { khz } => {
                let hz = khz
                    .checked_mul(1000)
                    .ok_or_else(|| ControlError::FrequencyOutOfRange(khz.to_string()))?;
                self.frontend.set_center_freq(hz);
            }
            ControlCommand::Start => self.sessions.start(),
            ControlCommand::Stop => {
                self.sessions.stop();
                debug!(
                    target: "tmsimap::ctrl",
                    sessions = self.sessions.history().len(),
                    "Session committed"
                );
            }
            ControlCommand::Cross => {
                let report = CrossReport::new(self.sessions.cross());
                info!(target: "tmsimap::ctrl", matches = report.tmsis.len(), "Correlation computed");
                return Ok(Some(report));
            }
            ControlCommand::Flush => self.sessions.flush(),
        }
        Ok(None)
    }

    /// Decodes and applies one control line.
    ///
    /// # Errors
    ///
    /// Returns the reason the line was rejected; the agent state is unchanged.
    pub fn handle_line(&mut self, line: &str) -> Result<Option<CrossReport>, ControlError> {
        let command = decode_line(line)?;
        self.apply(command)
    }

    /// Feeds one front-end frame through the decoder into the session store.
    ///
    /// Returns the number of TMSIs the frame paged. Frames that fail to
    /// decode are dropped.
    pub fn handle_frame(&mut self, frame: &[u8]) -> usize {
        trace!(target: "tmsimap::paging", "Frame {}", HexDump(frame));

        let msg = match decode_frame(frame) {
            Ok(msg) => msg,
            Err(e) => {
                debug!(target: "tmsimap::paging", "Dropping frame: {}", e);
                return 0;
            }
        };

        let request = match msg {
            L3Message::Paging(request) => request,
            L3Message::Other {
                protocol_discriminator,
                message_type,
            } => {
                trace!(
                    target: "tmsimap::paging",
                    pd = protocol_discriminator,
                    message_type,
                    "Not a Paging Request"
                );
                return 0;
            }
        };

        debug!(
            target: "tmsimap::paging",
            identities = request.identities.len(),
            "Decoded {}",
            request.kind
        );

        let mut count = 0;
        for identity in &request.identities {
            match identity {
                MobileIdentity::Tmsi(tmsi) => {
                    self.observe(*tmsi);
                    count += 1;
                }
                MobileIdentity::Imsi(digits) => {
                    debug!(target: "tmsimap::paging", "Paging Request to IMSI {}", digits);
                }
                MobileIdentity::Other { type_of_identity } => {
                    trace!(target: "tmsimap::paging", type_of_identity, "Paging Request to other identity");
                }
            }
        }
        count
    }

    fn observe(&mut self, tmsi: Tmsi) {
        match self.sessions.observe(tmsi) {
            Observation::Recorded => {
                info!(target: "tmsimap::paging", state = "recording", "Paging Request to {}", tmsi);
            }
            Observation::Filtered { removed } => {
                info!(target: "tmsimap::paging", state = "idle", removed, "Paging Request to {}", tmsi);
            }
        }
    }

    /// Stops the front-end.
    pub fn shutdown(&mut self) {
        self.frontend.shutdown();
    }
}

impl<F: Frontend> LinkHandler for SlaveAgent<F> {
    fn on_receive(&mut self, link: LinkId, data: &[u8]) -> LinkAction {
        let mut reply = String::new();

        for line in self.framer.push(data) {
            match line.and_then(|line| self.handle_line(&line)) {
                Ok(Some(report)) => reply.push_str(&report.encode()),
                Ok(None) => {}
                Err(e) => warn!(target: "tmsimap::ctrl", %link, "Wrong command on control interface: {}", e),
            }
        }

        if reply.is_empty() {
            LinkAction::None
        } else {
            LinkAction::Reply(Bytes::from(reply))
        }
    }

    fn on_close(&mut self, link: LinkId) {
        warn!(target: "tmsimap::ctrl", %link, "Disconnected from master");
        self.disconnected = true;
    }
}
