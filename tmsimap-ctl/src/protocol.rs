//! Control protocol message types
//!
//! # Wire format
//!
//! ```text
//! master -> slave:   CMD RXTUNE 941600\n
//!                    CMD START\n
//!                    CMD STOP\n
//!                    CMD CROSS\n
//!                    CMD FLUSH\n
//!
//! slave -> master:   CROSS Result:\n
//!                    0x11223344\n
//!                    ...
//! ```
//!
//! Commands are case sensitive. Receivers tolerate trailing whitespace and
//! NUL padding after the command.

use std::fmt;

use tmsimap_common::Tmsi;

/// Prefix every control command starts with.
pub const SIGNATURE: &str = "CMD ";

/// First line of a `CROSS` reply.
pub const CROSS_RESULT_HEADER: &str = "CROSS Result:";

/// A command sent from the master to its slaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlCommand {
    /// Retune the front-end to `khz` kilohertz
    RxTune {
        /// Center frequency in kHz
        khz: u64,
    },
    /// Begin a recording session
    Start,
    /// End the recording session and commit it to history
    Stop,
    /// Reply with the intersection of all recorded sessions
    Cross,
    /// Discard all recorded sessions
    Flush,
}

impl ControlCommand {
    /// Returns the command name as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            ControlCommand::RxTune { .. } => "RXTUNE",
            ControlCommand::Start => "START",
            ControlCommand::Stop => "STOP",
            ControlCommand::Cross => "CROSS",
            ControlCommand::Flush => "FLUSH",
        }
    }

    /// Returns the number of arguments the command takes.
    pub fn argc(&self) -> usize {
        match self {
            ControlCommand::RxTune { .. } => 1,
            _ => 0,
        }
    }

    /// Encodes the command as one newline-terminated line.
    pub fn encode(&self) -> String {
        format!("{SIGNATURE}{self}\n")
    }
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlCommand::RxTune { khz } => write!(f, "{} {}", self.name(), khz),
            _ => write!(f, "{}", self.name()),
        }
    }
}

/// The reply to a `CROSS` command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrossReport {
    /// TMSIs present in every recorded session
    pub tmsis: Vec<Tmsi>,
}

impl CrossReport {
    /// Creates a report from the correlated TMSIs.
    pub fn new(tmsis: impl IntoIterator<Item = Tmsi>) -> Self {
        Self {
            tmsis: tmsis.into_iter().collect(),
        }
    }

    /// Encodes the report: the header line, then one TMSI per line.
    pub fn encode(&self) -> String {
        let mut out = String::with_capacity(CROSS_RESULT_HEADER.len() + 1 + 11 * self.tmsis.len());
        out.push_str(CROSS_RESULT_HEADER);
        out.push('\n');
        for tmsi in &self.tmsis {
            out.push_str(&tmsi.to_string());
            out.push('\n');
        }
        out
    }

    /// Parses a report, e.g. one relayed to the operator console.
    ///
    /// Returns `None` if the text does not start with the report header or a
    /// listing line is not a TMSI.
    pub fn parse(text: &str) -> Option<Self> {
        let mut lines = text.lines();
        if lines.next()?.trim_end() != CROSS_RESULT_HEADER {
            return None;
        }
        let tmsis = lines
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| line.parse::<Tmsi>().ok())
            .collect::<Option<Vec<_>>>()?;
        Some(Self { tmsis })
    }
}
