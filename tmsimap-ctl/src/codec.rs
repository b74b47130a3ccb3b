//! Control line parsing and framing
//!
//! A received line goes through three steps: [`verify`] checks the
//! signature, [`parse`] splits it into a [`Request`], and [`validate`] matches
//! the request against one command's name and arity. [`decode_line`] runs all
//! three against every known command and reports why a line was rejected.

use bytes::{Buf, BytesMut};
use thiserror::Error;

use crate::protocol::{ControlCommand, SIGNATURE};

/// Longest partial line the framer buffers before giving up on it.
pub const MAX_LINE_LEN: usize = 4096;

/// Commands and their arity, in matching order.
const COMMANDS: [(&str, usize); 5] = [
    ("RXTUNE", 1),
    ("START", 0),
    ("STOP", 0),
    ("CROSS", 0),
    ("FLUSH", 0),
];

/// Reasons a control line is rejected
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ControlError {
    /// Line does not start with the command signature
    #[error("missing command signature")]
    MissingSignature,

    /// Signature present but no command follows
    #[error("empty command")]
    EmptyCommand,

    /// Command name not recognized
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Known command with the wrong number of arguments
    #[error("{command} expects {expected} argument(s), got {got}")]
    ArgumentCount {
        /// Command name
        command: String,
        /// Arguments the command takes
        expected: usize,
        /// Arguments received
        got: usize,
    },

    /// Argument that is not a decimal number
    #[error("{command}: argument {arg:?} is not numeric")]
    NonNumericArgument {
        /// Command name
        command: String,
        /// Offending argument
        arg: String,
    },

    /// Frequency that does not fit in Hz
    #[error("frequency out of range: {0} kHz")]
    FrequencyOutOfRange(String),

    /// Line not valid UTF-8
    #[error("line is not valid UTF-8")]
    InvalidUtf8,

    /// Partial line grew beyond [`MAX_LINE_LEN`]
    #[error("line exceeds {0} bytes")]
    LineTooLong(usize),
}

/// A control line split into its command and arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Command name
    pub command: String,
    /// Arguments, in order
    pub args: Vec<String>,
}

/// Returns true if `line` starts with the command signature.
pub fn verify(line: &str) -> bool {
    line.starts_with(SIGNATURE)
}

/// Splits a control line into command and arguments.
///
/// Strips the signature, surrounding whitespace and NUL padding, then splits
/// on single spaces, so `"CMD RXTUNE 941600\0\0\n"` becomes
/// `RXTUNE` with argument `941600`. Consecutive spaces produce empty
/// arguments, which [`validate`] rejects.
pub fn parse(line: &str) -> Request {
    let body = line
        .strip_prefix(SIGNATURE)
        .unwrap_or(line)
        .trim_matches(|c: char| c.is_whitespace() || c == '\0');

    let mut parts = body.split(' ').map(str::to_string);
    let command = parts.next().unwrap_or_default();
    Request {
        command,
        args: parts.collect(),
    }
}

/// Returns true if `request` is `command` with exactly `argc` numeric
/// arguments.
pub fn validate(request: &Request, command: &str, argc: usize) -> bool {
    request.command == command && request.args.len() == argc && request.args.iter().all(|a| is_numeric(a))
}

fn is_numeric(arg: &str) -> bool {
    !arg.is_empty() && arg.bytes().all(|b| b.is_ascii_digit())
}

/// Decodes one control line into a command.
///
/// # Errors
///
/// Returns the first reason the line does not form a valid command.
pub fn decode_line(line: &str) -> Result<ControlCommand, ControlError> {
    if !verify(line) {
        return Err(ControlError::MissingSignature);
    }

    let request = parse(line);
    if request.command.is_empty() {
        return Err(ControlError::EmptyCommand);
    }

    let Some(&(name, argc)) = COMMANDS.iter().find(|(name, _)| *name == request.command) else {
        return Err(ControlError::UnknownCommand(request.command));
    };

    if !validate(&request, name, argc) {
        return Err(rejection(request, argc));
    }

    match name {
        "RXTUNE" => {
            let arg = &request.args[0];
            let khz = arg
                .parse::<u64>()
                .ok()
                .filter(|khz| khz.checked_mul(1000).is_some())
                .ok_or_else(|| ControlError::FrequencyOutOfRange(arg.clone()))?;
            Ok(ControlCommand::RxTune { khz })
        }
        "START" => Ok(ControlCommand::Start),
        "STOP" => Ok(ControlCommand::Stop),
        "CROSS" => Ok(ControlCommand::Cross),
        _ => Ok(ControlCommand::Flush),
    }
}

/// Explains why a known command failed validation.
fn rejection(request: Request, argc: usize) -> ControlError {
    if request.args.len() != argc {
        return ControlError::ArgumentCount {
            command: request.command,
            expected: argc,
            got: request.args.len(),
        };
    }
    let arg = request
        .args
        .iter()
        .find(|a| !is_numeric(a))
        .cloned()
        .unwrap_or_default();
    ControlError::NonNumericArgument {
        command: request.command,
        arg,
    }
}

/// Splits a control byte stream into lines.
///
/// TCP does not preserve message boundaries, so bytes are buffered until a
/// newline arrives. Yielded lines have their line terminator removed.
#[derive(Debug)]
pub struct LineFramer {
    buf: BytesMut,
    max_line: usize,
    /// Skipping the tail of an oversized line up to its newline
    discarding: bool,
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}

impl LineFramer {
    /// Creates a framer with the default line limit.
    pub fn new() -> Self {
        Self::with_max_line(MAX_LINE_LEN)
    }

    /// Creates a framer that rejects lines longer than `max_line` bytes,
    /// not counting the terminator.
    pub fn with_max_line(max_line: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(256),
            max_line,
            discarding: false,
        }
    }

    /// Feeds received bytes and returns every line they complete.
    ///
    /// An oversized line yields one [`ControlError::LineTooLong`], whether it
    /// completes within `data` or not; everything up to its newline is
    /// dropped.
    pub fn push(&mut self, data: &[u8]) -> Vec<Result<String, ControlError>> {
        self.buf.extend_from_slice(data);

        let mut lines = Vec::new();
        loop {
            let newline = self.buf.iter().position(|&b| b == b'\n');

            if self.discarding {
                match newline {
                    Some(pos) => {
                        self.buf.advance(pos + 1);
                        self.discarding = false;
                        continue;
                    }
                    None => {
                        self.buf.clear();
                        break;
                    }
                }
            }

            let Some(pos) = newline else {
                if self.buf.len() > self.max_line {
                    self.buf.clear();
                    self.discarding = true;
                    lines.push(Err(ControlError::LineTooLong(self.max_line)));
                }
                break;
            };

            let raw = self.buf.split_to(pos + 1);
            let raw = raw.strip_suffix(b"\n").unwrap_or(&raw);
            let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
            if raw.len() > self.max_line {
                lines.push(Err(ControlError::LineTooLong(self.max_line)));
                continue;
            }
            lines.push(
                std::str::from_utf8(raw)
                    .map(str::to_string)
                    .map_err(|_| ControlError::InvalidUtf8),
            );
        }

        lines
    }

    /// Returns the number of buffered bytes not yet forming a line.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}
