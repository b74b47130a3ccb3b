//! Operator console grammar
//!
//! The master reads one command per line from its console. `help`, `clear`
//! and `exit` act locally; `rxtune` and `paging` map one to one onto a
//! broadcast control command.

use crate::protocol::ControlCommand;

/// Prompt printed before each console read.
pub const CONSOLE_PROMPT: &str = "CTRL# ";

/// Reply to unrecognized console input.
pub const CONSOLE_UNKNOWN: &str = "Unknown command, see help.";

/// Console help text.
pub const CONSOLE_HELP: &str = "
  Control interface help
  ======================

  help      this text
  clear     clear screen
  exit      shutdown server

  rxtune    tunes slaves to a given frequency in kHz
  paging    TMSI mapping
  |  start  start recording
  |  stop   stop recording
  |  cross  show results
  |  flush  reset all recordings

";

/// ANSI sequence clearing the terminal and homing the cursor.
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// One line of operator input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Blank line
    Empty,
    /// Print the help text
    Help,
    /// Clear the screen
    Clear,
    /// Shut the master down
    Exit,
    /// Send a command to every slave
    Broadcast(ControlCommand),
    /// Anything else
    Unknown(String),
}

impl ConsoleCommand {
    /// Parses one console line.
    ///
    /// Surrounding whitespace and NUL padding are ignored. Words are separated
    /// by single spaces and matched case sensitively.
    pub fn parse(line: &str) -> Self {
        let line = line.trim_matches(|c: char| c.is_whitespace() || c == '\0');
        if line.is_empty() {
            return ConsoleCommand::Empty;
        }

        let words: Vec<&str> = line.split(' ').collect();
        match words.as_slice() {
            ["help"] => ConsoleCommand::Help,
            ["clear"] => ConsoleCommand::Clear,
            ["exit"] => ConsoleCommand::Exit,
            ["rxtune", arg] if arg.bytes().all(|b| b.is_ascii_digit()) => match arg.parse::<u64>() {
                Ok(khz) => ConsoleCommand::Broadcast(ControlCommand::RxTune { khz }),
                Err(_) => ConsoleCommand::Unknown(line.to_string()),
            },
            ["paging", "start"] => ConsoleCommand::Broadcast(ControlCommand::Start),
            ["paging", "stop"] => ConsoleCommand::Broadcast(ControlCommand::Stop),
            ["paging", "cross"] => ConsoleCommand::Broadcast(ControlCommand::Cross),
            ["paging", "flush"] => ConsoleCommand::Broadcast(ControlCommand::Flush),
            _ => ConsoleCommand::Unknown(line.to_string()),
        }
    }
}
