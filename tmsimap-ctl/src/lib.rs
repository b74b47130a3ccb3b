//! tmsimap control protocol
//!
//! The master drives its slaves with newline-terminated text commands of the
//! form `CMD <COMMAND> [args...]`. Slaves answer `CROSS` with a listing of the
//! correlated TMSIs; every other command is fire-and-forget.
//!
//! # Modules
//!
//! - [`protocol`]: command and reply types and their wire form
//! - [`codec`]: signature check, parsing, validation and line framing
//! - [`console`]: the operator console grammar on the master
//!
//! # Example
//!
//! ```rust
//! use tmsimap_ctl::{codec, ControlCommand};
//!
//! let line = ControlCommand::RxTune { khz: 941_600 }.encode();
//! assert_eq!(line, "CMD RXTUNE 941600\n");
//!
//! let decoded = codec::decode_line(&line).unwrap();
//! assert_eq!(decoded, ControlCommand::RxTune { khz: 941_600 });
//! ```

pub mod codec;
pub mod console;
pub mod protocol;

pub use codec::{decode_line, parse, validate, verify, ControlError, LineFramer, Request, MAX_LINE_LEN};
pub use console::{ConsoleCommand, CLEAR_SCREEN, CONSOLE_HELP, CONSOLE_PROMPT, CONSOLE_UNKNOWN};
pub use protocol::{ControlCommand, CrossReport, CROSS_RESULT_HEADER, SIGNATURE};
