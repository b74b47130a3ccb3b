//! GSM paging decoder
//!
//! This crate turns frames received from the radio front-end into the TMSIs
//! they page. A frame is a 16-byte GSMTAP header followed by a GSM Layer-3
//! message; only Radio Resource management Paging Requests (types 1, 2 and 3)
//! carry identities of interest, everything else is ignored.
//!
//! # Modules
//!
//! - [`protocol`]: Layer-3 constants and decoded message types
//! - [`codec`]: frame and Paging Request decoding
//!
//! # Example
//!
//! ```rust
//! use tmsimap_paging::{codec, GSMTAP_HEADER_LEN};
//!
//! let mut frame = vec![0u8; GSMTAP_HEADER_LEN];
//! // Paging Request Type 3 carrying four TMSIs
//! frame.extend_from_slice(&[0x49, 0x06, 0x24, 0x00]);
//! frame.extend_from_slice(&[0x11, 0x11, 0x11, 0x11, 0x22, 0x22, 0x22, 0x22]);
//! frame.extend_from_slice(&[0x33, 0x33, 0x33, 0x33, 0x44, 0x44, 0x44, 0x44]);
//!
//! let tmsis = codec::extract_tmsis(&frame).unwrap();
//! assert_eq!(tmsis.len(), 4);
//! assert_eq!(tmsis[2].to_string(), "0x33333333");
//! ```

pub mod codec;
pub mod protocol;

pub use codec::{decode_frame, decode_l3, extract_tmsis, PagingCodecError};
pub use protocol::{
    L3Message, MobileIdentity, PagingKind, PagingRequest, GSMTAP_HEADER_LEN,
};
