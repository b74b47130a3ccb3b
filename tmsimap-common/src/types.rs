//! GSM identity types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Temporary Mobile Subscriber Identity.
///
/// A TMSI is a 4-octet value assigned by the network to a subscriber so that
/// paging and signalling do not have to carry the permanent IMSI. It is
/// treated as opaque: two TMSIs are the same identity only if all four octets
/// are equal.
///
/// The display form is `0x` followed by eight lowercase hex digits, which is
/// also the form accepted by [`FromStr`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tmsi([u8; 4]);

impl Tmsi {
    /// Encoded length of a TMSI in octets.
    pub const LEN: usize = 4;

    /// Creates a TMSI from its four octets as they appear on the air interface.
    pub const fn new(octets: [u8; 4]) -> Self {
        Self(octets)
    }

    /// Creates a TMSI from a 32-bit value (big-endian octet order).
    pub const fn from_u32(value: u32) -> Self {
        Self(value.to_be_bytes())
    }

    /// Reads a TMSI from the first four octets of `data`.
    ///
    /// Returns `None` if fewer than four octets are available.
    pub fn from_slice(data: &[u8]) -> Option<Self> {
        let octets: [u8; 4] = data.get(..Self::LEN)?.try_into().ok()?;
        Some(Self(octets))
    }

    /// Returns the four octets of this TMSI.
    pub const fn octets(&self) -> [u8; 4] {
        self.0
    }

    /// Returns the TMSI as a 32-bit value.
    pub const fn as_u32(&self) -> u32 {
        u32::from_be_bytes(self.0)
    }
}

impl From<[u8; 4]> for Tmsi {
    fn from(octets: [u8; 4]) -> Self {
        Self(octets)
    }
}

impl From<u32> for Tmsi {
    fn from(value: u32) -> Self {
        Self::from_u32(value)
    }
}

impl fmt::Display for Tmsi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Tmsi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tmsi({self})")
    }
}

impl FromStr for Tmsi {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .ok_or_else(|| format!("TMSI must start with 0x: {s}"))?;
        if digits.len() != 2 * Self::LEN {
            return Err(format!("TMSI must have 8 hex digits: {s}"));
        }
        let mut octets = [0u8; 4];
        hex::decode_to_slice(digits, &mut octets).map_err(|e| format!("invalid TMSI {s}: {e}"))?;
        Ok(Self(octets))
    }
}
