//! GSM Layer-3 message types relevant to paging
//!
//! Constants follow 3GPP TS 04.08 (44.018) for the Paging Request messages
//! and TS 24.008 §10.5.1.4 for the Mobile Identity information element.

use std::fmt;

use tmsimap_common::Tmsi;

/// Length of the GSMTAP header prefixed to every front-end frame.
pub const GSMTAP_HEADER_LEN: usize = 16;

/// Octet carrying skip indicator 0 and protocol discriminator RR.
pub const PD_RADIO_RESOURCE: u8 = 0x06;

/// Message type of Paging Request Type 1.
pub const MSG_PAGING_REQUEST_1: u8 = 0x21;
/// Message type of Paging Request Type 2.
pub const MSG_PAGING_REQUEST_2: u8 = 0x22;
/// Message type of Paging Request Type 3.
pub const MSG_PAGING_REQUEST_3: u8 = 0x24;

/// IEI of the optional second Mobile Identity in Paging Request Type 1.
pub const IEI_MOBILE_IDENTITY_2: u8 = 0x17;

/// Mask of the type-of-identity bits in the first Mobile Identity octet.
pub const MI_TYPE_MASK: u8 = 0x07;

/// Mobile Identity type: no identity.
pub const MI_TYPE_NONE: u8 = 0x00;
/// Mobile Identity type: IMSI.
pub const MI_TYPE_IMSI: u8 = 0x01;
/// Mobile Identity type: IMEI.
pub const MI_TYPE_IMEI: u8 = 0x02;
/// Mobile Identity type: IMEISV.
pub const MI_TYPE_IMEISV: u8 = 0x03;
/// Mobile Identity type: TMSI/P-TMSI.
pub const MI_TYPE_TMSI: u8 = 0x04;

/// Paging Request variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PagingKind {
    /// Up to two Mobile Identities of any type
    Type1,
    /// Two TMSIs plus an optional third Mobile Identity
    Type2,
    /// Four TMSIs
    Type3,
}

impl PagingKind {
    /// Maps an RR message type to a paging variant.
    pub fn from_message_type(message_type: u8) -> Option<Self> {
        match message_type {
            MSG_PAGING_REQUEST_1 => Some(PagingKind::Type1),
            MSG_PAGING_REQUEST_2 => Some(PagingKind::Type2),
            MSG_PAGING_REQUEST_3 => Some(PagingKind::Type3),
            _ => None,
        }
    }

    /// Returns the RR message type of this variant.
    pub fn message_type(&self) -> u8 {
        match self {
            PagingKind::Type1 => MSG_PAGING_REQUEST_1,
            PagingKind::Type2 => MSG_PAGING_REQUEST_2,
            PagingKind::Type3 => MSG_PAGING_REQUEST_3,
        }
    }

    /// Returns the minimum Layer-3 length carrying every mandatory field.
    pub fn min_len(&self) -> usize {
        match self {
            // pseudo length, PD, type, page mode, MI length, MI type octet
            PagingKind::Type1 => 6,
            PagingKind::Type2 => 12,
            PagingKind::Type3 => 20,
        }
    }
}

impl fmt::Display for PagingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PagingKind::Type1 => write!(f, "Paging Request Type 1"),
            PagingKind::Type2 => write!(f, "Paging Request Type 2"),
            PagingKind::Type3 => write!(f, "Paging Request Type 3"),
        }
    }
}

/// A Mobile Identity carried in a Paging Request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MobileIdentity {
    /// Temporary identity, the only kind fed into recording sessions
    Tmsi(Tmsi),
    /// Permanent identity, kept as decoded digits for diagnostics
    Imsi(String),
    /// Any other identity type (IMEI, IMEISV, none)
    Other {
        /// Type-of-identity bits
        type_of_identity: u8,
    },
}

impl MobileIdentity {
    /// Returns the TMSI if this identity is one.
    pub fn as_tmsi(&self) -> Option<Tmsi> {
        match self {
            MobileIdentity::Tmsi(tmsi) => Some(*tmsi),
            _ => None,
        }
    }
}

/// A decoded Paging Request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagingRequest {
    /// Which of the three variants this was
    pub kind: PagingKind,
    /// Identities in the order they appear in the message
    pub identities: Vec<MobileIdentity>,
}

impl PagingRequest {
    /// Creates an empty Paging Request of the given kind.
    pub fn new(kind: PagingKind) -> Self {
        Self {
            kind,
            identities: Vec::new(),
        }
    }

    /// Returns the paged TMSIs in extraction order.
    pub fn tmsis(&self) -> impl Iterator<Item = Tmsi> + '_ {
        self.identities.iter().filter_map(MobileIdentity::as_tmsi)
    }
}

/// A decoded Layer-3 message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum L3Message {
    /// One of the three Paging Request variants
    Paging(PagingRequest),
    /// Anything else; carried only for diagnostics
    Other {
        /// Skip indicator and protocol discriminator octet
        protocol_discriminator: u8,
        /// Message type octet
        message_type: u8,
    },
}

impl L3Message {
    /// Returns the paged TMSIs, empty for non-paging messages.
    pub fn tmsis(&self) -> Vec<Tmsi> {
        match self {
            L3Message::Paging(request) => request.tmsis().collect(),
            L3Message::Other { .. } => Vec::new(),
        }
    }
}
