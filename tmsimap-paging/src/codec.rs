//! Paging Request decoding
//!
//! Decoding is bounds checked throughout: a frame too short for the mandatory
//! fields of its message is rejected as a whole, and optional elements are
//! only considered when every octet they need is present.
//!
//! Offsets below index the Layer-3 message including its leading L2 pseudo
//! length octet, i.e. `l3[1]` is the protocol discriminator and `l3[2]` the
//! message type.

use thiserror::Error;
use tmsimap_common::Tmsi;

use crate::protocol::{
    L3Message, MobileIdentity, PagingKind, PagingRequest, GSMTAP_HEADER_LEN,
    IEI_MOBILE_IDENTITY_2, MI_TYPE_IMSI, MI_TYPE_MASK, MI_TYPE_TMSI, PD_RADIO_RESOURCE,
};

/// Octets needed to read the message type.
const L3_MIN_LEN: usize = 3;

/// Errors that can occur while decoding a front-end frame
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PagingCodecError {
    /// Frame shorter than the GSMTAP header
    #[error("frame too short for GSMTAP header: {0} bytes")]
    TruncatedHeader(usize),

    /// Buffer too short for the mandatory fields of the message
    #[error("buffer too short: need {needed} bytes, have {available}")]
    BufferTooShort {
        /// Number of bytes needed
        needed: usize,
        /// Number of bytes available
        available: usize,
    },
}

/// Result type for paging codec operations
pub type Result<T> = std::result::Result<T, PagingCodecError>;

/// Decodes one front-end frame (GSMTAP header + Layer-3 message).
pub fn decode_frame(frame: &[u8]) -> Result<L3Message> {
    let l3 = frame
        .get(GSMTAP_HEADER_LEN..)
        .ok_or(PagingCodecError::TruncatedHeader(frame.len()))?;
    decode_l3(l3)
}

/// Decodes the TMSIs paged by one front-end frame, in extraction order.
pub fn extract_tmsis(frame: &[u8]) -> Result<Vec<Tmsi>> {
    Ok(decode_frame(frame)?.tmsis())
}

/// Decodes a Layer-3 message.
///
/// Messages other than RR Paging Requests decode to [`L3Message::Other`].
pub fn decode_l3(l3: &[u8]) -> Result<L3Message> {
    require(l3, L3_MIN_LEN)?;

    let protocol_discriminator = l3[1];
    let message_type = l3[2];

    let kind = match PagingKind::from_message_type(message_type) {
        Some(kind) if protocol_discriminator == PD_RADIO_RESOURCE => kind,
        _ => {
            return Ok(L3Message::Other {
                protocol_discriminator,
                message_type,
            })
        }
    };

    require(l3, kind.min_len())?;

    let request = match kind {
        PagingKind::Type1 => decode_paging_1(l3)?,
        PagingKind::Type2 => decode_paging_2(l3),
        PagingKind::Type3 => decode_paging_3(l3),
    };
    Ok(L3Message::Paging(request))
}

fn require(buf: &[u8], needed: usize) -> Result<()> {
    if buf.len() < needed {
        return Err(PagingCodecError::BufferTooShort {
            needed,
            available: buf.len(),
        });
    }
    Ok(())
}

/// Reads a TMSI at `offset`, failing if it is truncated.
fn tmsi_at(l3: &[u8], offset: usize) -> Result<Tmsi> {
    l3.get(offset..)
        .and_then(Tmsi::from_slice)
        .ok_or(PagingCodecError::BufferTooShort {
            needed: offset + Tmsi::LEN,
            available: l3.len(),
        })
}

/// Paging Request Type 1: one mandatory and one optional Mobile Identity.
fn decode_paging_1(l3: &[u8]) -> Result<PagingRequest> {
    let mut request = PagingRequest::new(PagingKind::Type1);

    let mi_len = l3[4] as usize;
    let mi_type = l3[5] & MI_TYPE_MASK;

    let next = match mi_type {
        MI_TYPE_TMSI => {
            request.identities.push(MobileIdentity::Tmsi(tmsi_at(l3, 6)?));
            10
        }
        MI_TYPE_IMSI => {
            let value = l3.get(5..5 + mi_len).ok_or(PagingCodecError::BufferTooShort {
                needed: 5 + mi_len,
                available: l3.len(),
            })?;
            request.identities.push(MobileIdentity::Imsi(decode_bcd_digits(value)));
            5 + mi_len
        }
        other => {
            // Other identity types end extraction
            request.identities.push(MobileIdentity::Other {
                type_of_identity: other,
            });
            return Ok(request);
        }
    };

    // L2 pseudo length bounds where the second identity may start
    let msg_len = l3[0] as usize;
    if next < msg_len + 1 && l3.get(next) == Some(&IEI_MOBILE_IDENTITY_2) {
        if let Some(identity) = decode_mobile_identity_2(l3, next) {
            request.identities.push(identity);
        }
    }

    Ok(request)
}

/// Decodes the optional `0x17`-tagged Mobile Identity starting at `tag`.
fn decode_mobile_identity_2(l3: &[u8], tag: usize) -> Option<MobileIdentity> {
    let len = *l3.get(tag + 1)? as usize;
    let type_octet = *l3.get(tag + 2)?;

    match type_octet & MI_TYPE_MASK {
        MI_TYPE_TMSI => Tmsi::from_slice(l3.get(tag + 3..)?).map(MobileIdentity::Tmsi),
        MI_TYPE_IMSI => {
            let value = l3.get(tag + 2..tag + 2 + len)?;
            Some(MobileIdentity::Imsi(decode_bcd_digits(value)))
        }
        other => Some(MobileIdentity::Other {
            type_of_identity: other,
        }),
    }
}

/// Paging Request Type 2: two TMSIs and an optional third identity.
fn decode_paging_2(l3: &[u8]) -> PagingRequest {
    let mut request = PagingRequest::new(PagingKind::Type2);

    // min_len() guarantees both mandatory TMSIs
    for offset in [4, 8] {
        if let Some(tmsi) = Tmsi::from_slice(&l3[offset..]) {
            request.identities.push(MobileIdentity::Tmsi(tmsi));
        }
    }

    let optional = l3
        .get(14)
        .filter(|&&octet| octet & MI_TYPE_MASK == MI_TYPE_TMSI)
        .and_then(|_| l3.get(15..))
        .and_then(Tmsi::from_slice);
    if let Some(tmsi) = optional {
        request.identities.push(MobileIdentity::Tmsi(tmsi));
    }

    request
}

/// Paging Request Type 3: four TMSIs.
fn decode_paging_3(l3: &[u8]) -> PagingRequest {
    let mut request = PagingRequest::new(PagingKind::Type3);
    for offset in [4, 8, 12, 16] {
        if let Some(tmsi) = Tmsi::from_slice(&l3[offset..]) {
            request.identities.push(MobileIdentity::Tmsi(tmsi));
        }
    }
    request
}

/// Decodes the BCD digits of an IMSI/IMEI Mobile Identity value.
///
/// `value` starts at the octet holding digit 1 and the type bits. An even
/// digit count pads the last octet's high nibble with `0xF`.
fn decode_bcd_digits(value: &[u8]) -> String {
    let Some((&first, rest)) = value.split_first() else {
        return String::new();
    };

    let mut digits = String::with_capacity(1 + 2 * rest.len());
    let mut push = |nibble: u8| {
        if nibble <= 9 {
            digits.push(char::from(b'0' + nibble));
        }
    };

    push(first >> 4);
    for octet in rest {
        push(octet & 0x0f);
        push(octet >> 4);
    }
    digits
}
