//! SNMP message envelopes.
//!
//! Messages wrap a PDU with version and security information.
//!
//! - [`CommunityMessage`] - v1/v2c messages with a community string
//! - [`V3Message`] - v3 messages with USM security
//! - [`Trap`] - notifications received in a community envelope

mod community;
mod trap;
mod v3;

pub use community::CommunityMessage;
pub use trap::{Trap, parse_trap};
pub use v3::{MsgGlobalData, ScopedPdu, ScopedPduData, V3Message};

use crate::ber::{decode_length, decode_signed};
use crate::error::{DecodeErrorKind, Error, Result};
use crate::value::{Value, field};
use crate::version::Version;

/// Read msgVersion from a decoded message (tag first).
pub(crate) fn read_version(items: &[Value]) -> Result<Version> {
    let raw = field::integer(items, 1, "msgVersion")?;
    Version::from_i64(raw).ok_or_else(|| {
        tracing::debug!(target: "snmp_session::ber", { version = raw }, "unknown message version");
        Error::decode(0, DecodeErrorKind::UnknownVersion(raw))
    })
}

/// Read the identifier a reply is matched on without decoding the body.
///
/// For v1/v2c this is the PDU request-id, for v3 the msgID. Returns `None`
/// when the header is malformed.
pub(crate) fn reply_id(data: &[u8]) -> Option<i32> {
    let body = enter(data, 0x30)?;
    let (version, rest) = integer(body)?;
    if version == Version::V3.as_i64() {
        let global_data = enter(rest, 0x30)?;
        return integer(global_data).and_then(|(id, _)| i32::try_from(id).ok());
    }
    let (_, rest) = element(rest, 0x04)?;
    let (&pdu_tag, _) = rest.split_first()?;
    if pdu_tag & 0xE0 != 0xA0 {
        return None;
    }
    let pdu = enter(rest, pdu_tag)?;
    integer(pdu).and_then(|(id, _)| i32::try_from(id).ok())
}

/// Split one TLV off `data`: `(content, rest)`.
fn element(data: &[u8], tag: u8) -> Option<(&[u8], &[u8])> {
    let (&actual, after_tag) = data.split_first()?;
    if actual != tag {
        return None;
    }
    let (len, consumed) = decode_length(after_tag).ok()?;
    let content = after_tag.get(consumed..consumed.checked_add(len)?)?;
    Some((content, &after_tag[consumed + len..]))
}

/// Descend into a constructed element. The content may be cut short.
fn enter(data: &[u8], tag: u8) -> Option<&[u8]> {
    let (&actual, after_tag) = data.split_first()?;
    if actual != tag {
        return None;
    }
    let (_, consumed) = decode_length(after_tag).ok()?;
    after_tag.get(consumed..)
}

fn integer(data: &[u8]) -> Option<(i64, &[u8])> {
    let (content, rest) = element(data, 0x02)?;
    Some((decode_signed(content).ok()?, rest))
}
