//! BER decoding into tagged value lists.
//!
//! [`decode_sequence`] reads one constructed TLV and returns its children as a
//! flat `Vec<Value>` headed by the outer tag. Nested SEQUENCE and PDU children
//! recurse, bounded by [`MAX_NESTING_DEPTH`].

use std::net::Ipv4Addr;

use bytes::Bytes;

use super::integer::{decode_integer, decode_signed};
use super::length::decode_length_at;
use super::tag;
use crate::error::{DecodeErrorKind, Error, ExceptionKind, Result};
use crate::oid::Oid;
use crate::value::{SequenceTag, Value};

/// Deepest nesting accepted. SNMP messages nest at most six levels; the
/// margin leaves room for odd but legal encodings.
pub const MAX_NESTING_DEPTH: usize = 32;

/// Decode one constructed TLV.
///
/// The outer tag may be SEQUENCE or any constructed tag (a PDU decoded on its
/// own, for example). Bytes past the declared outer length are ignored.
///
/// ```
/// use snmp_session::ber::decode_sequence;
/// use snmp_session::value::{SequenceTag, Value};
///
/// let values = decode_sequence(&[0x30, 0x03, 0x02, 0x01, 0x00]).unwrap();
/// assert_eq!(values, vec![Value::Tag(SequenceTag::Sequence), Value::Integer(0)]);
/// ```
pub fn decode_sequence(data: &[u8]) -> Result<Vec<Value>> {
    decode_sequence_at(data, 0, 0)
}

fn decode_sequence_at(data: &[u8], base: usize, depth: usize) -> Result<Vec<Value>> {
    if depth > MAX_NESTING_DEPTH {
        return Err(fail(
            base,
            DecodeErrorKind::NestingTooDeep {
                max: MAX_NESTING_DEPTH,
            },
        ));
    }
    if data.len() < 2 {
        return Err(fail(base, DecodeErrorKind::Truncated));
    }

    let outer = data[0];
    let Some(head) = SequenceTag::from_byte(outer) else {
        return Err(fail(base, DecodeErrorKind::NotASequence { tag: outer }));
    };

    let (len, len_octets) = decode_length_at(&data[1..], base + 1)?;
    let start = 1 + len_octets;
    let end = start
        .checked_add(len)
        .filter(|&end| end <= data.len())
        .ok_or_else(|| fail(base + 1, DecodeErrorKind::Truncated))?;

    let mut result = vec![Value::Tag(head)];
    let mut idx = start;

    while idx < end {
        let child_tag = data[idx];
        let tag_offset = base + idx;
        if idx + 1 >= end {
            return Err(fail(base + idx, DecodeErrorKind::Truncated));
        }
        let (value_len, value_len_octets) =
            decode_length_at(&data[idx + 1..end], base + idx + 1)?;
        let value_start = idx + 1 + value_len_octets;
        let value_end = value_start
            .checked_add(value_len)
            .filter(|&e| e <= end)
            .ok_or_else(|| fail(base + idx + 1, DecodeErrorKind::Truncated))?;

        let value = if tag::is_nested_sequence(child_tag) {
            Value::Sequence(decode_sequence_at(
                &data[idx..value_end],
                base + idx,
                depth + 1,
            )?)
        } else {
            decode_primitive(
                child_tag,
                tag_offset,
                &data[value_start..value_end],
                &data[idx..value_end],
                base + value_start,
            )?
        };
        result.push(value);

        if value_end <= idx {
            return Err(fail(base + idx, DecodeErrorKind::NoProgress));
        }
        idx = value_end;
    }

    Ok(result)
}

/// `offset` locates the content; `tag_offset` the element itself.
fn decode_primitive(
    tag: u8,
    tag_offset: usize,
    content: &[u8],
    tlv: &[u8],
    offset: usize,
) -> Result<Value> {
    let value = match tag {
        tag::universal::BOOLEAN => match content {
            [b] => Value::Boolean(*b != 0),
            _ => {
                return Err(fail(
                    offset,
                    DecodeErrorKind::InvalidBoolean {
                        length: content.len(),
                    },
                ));
            }
        },
        tag::universal::INTEGER => {
            Value::Integer(decode_signed(content).map_err(|e| relocate(e, offset))?)
        }
        tag::universal::OCTET_STRING => Value::OctetString(Bytes::copy_from_slice(content)),
        tag::universal::NULL => {
            if !content.is_empty() {
                return Err(fail(offset, DecodeErrorKind::InvalidNull));
            }
            Value::Null
        }
        tag::universal::OBJECT_IDENTIFIER => Value::ObjectIdentifier(Oid::from_ber(content)?),
        tag::application::IP_ADDRESS => {
            let octets: [u8; 4] = content.try_into().map_err(|_| {
                fail(
                    offset,
                    DecodeErrorKind::InvalidIpAddressLength {
                        length: content.len(),
                    },
                )
            })?;
            Value::IpAddress(Ipv4Addr::from(octets))
        }
        tag::application::COUNTER32 => Value::Counter(decode_u32(content, offset)?),
        tag::application::GAUGE32 => Value::Gauge(decode_u32(content, offset)?),
        tag::application::TIMETICKS => Value::TimeTicks(decode_u32(content, offset)?),
        tag::context::NO_SUCH_OBJECT => return Err(exception(ExceptionKind::NoSuchObject, tlv)),
        tag::context::NO_SUCH_INSTANCE => {
            return Err(exception(ExceptionKind::NoSuchInstance, tlv));
        }
        tag::context::END_OF_MIB_VIEW => return Err(exception(ExceptionKind::EndOfMibView, tlv)),
        other => {
            return Err(fail(
                tag_offset,
                DecodeErrorKind::UnsupportedType { tag: other },
            ));
        }
    };
    Ok(value)
}

fn decode_u32(content: &[u8], offset: usize) -> Result<u32> {
    let wide = decode_integer(content).map_err(|e| relocate(e, offset))?;
    u32::try_from(wide).map_err(|_| fail(offset, DecodeErrorKind::IntegerOverflow))
}

fn exception(kind: ExceptionKind, tlv: &[u8]) -> Error {
    tracing::debug!(target: "snmp_session::ber", { snmp.exception = %kind }, "exception marker in response");
    Error::Exception {
        kind,
        data: Bytes::copy_from_slice(tlv),
    }
}

fn fail(offset: usize, kind: DecodeErrorKind) -> Error {
    tracing::debug!(target: "snmp_session::ber", { snmp.offset = offset, kind = %kind }, "decode failed");
    Error::decode(offset, kind)
}

fn relocate(err: Error, offset: usize) -> Error {
    match err {
        Error::Decode { kind, .. } => fail(offset, kind),
        other => other,
    }
}
