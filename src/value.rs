//! SNMP value types.
//!
//! [`Value`] is the closed set of BER elements the codec understands. A
//! sequence is a `Vec<Value>` whose first element is a [`Value::Tag`] naming the
//! outer tag byte, so decoded sequences and sequences built for encoding share
//! one shape.

use std::net::Ipv4Addr;
use std::time::Duration;

use bytes::Bytes;

use crate::ber::tag;
use crate::oid::Oid;
use crate::util::hex;

/// Tag byte heading a constructed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequenceTag {
    Sequence,
    GetRequest,
    GetNextRequest,
    Response,
    SetRequest,
    TrapV1,
    GetBulkRequest,
    InformRequest,
    TrapV2,
    Report,
    /// Any other constructed tag, accepted only as the outer tag of a decode.
    Constructed(u8),
}

impl SequenceTag {
    /// Map a tag byte. Returns `None` for primitive tags.
    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            tag::universal::SEQUENCE => Self::Sequence,
            tag::pdu::GET_REQUEST => Self::GetRequest,
            tag::pdu::GET_NEXT_REQUEST => Self::GetNextRequest,
            tag::pdu::RESPONSE => Self::Response,
            tag::pdu::SET_REQUEST => Self::SetRequest,
            tag::pdu::TRAP_V1 => Self::TrapV1,
            tag::pdu::GET_BULK_REQUEST => Self::GetBulkRequest,
            tag::pdu::INFORM_REQUEST => Self::InformRequest,
            tag::pdu::TRAP_V2 => Self::TrapV2,
            tag::pdu::REPORT => Self::Report,
            other if tag::is_constructed(other) => Self::Constructed(other),
            _ => return None,
        })
    }

    /// The wire tag byte.
    pub fn as_byte(self) -> u8 {
        match self {
            Self::Sequence => tag::universal::SEQUENCE,
            Self::GetRequest => tag::pdu::GET_REQUEST,
            Self::GetNextRequest => tag::pdu::GET_NEXT_REQUEST,
            Self::Response => tag::pdu::RESPONSE,
            Self::SetRequest => tag::pdu::SET_REQUEST,
            Self::TrapV1 => tag::pdu::TRAP_V1,
            Self::GetBulkRequest => tag::pdu::GET_BULK_REQUEST,
            Self::InformRequest => tag::pdu::INFORM_REQUEST,
            Self::TrapV2 => tag::pdu::TRAP_V2,
            Self::Report => tag::pdu::REPORT,
            Self::Constructed(byte) => byte,
        }
    }

    /// True for the PDU tags (0xA0-0xA8).
    pub fn is_pdu(self) -> bool {
        !matches!(self, Self::Sequence | Self::Constructed(_))
    }
}

impl std::fmt::Display for SequenceTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sequence => write!(f, "Sequence"),
            Self::GetRequest => write!(f, "GetRequest"),
            Self::GetNextRequest => write!(f, "GetNextRequest"),
            Self::Response => write!(f, "Response"),
            Self::SetRequest => write!(f, "SetRequest"),
            Self::TrapV1 => write!(f, "Trap"),
            Self::GetBulkRequest => write!(f, "GetBulkRequest"),
            Self::InformRequest => write!(f, "InformRequest"),
            Self::TrapV2 => write!(f, "SNMPv2-Trap"),
            Self::Report => write!(f, "Report"),
            Self::Constructed(byte) => write!(f, "Constructed(0x{:02X})", byte),
        }
    }
}

/// One BER element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Head of a sequence; names the outer tag.
    Tag(SequenceTag),
    Boolean(bool),
    /// INTEGER (two's complement on the wire)
    Integer(i64),
    OctetString(Bytes),
    Null,
    ObjectIdentifier(Oid),
    /// Nested sequence, first element is its `Tag`.
    Sequence(Vec<Value>),
    /// Counter32 (unsigned, wrapping)
    Counter(u32),
    /// Gauge32 / Unsigned32
    Gauge(u32),
    /// TimeTicks (hundredths of a second)
    TimeTicks(u32),
    IpAddress(Ipv4Addr),
    /// Exception marker. Encodable, but decoding one aborts with
    /// [`Error::Exception`](crate::Error::Exception).
    NoSuchInstance,
    /// Exception marker, see [`Value::NoSuchInstance`].
    EndOfMibView,
}

impl Value {
    /// Shorthand for a nested sequence with the given head.
    pub fn sequence(tag: SequenceTag, items: impl IntoIterator<Item = Value>) -> Self {
        let mut values = vec![Value::Tag(tag)];
        values.extend(items);
        Value::Sequence(values)
    }

    /// Integer-like values widened to `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            Value::Counter(v) | Value::Gauge(v) | Value::TimeTicks(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    /// Unsigned 32-bit application types.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Value::Counter(v) | Value::Gauge(v) | Value::TimeTicks(v) => Some(*v),
            Value::Integer(v) => u32::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::OctetString(b) => Some(b),
            _ => None,
        }
    }

    /// OCTET STRING content as UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes().and_then(|b| std::str::from_utf8(b).ok())
    }

    pub fn as_oid(&self) -> Option<&Oid> {
        match self {
            Value::ObjectIdentifier(oid) => Some(oid),
            _ => None,
        }
    }

    /// Nested sequence elements, including the leading tag.
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// TimeTicks as a `Duration`.
    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Value::TimeTicks(t) => Some(Duration::from_millis(u64::from(*t) * 10)),
            _ => None,
        }
    }

    /// Short type name, as printed by the CLI tools.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Tag(_) => "Tag",
            Value::Boolean(_) => "BOOLEAN",
            Value::Integer(_) => "INTEGER",
            Value::OctetString(_) => "STRING",
            Value::Null => "NULL",
            Value::ObjectIdentifier(_) => "OID",
            Value::Sequence(_) => "SEQUENCE",
            Value::Counter(_) => "Counter32",
            Value::Gauge(_) => "Gauge32",
            Value::TimeTicks(_) => "Timeticks",
            Value::IpAddress(_) => "IpAddress",
            Value::NoSuchInstance => "noSuchInstance",
            Value::EndOfMibView => "endOfMibView",
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Tag(t) => write!(f, "{}", t),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(v) => write!(f, "{}", v),
            Value::OctetString(data) => {
                // Printable text as-is, binary as hex
                match std::str::from_utf8(data) {
                    Ok(s) if !s.chars().any(|c| c.is_control() && !c.is_whitespace()) => {
                        write!(f, "{}", s)
                    }
                    _ => write!(f, "0x{}", hex::encode(data)),
                }
            }
            Value::Null => write!(f, "NULL"),
            Value::ObjectIdentifier(oid) => write!(f, "{}", oid),
            Value::Sequence(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Counter(v) | Value::Gauge(v) => write!(f, "{}", v),
            Value::TimeTicks(v) => {
                let secs = v / 100;
                let days = secs / 86400;
                let hours = (secs % 86400) / 3600;
                let mins = (secs % 3600) / 60;
                let s = secs % 60;
                write!(f, "{}d {}h {}m {}s", days, hours, mins, s)
            }
            Value::IpAddress(addr) => write!(f, "{}", addr),
            Value::NoSuchInstance => write!(f, "noSuchInstance"),
            Value::EndOfMibView => write!(f, "endOfMibView"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::OctetString(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<Oid> for Value {
    fn from(oid: Oid) -> Self {
        Value::ObjectIdentifier(oid)
    }
}

impl From<SequenceTag> for Value {
    fn from(tag: SequenceTag) -> Self {
        Value::Tag(tag)
    }
}

/// Typed field access for decoded value lists. Index 0 is the tag, so
/// message fields start at 1.
pub(crate) mod field {
    use bytes::Bytes;

    use super::Value;
    use crate::error::{DecodeErrorKind, Error, Result};
    use crate::oid::Oid;

    pub(crate) fn get<'a>(items: &'a [Value], index: usize, name: &'static str) -> Result<&'a Value> {
        items
            .get(index)
            .ok_or(Error::decode(0, DecodeErrorKind::MissingField { field: name }))
    }

    fn mismatch(name: &'static str) -> Error {
        Error::decode(0, DecodeErrorKind::UnexpectedType { field: name })
    }

    pub(crate) fn integer(items: &[Value], index: usize, name: &'static str) -> Result<i64> {
        match get(items, index, name)? {
            Value::Integer(v) => Ok(*v),
            _ => Err(mismatch(name)),
        }
    }

    /// INTEGER narrowed to `i32` (request IDs, error status).
    pub(crate) fn int32(items: &[Value], index: usize, name: &'static str) -> Result<i32> {
        i32::try_from(integer(items, index, name)?)
            .map_err(|_| Error::decode(0, DecodeErrorKind::IntegerOverflow))
    }

    /// INTEGER constrained to `0..=2147483647` (engine boots and time).
    pub(crate) fn non_negative(items: &[Value], index: usize, name: &'static str) -> Result<u32> {
        let v = integer(items, index, name)?;
        if !(0..=i64::from(i32::MAX)).contains(&v) {
            return Err(Error::decode(0, DecodeErrorKind::IntegerOverflow));
        }
        Ok(v as u32)
    }

    pub(crate) fn octets(items: &[Value], index: usize, name: &'static str) -> Result<Bytes> {
        match get(items, index, name)? {
            Value::OctetString(b) => Ok(b.clone()),
            _ => Err(mismatch(name)),
        }
    }

    pub(crate) fn oid<'a>(items: &'a [Value], index: usize, name: &'static str) -> Result<&'a Oid> {
        match get(items, index, name)? {
            Value::ObjectIdentifier(oid) => Ok(oid),
            _ => Err(mismatch(name)),
        }
    }

    pub(crate) fn sequence<'a>(
        items: &'a [Value],
        index: usize,
        name: &'static str,
    ) -> Result<&'a [Value]> {
        match get(items, index, name)? {
            Value::Sequence(inner) => Ok(inner),
            _ => Err(mismatch(name)),
        }
    }
}
