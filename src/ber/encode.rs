//! BER encoding.
//!
//! Uses a reverse buffer approach: writes from end backwards to avoid
//! needing to pre-calculate lengths.

use bytes::Bytes;

use super::integer::{encode_integer, encode_signed};
use super::length::encode_length;
use super::tag;
use crate::error::{EncodeErrorKind, Error, Result};
use crate::oid::Oid;
use crate::value::Value;

/// Buffer for BER encoding that writes backwards.
///
/// This approach avoids needing to pre-calculate content lengths:
/// we write the content first, then prepend the length and tag.
pub struct EncodeBuf {
    buf: Vec<u8>,
}

impl EncodeBuf {
    /// Create a new encode buffer with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(512)
    }

    /// Create a new encode buffer with specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Push multiple bytes (prepends to front, reversed).
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend(bytes.iter().rev());
    }

    /// Push a BER length encoding.
    pub fn push_length(&mut self, len: usize) {
        self.push_bytes(&encode_length(len));
    }

    /// Push a BER tag.
    pub fn push_tag(&mut self, tag: u8) {
        self.buf.push(tag);
    }

    /// Get the current length of encoded data.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check if buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Encode a constructed type whose contents may fail to encode.
    ///
    /// Calls the closure to encode contents, then wraps with length and tag.
    pub fn try_push_constructed<F>(&mut self, tag: u8, f: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let start_len = self.len();
        f(self)?;
        let content_len = self.len() - start_len;
        self.push_length(content_len);
        self.push_tag(tag);
        Ok(())
    }

    /// Encode a BOOLEAN.
    pub fn push_boolean(&mut self, value: bool) {
        self.buf.push(if value { 0xFF } else { 0x00 });
        self.push_length(1);
        self.push_tag(tag::universal::BOOLEAN);
    }

    /// Encode an INTEGER in two's complement.
    pub fn push_integer(&mut self, value: i64) {
        let bytes = encode_signed(value);
        self.push_bytes(&bytes);
        self.push_length(bytes.len());
        self.push_tag(tag::universal::INTEGER);
    }

    /// Encode an unsigned application integer (Counter32, Gauge32, TimeTicks).
    pub fn push_unsigned(&mut self, tag: u8, value: u64) {
        let bytes = encode_integer(value);
        self.push_bytes(&bytes);
        self.push_length(bytes.len());
        self.push_tag(tag);
    }

    /// Encode an OCTET STRING.
    pub fn push_octet_string(&mut self, data: &[u8]) {
        self.push_bytes(data);
        self.push_length(data.len());
        self.push_tag(tag::universal::OCTET_STRING);
    }

    /// Encode a NULL.
    pub fn push_null(&mut self) {
        self.push_empty(tag::universal::NULL);
    }

    /// Encode a zero-length element with the given tag.
    pub fn push_empty(&mut self, tag: u8) {
        self.push_length(0);
        self.push_tag(tag);
    }

    /// Encode an OBJECT IDENTIFIER.
    pub fn push_oid(&mut self, oid: &Oid) -> Result<()> {
        let ber = oid.to_ber()?;
        self.push_bytes(&ber);
        self.push_length(ber.len());
        self.push_tag(tag::universal::OBJECT_IDENTIFIER);
        Ok(())
    }

    /// Encode an IP address.
    pub fn push_ip_address(&mut self, addr: [u8; 4]) {
        self.push_bytes(&addr);
        self.push_length(4);
        self.push_tag(tag::application::IP_ADDRESS);
    }

    /// Encode a tagged value list: the head `Tag` becomes the outer tag and
    /// the rest becomes the payload.
    pub fn push_value_sequence(&mut self, values: &[Value]) -> Result<()> {
        let Some((Value::Tag(head), items)) = values.split_first() else {
            return Err(Error::encode(EncodeErrorKind::MissingSequenceTag));
        };
        self.try_push_constructed(head.as_byte(), |buf| {
            // Reverse buffer: push in reverse order for forward output
            for item in items.iter().rev() {
                buf.push_value(item)?;
            }
            Ok(())
        })
    }

    /// Encode one value.
    pub fn push_value(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Tag(_) => return Err(Error::encode(EncodeErrorKind::UnsupportedType)),
            Value::Boolean(b) => self.push_boolean(*b),
            Value::Integer(v) => self.push_integer(*v),
            Value::OctetString(data) => self.push_octet_string(data),
            Value::Null => self.push_null(),
            Value::ObjectIdentifier(oid) => self.push_oid(oid)?,
            Value::Sequence(items) => self.push_value_sequence(items)?,
            Value::Counter(v) => self.push_unsigned(tag::application::COUNTER32, u64::from(*v)),
            Value::Gauge(v) => self.push_unsigned(tag::application::GAUGE32, u64::from(*v)),
            Value::TimeTicks(v) => {
                self.push_unsigned(tag::application::TIMETICKS, u64::from(*v))
            }
            Value::IpAddress(addr) => self.push_ip_address(addr.octets()),
            Value::NoSuchInstance => self.push_empty(tag::context::NO_SUCH_INSTANCE),
            Value::EndOfMibView => self.push_empty(tag::context::END_OF_MIB_VIEW),
        }
        Ok(())
    }

    /// Finalize and return the encoded bytes.
    ///
    /// The buffer is reversed to produce the correct order.
    pub fn finish(mut self) -> Bytes {
        self.buf.reverse();
        Bytes::from(self.buf)
    }

    /// Finalize and return as `Vec<u8>`.
    pub fn finish_vec(mut self) -> Vec<u8> {
        self.buf.reverse();
        self.buf
    }
}

impl Default for EncodeBuf {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode a tagged value list as one TLV.
///
/// `values[0]` must be a [`Value::Tag`]; it selects the outer tag byte.
///
/// ```
/// use snmp_session::ber::encode_sequence;
/// use snmp_session::value::{SequenceTag, Value};
///
/// let bytes = encode_sequence(&[Value::Tag(SequenceTag::Sequence), Value::Integer(0)]).unwrap();
/// assert_eq!(&bytes[..], &[0x30, 0x03, 0x02, 0x01, 0x00]);
/// ```
pub fn encode_sequence(values: &[Value]) -> Result<Bytes> {
    let mut buf = EncodeBuf::new();
    buf.push_value_sequence(values)?;
    Ok(buf.finish())
}
