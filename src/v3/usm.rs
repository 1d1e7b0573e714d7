//! User-based Security Model (USM) parameters (RFC 3414).
//!
//! USM security parameters are encoded as an OCTET STRING containing
//! a BER-encoded SEQUENCE:
//!
//! ```text
//! UsmSecurityParameters ::= SEQUENCE {
//!     msgAuthoritativeEngineID     OCTET STRING,
//!     msgAuthoritativeEngineBoots  INTEGER (0..2147483647),
//!     msgAuthoritativeEngineTime   INTEGER (0..2147483647),
//!     msgUserName                  OCTET STRING (SIZE(0..32)),
//!     msgAuthenticationParameters  OCTET STRING,
//!     msgPrivacyParameters         OCTET STRING
//! }
//! ```

use std::ops::Range;

use bytes::Bytes;

use crate::ber::{decode_length_at, decode_sequence, encode_sequence, tag};
use crate::error::Result;
use crate::value::{SequenceTag, Value, field};

/// USM security parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsmSecurityParams {
    /// Authoritative engine ID
    pub engine_id: Bytes,
    /// Engine boot count
    pub engine_boots: u32,
    /// Engine time (seconds since last boot)
    pub engine_time: u32,
    /// Username
    pub username: Bytes,
    /// Authentication parameters (HMAC digest, or empty)
    pub auth_params: Bytes,
    /// Privacy parameters (salt, or empty)
    pub priv_params: Bytes,
}

impl UsmSecurityParams {
    /// Create new USM security parameters.
    pub fn new(
        engine_id: impl Into<Bytes>,
        engine_boots: u32,
        engine_time: u32,
        username: impl Into<Bytes>,
    ) -> Self {
        Self {
            engine_id: engine_id.into(),
            engine_boots,
            engine_time,
            username: username.into(),
            auth_params: Bytes::new(),
            priv_params: Bytes::new(),
        }
    }

    /// Create empty security parameters for discovery.
    pub fn empty() -> Self {
        Self::new(Bytes::new(), 0, 0, Bytes::new())
    }

    /// Set authentication parameters.
    pub fn with_auth_params(mut self, auth_params: impl Into<Bytes>) -> Self {
        self.auth_params = auth_params.into();
        self
    }

    /// Set privacy parameters.
    pub fn with_priv_params(mut self, priv_params: impl Into<Bytes>) -> Self {
        self.priv_params = priv_params.into();
        self
    }

    /// The parameters as a tagged value list.
    pub fn to_values(&self) -> Vec<Value> {
        vec![
            Value::Tag(SequenceTag::Sequence),
            Value::OctetString(self.engine_id.clone()),
            Value::Integer(i64::from(self.engine_boots)),
            Value::Integer(i64::from(self.engine_time)),
            Value::OctetString(self.username.clone()),
            Value::OctetString(self.auth_params.clone()),
            Value::OctetString(self.priv_params.clone()),
        ]
    }

    /// Encode to BER; the result is carried as an OCTET STRING in the message.
    pub fn encode(&self) -> Result<Bytes> {
        encode_sequence(&self.to_values())
    }

    /// Decode from the content of msgSecurityParameters.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let items = decode_sequence(data)?;
        Ok(Self {
            engine_id: field::octets(&items, 1, "msgAuthoritativeEngineID")?,
            engine_boots: field::non_negative(&items, 2, "msgAuthoritativeEngineBoots")?,
            engine_time: field::non_negative(&items, 3, "msgAuthoritativeEngineTime")?,
            username: field::octets(&items, 4, "msgUserName")?,
            auth_params: field::octets(&items, 5, "msgAuthenticationParameters")?,
            priv_params: field::octets(&items, 6, "msgPrivacyParameters")?,
        })
    }
}

/// Find msgAuthenticationParameters content in a serialized v3 message.
///
/// Walks the TLV headers of the message rather than searching for a zero run,
/// so an engine ID or user name that contains zeros cannot be mistaken for the
/// placeholder. Returns `None` if the message is not shaped like a v3 message.
pub fn locate_auth_params(message: &[u8]) -> Option<Range<usize>> {
    // message SEQUENCE
    let (_, body) = enter(message, 0, tag::universal::SEQUENCE)?;
    // msgVersion, msgGlobalData
    let pos = skip(message, body.start, tag::universal::INTEGER)?;
    let pos = skip(message, pos, tag::universal::SEQUENCE)?;
    // msgSecurityParameters OCTET STRING wrapping the USM SEQUENCE
    let (_, octets) = enter(message, pos, tag::universal::OCTET_STRING)?;
    let (_, usm) = enter(message, octets.start, tag::universal::SEQUENCE)?;
    // engine ID, boots, time, user name
    let pos = skip(message, usm.start, tag::universal::OCTET_STRING)?;
    let pos = skip(message, pos, tag::universal::INTEGER)?;
    let pos = skip(message, pos, tag::universal::INTEGER)?;
    let pos = skip(message, pos, tag::universal::OCTET_STRING)?;
    let (_, auth) = enter(message, pos, tag::universal::OCTET_STRING)?;
    (auth.end <= usm.end).then_some(auth)
}

/// Read the TLV header at `pos`, returning the TLV end and content range.
fn enter(data: &[u8], pos: usize, expected: u8) -> Option<(usize, Range<usize>)> {
    if *data.get(pos)? != expected {
        return None;
    }
    let (len, len_octets) = decode_length_at(data.get(pos + 1..)?, pos + 1).ok()?;
    let start = pos + 1 + len_octets;
    let end = start.checked_add(len)?;
    (end <= data.len()).then_some((end, start..end))
}

fn skip(data: &[u8], pos: usize, expected: u8) -> Option<usize> {
    enter(data, pos, expected).map(|(end, _)| end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn message_with(usm: &UsmSecurityParams) -> Vec<u8> {
        let values = vec![
            Value::Tag(SequenceTag::Sequence),
            Value::Integer(3),
            Value::sequence(
                SequenceTag::Sequence,
                [
                    Value::Integer(1),
                    Value::Integer(65507),
                    Value::OctetString(Bytes::from_static(&[0x07])),
                    Value::Integer(3),
                ],
            ),
            Value::OctetString(usm.encode().unwrap()),
            Value::OctetString(Bytes::from_static(b"ciphertext")),
        ];
        encode_sequence(&values).unwrap().to_vec()
    }

    #[test]
    fn encode_decode_round_trip() {
        let params = UsmSecurityParams::new(&b"\x80\x00\x1f\x88\x04"[..], 7, 1234, &b"admin"[..])
            .with_auth_params(vec![0u8; 12])
            .with_priv_params(vec![1u8; 8]);
        let decoded = UsmSecurityParams::decode(&params.encode().unwrap()).unwrap();
        assert_eq!(decoded, params);
    }

    #[test]
    fn discovery_params_encode_empty_fields() {
        let bytes = UsmSecurityParams::empty().encode().unwrap();
        assert_eq!(
            &bytes[..],
            &[
                0x30, 0x0e, 0x04, 0x00, 0x02, 0x01, 0x00, 0x02, 0x01, 0x00, 0x04, 0x00, 0x04,
                0x00, 0x04, 0x00
            ]
        );
    }

    #[test]
    fn decode_rejects_negative_boots() {
        let mut values = UsmSecurityParams::empty().to_values();
        values[2] = Value::Integer(-1);
        let bytes = encode_sequence(&values).unwrap();
        assert!(UsmSecurityParams::decode(&bytes).is_err());
    }

    #[test]
    fn decode_rejects_missing_fields() {
        let bytes =
            encode_sequence(&[Value::Tag(SequenceTag::Sequence), Value::from("engine")]).unwrap();
        assert!(UsmSecurityParams::decode(&bytes).is_err());
    }

    #[test]
    fn locates_placeholder_even_with_zero_engine_id() {
        // An all-zero engine ID must not be mistaken for the placeholder
        let usm = UsmSecurityParams::new(vec![0u8; 12], 1, 2, &b"user"[..])
            .with_auth_params(vec![0u8; 12])
            .with_priv_params(vec![9u8; 8]);
        let msg = message_with(&usm);
        let range = locate_auth_params(&msg).unwrap();
        assert_eq!(range.len(), 12);
        // priv params follow the auth params TLV directly
        assert_eq!(&msg[range.end..range.end + 2], &[0x04, 0x08]);
        assert_eq!(&msg[range.start - 2..range.start], &[0x04, 0x0c]);
    }

    #[test]
    fn locate_fails_on_community_message() {
        let values = vec![
            Value::Tag(SequenceTag::Sequence),
            Value::Integer(1),
            Value::from("public"),
        ];
        let msg = encode_sequence(&values).unwrap();
        assert!(locate_auth_params(&msg).is_none());
    }
}
