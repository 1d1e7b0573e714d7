//! Community-based message format (v1/v2c).
//!
//! V1 and V2c messages share the same structure:
//! `SEQUENCE { version INTEGER, community OCTET STRING, pdu PDU }`
//!
//! The only difference is the version number (0 for v1, 1 for v2c).

use bytes::Bytes;

use super::read_version;
use crate::ber::{decode_sequence, encode_sequence};
use crate::error::{DecodeErrorKind, Error, Result};
use crate::pdu::Pdu;
use crate::value::{SequenceTag, Value, field};
use crate::version::Version;

/// Community-based SNMP message (v1/v2c).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommunityMessage {
    /// SNMP version (V1 or V2c)
    pub version: Version,
    /// Community string for authentication
    pub community: Bytes,
    /// Protocol data unit
    pub pdu: Pdu,
}

impl CommunityMessage {
    pub fn new(version: Version, community: impl Into<Bytes>, pdu: Pdu) -> Self {
        Self {
            version,
            community: community.into(),
            pdu,
        }
    }

    /// Encode to BER.
    pub fn encode(&self) -> Result<Bytes> {
        encode_sequence(&[
            Value::Tag(SequenceTag::Sequence),
            Value::Integer(self.version.as_i64()),
            Value::OctetString(self.community.clone()),
            self.pdu.to_value(),
        ])
    }

    /// Decode from BER. V3 messages are rejected.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let items = decode_sequence(data)?;
        Self::from_values(&items)
    }

    pub(crate) fn from_values(items: &[Value]) -> Result<Self> {
        let version = read_version(items)?;
        if !version.is_community() {
            return Err(Error::decode(
                0,
                DecodeErrorKind::UnknownVersion(version.as_i64()),
            ));
        }
        Ok(Self {
            version,
            community: field::octets(items, 2, "community")?,
            pdu: Pdu::from_values(field::sequence(items, 3, "pdu")?)?,
        })
    }

    /// Consume and return the PDU.
    pub fn into_pdu(self) -> Pdu {
        self.pdu
    }
}
