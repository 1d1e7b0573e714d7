//! SNMPv3 message format (RFC 3412).
//!
//! ```text
//! SNMPv3Message ::= SEQUENCE {
//!     msgVersion INTEGER (3),
//!     msgGlobalData HeaderData,
//!     msgSecurityParameters OCTET STRING,
//!     msgData ScopedPduData
//! }
//!
//! HeaderData ::= SEQUENCE {
//!     msgID INTEGER,
//!     msgMaxSize INTEGER,
//!     msgFlags OCTET STRING (SIZE(1)),
//!     msgSecurityModel INTEGER
//! }
//!
//! ScopedPduData ::= CHOICE {
//!     plaintext ScopedPDU,
//!     encryptedPDU OCTET STRING
//! }
//!
//! ScopedPDU ::= SEQUENCE {
//!     contextEngineID OCTET STRING,
//!     contextName OCTET STRING,
//!     data ANY -- PDU
//! }
//! ```

use bytes::Bytes;

use super::read_version;
use crate::ber::{decode_sequence, encode_sequence};
use crate::error::{DecodeErrorKind, Error, Result};
use crate::pdu::Pdu;
use crate::v3::{DEFAULT_MSG_MAX_SIZE, SECURITY_MODEL_USM, UsmSecurityParams, flags};
use crate::value::{SequenceTag, Value, field};
use crate::version::Version;

/// Message global data header (msgGlobalData).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MsgGlobalData {
    /// Message identifier for request/response correlation
    pub msg_id: i32,
    /// Maximum message size the sender can accept
    pub msg_max_size: u32,
    /// msgFlags byte: auth, priv and reportable bits
    pub msg_flags: u8,
    /// Security model (3 for USM)
    pub msg_security_model: i64,
}

impl MsgGlobalData {
    pub fn new(msg_id: i32, msg_flags: u8) -> Self {
        Self {
            msg_id,
            msg_max_size: DEFAULT_MSG_MAX_SIZE,
            msg_flags,
            msg_security_model: SECURITY_MODEL_USM,
        }
    }

    fn to_value(self) -> Value {
        Value::sequence(
            SequenceTag::Sequence,
            [
                Value::Integer(i64::from(self.msg_id)),
                Value::Integer(i64::from(self.msg_max_size)),
                Value::OctetString(Bytes::copy_from_slice(&[self.msg_flags])),
                Value::Integer(self.msg_security_model),
            ],
        )
    }

    fn from_values(items: &[Value]) -> Result<Self> {
        let flags = field::octets(items, 3, "msgFlags")?;
        let [msg_flags] = flags[..] else {
            return Err(Error::decode(
                0,
                DecodeErrorKind::UnexpectedType { field: "msgFlags" },
            ));
        };
        Ok(Self {
            msg_id: field::int32(items, 1, "msgID")?,
            msg_max_size: field::non_negative(items, 2, "msgMaxSize")?,
            msg_flags,
            msg_security_model: field::integer(items, 4, "msgSecurityModel")?,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.msg_flags & flags::AUTH != 0
    }

    pub fn is_encrypted(&self) -> bool {
        self.msg_flags & flags::PRIV != 0
    }
}

/// Scoped PDU (contextEngineID + contextName + PDU).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedPdu {
    /// Context engine ID (the authoritative engine ID for our requests)
    pub context_engine_id: Bytes,
    /// Context name (empty: the default context)
    pub context_name: Bytes,
    pub pdu: Pdu,
}

impl ScopedPdu {
    pub fn new(context_engine_id: impl Into<Bytes>, pdu: Pdu) -> Self {
        Self {
            context_engine_id: context_engine_id.into(),
            context_name: Bytes::new(),
            pdu,
        }
    }

    fn items(&self) -> Vec<Value> {
        vec![
            Value::Tag(SequenceTag::Sequence),
            Value::OctetString(self.context_engine_id.clone()),
            Value::OctetString(self.context_name.clone()),
            self.pdu.to_value(),
        ]
    }

    pub fn to_value(&self) -> Value {
        Value::Sequence(self.items())
    }

    /// Encode on its own; this is the plaintext that privacy encrypts.
    pub fn encode(&self) -> Result<Bytes> {
        encode_sequence(&self.items())
    }

    /// Decode a serialized scoped PDU (decrypted plaintext may carry padding).
    pub fn decode(data: &[u8]) -> Result<Self> {
        Self::from_values(&decode_sequence(data)?)
    }

    fn from_values(items: &[Value]) -> Result<Self> {
        Ok(Self {
            context_engine_id: field::octets(items, 1, "contextEngineID")?,
            context_name: field::octets(items, 2, "contextName")?,
            pdu: Pdu::from_values(field::sequence(items, 3, "pdu")?)?,
        })
    }
}

/// msgData: plaintext scoped PDU or ciphertext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopedPduData {
    Plaintext(ScopedPdu),
    Encrypted(Bytes),
}

/// A complete SNMPv3 message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct V3Message {
    pub global_data: MsgGlobalData,
    pub security_params: UsmSecurityParams,
    pub data: ScopedPduData,
}

impl V3Message {
    pub fn new(
        global_data: MsgGlobalData,
        security_params: UsmSecurityParams,
        data: ScopedPduData,
    ) -> Self {
        Self {
            global_data,
            security_params,
            data,
        }
    }

    /// The unauthenticated probe that asks an agent for its engine ID, boots and time.
    pub fn discovery_request(msg_id: i32, request_id: i32) -> Self {
        Self::new(
            MsgGlobalData::new(msg_id, flags::REPORTABLE),
            UsmSecurityParams::empty(),
            ScopedPduData::Plaintext(ScopedPdu::new(
                Bytes::new(),
                Pdu::get_request(request_id, &[]),
            )),
        )
    }

    /// Encode to BER.
    ///
    /// For authenticated messages the caller encodes with a zeroed 12-byte
    /// placeholder in the auth params, then patches the MAC in place.
    pub fn encode(&self) -> Result<Bytes> {
        let data = match &self.data {
            ScopedPduData::Plaintext(scoped) => scoped.to_value(),
            ScopedPduData::Encrypted(ciphertext) => Value::OctetString(ciphertext.clone()),
        };
        encode_sequence(&[
            Value::Tag(SequenceTag::Sequence),
            Value::Integer(Version::V3.as_i64()),
            self.global_data.to_value(),
            Value::OctetString(self.security_params.encode()?),
            data,
        ])
    }

    /// Decode from BER. Encrypted msgData is returned as ciphertext.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let items = decode_sequence(data)?;
        let version = read_version(&items)?;
        if version != Version::V3 {
            return Err(Error::decode(
                0,
                DecodeErrorKind::UnknownVersion(version.as_i64()),
            ));
        }

        let global_data = MsgGlobalData::from_values(field::sequence(&items, 2, "msgGlobalData")?)?;
        let security_params =
            UsmSecurityParams::decode(&field::octets(&items, 3, "msgSecurityParameters")?)?;
        let data = match field::get(&items, 4, "msgData")? {
            Value::OctetString(ciphertext) => ScopedPduData::Encrypted(ciphertext.clone()),
            Value::Sequence(scoped) => ScopedPduData::Plaintext(ScopedPdu::from_values(scoped)?),
            _ => {
                return Err(Error::decode(
                    0,
                    DecodeErrorKind::UnexpectedType { field: "msgData" },
                ));
            }
        };

        Ok(Self {
            global_data,
            security_params,
            data,
        })
    }
}
