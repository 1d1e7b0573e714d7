//! SNMP Protocol Data Units (PDUs).
//!
//! Every PDU has the same four-field body:
//!
//! ```text
//! PDU ::= [tag] SEQUENCE {
//!     request-id     INTEGER,
//!     error-status   INTEGER,   -- non-repeaters for GetBulk
//!     error-index    INTEGER,   -- max-repetitions for GetBulk
//!     variable-bindings SEQUENCE OF VarBind
//! }
//! ```

use std::net::SocketAddr;

use crate::error::{DecodeErrorKind, Error, ErrorStatus, Result};
use crate::oid::Oid;
use crate::value::{SequenceTag, Value, field};
use crate::varbind::{VarBind, decode_varbind_list, encode_varbind_list};

/// Generic PDU structure for request/response operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pdu {
    /// PDU tag (always one of the PDU kinds of [`SequenceTag`])
    pub kind: SequenceTag,
    /// Request ID for correlating requests and responses
    pub request_id: i32,
    /// Error status (0 for requests, error code for responses)
    pub error_status: i32,
    /// Error index (1-based index of problematic varbind)
    pub error_index: i32,
    /// Variable bindings
    pub varbinds: Vec<VarBind>,
}

impl Pdu {
    fn request(kind: SequenceTag, request_id: i32, oids: &[Oid]) -> Self {
        Self {
            kind,
            request_id,
            error_status: 0,
            error_index: 0,
            varbinds: oids.iter().map(|oid| VarBind::null(oid.clone())).collect(),
        }
    }

    /// Create a new GET request PDU.
    pub fn get_request(request_id: i32, oids: &[Oid]) -> Self {
        Self::request(SequenceTag::GetRequest, request_id, oids)
    }

    /// Create a new GETNEXT request PDU.
    pub fn get_next_request(request_id: i32, oids: &[Oid]) -> Self {
        Self::request(SequenceTag::GetNextRequest, request_id, oids)
    }

    /// Create a GETBULK request PDU.
    ///
    /// Note: For GETBULK, error_status holds non_repeaters and error_index holds max_repetitions.
    pub fn get_bulk(
        request_id: i32,
        non_repeaters: i32,
        max_repetitions: i32,
        oids: &[Oid],
    ) -> Self {
        Self {
            error_status: non_repeaters,
            error_index: max_repetitions,
            ..Self::request(SequenceTag::GetBulkRequest, request_id, oids)
        }
    }

    /// The PDU as a tagged sequence value, ready to nest in an envelope.
    pub fn to_value(&self) -> Value {
        Value::sequence(
            self.kind,
            [
                Value::Integer(i64::from(self.request_id)),
                Value::Integer(i64::from(self.error_status)),
                Value::Integer(i64::from(self.error_index)),
                encode_varbind_list(&self.varbinds),
            ],
        )
    }

    /// Read a PDU from its decoded item list (tag first).
    pub fn from_values(items: &[Value]) -> Result<Self> {
        let kind = match items.first() {
            Some(Value::Tag(tag)) if tag.is_pdu() => *tag,
            Some(Value::Tag(tag)) => {
                return Err(Error::decode(
                    0,
                    DecodeErrorKind::UnexpectedPdu { tag: tag.as_byte() },
                ));
            }
            _ => {
                return Err(Error::decode(
                    0,
                    DecodeErrorKind::MissingField { field: "pdu tag" },
                ));
            }
        };
        Ok(Self {
            kind,
            request_id: field::int32(items, 1, "request-id")?,
            error_status: field::int32(items, 2, "error-status")?,
            error_index: field::int32(items, 3, "error-index")?,
            varbinds: decode_varbind_list(field::sequence(items, 4, "variable-bindings")?)?,
        })
    }

    /// Check if this is an error response.
    pub fn is_error(&self) -> bool {
        self.error_status != 0
    }

    /// Turn a non-zero error status into [`Error::Snmp`].
    pub fn check_status(&self, target: SocketAddr) -> Result<()> {
        if !self.is_error() {
            return Ok(());
        }
        Err(Error::Snmp {
            target: Some(target),
            status: ErrorStatus::from_i32(self.error_status),
            index: self.error_index.max(0) as u32,
        })
    }
}
