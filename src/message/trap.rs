//! Notification parsing (SNMPv2-Trap and InformRequest).

use std::time::Duration;

use bytes::Bytes;

use super::CommunityMessage;
use crate::ber::decode_sequence;
use crate::error::{DecodeErrorKind, Error, ErrorStatus, Result};
use crate::oid::Oid;
use crate::value::{SequenceTag, Value};
use crate::varbind::VarBind;
use crate::version::Version;

/// sysUpTime.0, the first varbind of a v2 notification.
fn sys_uptime() -> Oid {
    crate::oid!(1, 3, 6, 1, 2, 1, 1, 3, 0)
}

/// snmpTrapOID.0, the second varbind of a v2 notification.
fn snmp_trap_oid() -> Oid {
    crate::oid!(1, 3, 6, 1, 6, 3, 1, 1, 4, 1, 0)
}

/// A received notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trap {
    pub version: Version,
    pub community: Bytes,
    /// `TrapV2` or `InformRequest`
    pub kind: SequenceTag,
    pub request_id: i32,
    /// Decoded error-status field; zero for a well-formed notification.
    pub error_status: i32,
    pub error_index: i32,
    pub varbinds: Vec<VarBind>,
}

impl Trap {
    /// The error-status field as an [`ErrorStatus`].
    pub fn status(&self) -> ErrorStatus {
        ErrorStatus::from_i32(self.error_status)
    }

    /// Agent uptime from the sysUpTime.0 binding, if present.
    pub fn uptime(&self) -> Option<Duration> {
        self.find(&sys_uptime()).and_then(Value::as_duration)
    }

    /// Notification identity from the snmpTrapOID.0 binding, if present.
    pub fn trap_oid(&self) -> Option<&Oid> {
        self.find(&snmp_trap_oid()).and_then(Value::as_oid)
    }

    /// Whether the sender expects an acknowledgement.
    pub fn is_inform(&self) -> bool {
        self.kind == SequenceTag::InformRequest
    }

    fn find(&self, oid: &Oid) -> Option<&Value> {
        self.varbinds
            .iter()
            .find(|vb| &vb.oid == oid)
            .map(|vb| &vb.value)
    }
}

/// Decode a v1/v2c datagram carrying an SNMPv2-Trap or InformRequest PDU.
///
/// Nothing is sent; inform acknowledgement is up to the caller. SNMPv1
/// Trap-PDUs (which have a different body layout) are rejected with
/// [`DecodeErrorKind::UnexpectedPdu`].
pub fn parse_trap(data: &[u8]) -> Result<Trap> {
    let items = decode_sequence(data)?;
    if let Some(Value::Sequence(pdu)) = items.get(3)
        && let Some(Value::Tag(tag)) = pdu.first()
        && !matches!(tag, SequenceTag::TrapV2 | SequenceTag::InformRequest)
    {
        tracing::debug!(target: "snmp_session::ber", { pdu = %tag }, "not a notification PDU");
        return Err(Error::decode(
            0,
            DecodeErrorKind::UnexpectedPdu { tag: tag.as_byte() },
        ));
    }

    let msg = CommunityMessage::from_values(&items)?;
    Ok(Trap {
        version: msg.version,
        community: msg.community,
        kind: msg.pdu.kind,
        request_id: msg.pdu.request_id,
        error_status: msg.pdu.error_status,
        error_index: msg.pdu.error_index,
        varbinds: msg.pdu.varbinds,
    })
}
