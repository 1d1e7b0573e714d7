//! SNMP sessions: one peer, one outstanding request.
//!
//! A [`Session`] owns its transport, its configuration and a seedable random
//! source for request IDs, message IDs and privacy salts. Every request
//! method takes `&mut self`; share a session between tasks behind a
//! `tokio::sync::Mutex`.
//!
//! ```rust,no_run
//! # use snmp_session::{Session, Version, oid};
//! # async fn example() -> snmp_session::Result<()> {
//! let mut session = Session::community("192.0.2.1", Version::V2c, "public")
//!     .connect()
//!     .await?;
//! let uptime = session.get(&oid!(1, 3, 6, 1, 2, 1, 1, 3, 0)).await?;
//! println!("{uptime}");
//! # Ok(())
//! # }
//! ```

mod builder;
mod table;
mod v3;

pub use builder::{CommunityBuilder, UsmAuthBuilder, UsmBuilder};
pub use v3::{SessionState, V3Credentials};

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use rand::Rng;
use rand::rngs::StdRng;

use crate::error::{DecodeErrorKind, EncodeErrorKind, Error, Result};
use crate::message::{CommunityMessage, Trap, reply_id};
use crate::oid::Oid;
use crate::pdu::Pdu;
use crate::transport::{Transport, poll};
use crate::v3::report_error;
use crate::value::{SequenceTag, Value};
use crate::varbind::VarBind;
use crate::version::Version;

use v3::UsmState;

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// SNMP version (default: V2c)
    pub version: Version,
    /// Community string for v1/v2c (default: "public")
    pub community: Bytes,
    /// Per-attempt deadline for the send and for the receive (default: 5s)
    pub timeout: Duration,
    /// Attempts after the first (default: 3)
    pub retries: u32,
    /// GetBulk max-repetitions used by [`Session::get_table`] (default: 50)
    pub max_repetitions: u32,
    /// Receive buffer and socket buffer size in bytes (default: 65535)
    pub recv_buffer_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            version: Version::V2c,
            community: Bytes::from_static(b"public"),
            timeout: Duration::from_secs(5),
            retries: 3,
            max_repetitions: 50,
            recv_buffer_size: 65535,
        }
    }
}

/// SNMP session over a [`Transport`].
pub struct Session<T: Transport> {
    transport: T,
    config: SessionConfig,
    rng: StdRng,
    usm: Option<UsmState>,
    buf: Vec<u8>,
}

impl<T: Transport> Session<T> {
    pub(crate) fn new(
        transport: T,
        config: SessionConfig,
        rng: StdRng,
        usm: Option<UsmState>,
    ) -> Self {
        let buf = vec![0u8; config.recv_buffer_size];
        tracing::debug!(
            target: "snmp_session::session",
            { snmp.peer = %transport.peer_addr(), snmp.version = %config.version },
            "session created"
        );
        Self {
            transport,
            config,
            rng,
            usm,
            buf,
        }
    }

    /// The peer this session talks to.
    pub fn peer_addr(&self) -> SocketAddr {
        self.transport.peer_addr()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Fresh positive request or message ID.
    fn next_id(&mut self) -> i32 {
        self.rng.gen_range(1..i32::MAX)
    }

    /// GET a single OID.
    pub async fn get(&mut self, oid: &Oid) -> Result<Value> {
        let id = self.next_id();
        let pdu = self.request(Pdu::get_request(id, std::slice::from_ref(oid))).await?;
        first_varbind(pdu, self.peer_addr()).map(|vb| vb.value)
    }

    /// GET several OIDs in one request.
    pub async fn get_multiple(&mut self, oids: &[Oid]) -> Result<BTreeMap<Oid, Value>> {
        let id = self.next_id();
        let pdu = self.request(Pdu::get_request(id, oids)).await?;
        Ok(into_map(pdu.varbinds))
    }

    /// GETNEXT: the first binding after `oid`.
    pub async fn get_next(&mut self, oid: &Oid) -> Result<VarBind> {
        let id = self.next_id();
        let pdu = self
            .request(Pdu::get_next_request(id, std::slice::from_ref(oid)))
            .await?;
        first_varbind(pdu, self.peer_addr())
    }

    /// GETBULK with no non-repeaters, keyed by OID.
    pub async fn get_bulk(
        &mut self,
        oid: &Oid,
        max_repetitions: u32,
    ) -> Result<BTreeMap<Oid, Value>> {
        Ok(into_map(self.get_bulk_varbinds(oid, max_repetitions).await?))
    }

    /// GETBULK keeping the agent's order.
    async fn get_bulk_varbinds(&mut self, oid: &Oid, max_repetitions: u32) -> Result<Vec<VarBind>> {
        if self.config.version == Version::V1 {
            return Err(Error::encode(EncodeErrorKind::BulkRequiresV2c));
        }
        let id = self.next_id();
        let max_repetitions = i32::try_from(max_repetitions).unwrap_or(i32::MAX);
        let pdu = self
            .request(Pdu::get_bulk(
                id,
                0,
                max_repetitions,
                std::slice::from_ref(oid),
            ))
            .await?;
        Ok(pdu.varbinds)
    }

    /// Decode a notification datagram. Nothing is sent.
    pub fn parse_trap(&self, data: &[u8]) -> Result<Trap> {
        crate::message::parse_trap(data)
    }

    /// Close the session, releasing the transport.
    pub fn close(self) {
        tracing::debug!(target: "snmp_session::session", { snmp.peer = %self.peer_addr() }, "session closed");
    }

    /// Send a request PDU over the session's envelope and return the validated response.
    async fn request(&mut self, pdu: Pdu) -> Result<Pdu> {
        tracing::debug!(
            target: "snmp_session::session",
            { snmp.pdu_type = %pdu.kind, snmp.request_id = pdu.request_id, snmp.varbind_count = pdu.varbinds.len() },
            "sending {} request", pdu.kind
        );
        let response = if self.usm.is_some() {
            self.v3_exchange(pdu).await?
        } else {
            self.community_exchange(pdu).await?
        };
        tracing::debug!(
            target: "snmp_session::session",
            { snmp.varbind_count = response.varbinds.len() },
            "received response"
        );
        Ok(response)
    }

    async fn community_exchange(&mut self, pdu: Pdu) -> Result<Pdu> {
        let target = self.transport.peer_addr();
        let request_id = pdu.request_id;
        let request =
            CommunityMessage::new(self.config.version, self.config.community.clone(), pdu)
                .encode()?;
        let len = poll(
            &self.transport,
            &request,
            &mut self.buf,
            self.config.retries,
            self.config.timeout,
            matching_reply(request_id),
        )
        .await?;
        let reply = CommunityMessage::decode(&self.buf[..len])?;
        check_response(reply.pdu, request_id, target)
    }
}

/// Reply filter for [`poll`]: drops datagrams answering some other request.
///
/// A datagram whose ID cannot be read is accepted so decoding reports it.
fn matching_reply(expected: i32) -> impl Fn(&[u8]) -> bool + Sync {
    move |data| match reply_id(data) {
        Some(actual) if actual != expected => {
            tracing::debug!(
                target: "snmp_session::session",
                { expected_id = expected, actual_id = actual },
                "dropping stale reply"
            );
            false
        }
        _ => true,
    }
}

/// Validate a response PDU against the request it answers.
fn check_response(pdu: Pdu, request_id: i32, target: SocketAddr) -> Result<Pdu> {
    if pdu.request_id != request_id {
        tracing::warn!(
            target: "snmp_session::session",
            { expected_request_id = request_id, actual_request_id = pdu.request_id, peer = %target },
            "request ID mismatch in response"
        );
        return Err(Error::RequestIdMismatch {
            expected: request_id,
            actual: pdu.request_id,
        });
    }
    match pdu.kind {
        SequenceTag::Response => {
            pdu.check_status(target)?;
            Ok(pdu)
        }
        SequenceTag::Report => Err(report_error(&pdu.varbinds, target)),
        other => Err(Error::decode(
            0,
            DecodeErrorKind::UnexpectedPdu {
                tag: other.as_byte(),
            },
        )),
    }
}

fn first_varbind(pdu: Pdu, target: SocketAddr) -> Result<VarBind> {
    pdu.varbinds.into_iter().next().ok_or_else(|| {
        tracing::debug!(target: "snmp_session::session", { peer = %target }, "empty response");
        Error::decode(
            0,
            DecodeErrorKind::MissingField {
                field: "variable-bindings",
            },
        )
    })
}

fn into_map(varbinds: Vec<VarBind>) -> BTreeMap<Oid, Value> {
    varbinds.into_iter().map(|vb| (vb.oid, vb.value)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorStatus;
    use crate::oid;
    use crate::transport::MockTransport;
    use crate::util::hex;

    pub(super) fn peer() -> SocketAddr {
        "192.0.2.1:161".parse().unwrap()
    }

    pub(super) fn session(mock: &MockTransport, version: Version) -> Session<MockTransport> {
        Session::community("192.0.2.1", version, "public")
            .seed(7)
            .retries(0)
            .build(mock.clone())
            .unwrap()
    }

    pub(super) fn response(varbinds: Vec<VarBind>) -> Bytes {
        let pdu = Pdu {
            kind: SequenceTag::Response,
            request_id: 0,
            error_status: 0,
            error_index: 0,
            varbinds,
        };
        CommunityMessage::new(Version::V2c, &b"public"[..], pdu)
            .encode()
            .unwrap()
    }

    #[tokio::test]
    async fn get_returns_value() {
        let mock = MockTransport::new(peer());
        let uptime = oid!(1, 3, 6, 1, 2, 1, 1, 3, 0);
        mock.queue_response(response(vec![VarBind::new(
            uptime.clone(),
            Value::TimeTicks(76_705_700),
        )]));
        let mut session = session(&mock, Version::V2c);
        let value = session.get(&uptime).await.unwrap();
        assert_eq!(value.as_duration(), Some(Duration::from_millis(767_057_000)));

        let sent = CommunityMessage::decode(&mock.requests()[0]).unwrap();
        assert_eq!(sent.pdu.kind, SequenceTag::GetRequest);
        assert_eq!(sent.pdu.varbinds, vec![VarBind::null(uptime)]);
    }

    #[tokio::test]
    async fn get_multiple_keys_by_oid() {
        let mock = MockTransport::new(peer());
        let descr = oid!(1, 3, 6, 1, 2, 1, 1, 1, 0);
        let name = oid!(1, 3, 6, 1, 2, 1, 1, 5, 0);
        mock.queue_response(response(vec![
            VarBind::new(descr.clone(), Value::from("Linux")),
            VarBind::new(name.clone(), Value::from("core-1")),
        ]));
        let mut session = session(&mock, Version::V2c);
        let values = session
            .get_multiple(&[descr.clone(), name.clone()])
            .await
            .unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values[&name].as_str(), Some("core-1"));
    }

    #[tokio::test]
    async fn get_next_returns_following_binding() {
        let mock = MockTransport::new(peer());
        let next = oid!(1, 3, 6, 1, 2, 1, 1, 1, 0);
        mock.queue_response(response(vec![VarBind::new(next.clone(), Value::from("Linux"))]));
        let mut session = session(&mock, Version::V1);
        let vb = session.get_next(&oid!(1, 3, 6, 1, 2, 1, 1)).await.unwrap();
        assert_eq!(vb.oid, next);

        let sent = CommunityMessage::decode(&mock.requests()[0]).unwrap();
        assert_eq!(sent.version, Version::V1);
        assert_eq!(sent.pdu.kind, SequenceTag::GetNextRequest);
    }

    #[tokio::test]
    async fn get_bulk_sends_repetitions() {
        let mock = MockTransport::new(peer());
        mock.queue_response(response(vec![
            VarBind::new(oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 1, 1), Value::Integer(1)),
            VarBind::new(oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 1, 2), Value::Integer(2)),
        ]));
        let mut session = session(&mock, Version::V2c);
        let values = session
            .get_bulk(&oid!(1, 3, 6, 1, 2, 1, 2, 2), 10)
            .await
            .unwrap();
        assert_eq!(values.len(), 2);

        let sent = CommunityMessage::decode(&mock.requests()[0]).unwrap();
        assert_eq!(sent.pdu.kind, SequenceTag::GetBulkRequest);
        assert_eq!((sent.pdu.error_status, sent.pdu.error_index), (0, 10));
    }

    #[tokio::test]
    async fn get_bulk_rejected_on_v1() {
        let mock = MockTransport::new(peer());
        let mut session = session(&mock, Version::V1);
        let err = session.get_bulk(&oid!(1, 3, 6, 1), 5).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Encode {
                kind: EncodeErrorKind::BulkRequiresV2c
            }
        ));
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn error_status_becomes_snmp_error() {
        let mock = MockTransport::new(peer());
        let pdu = Pdu {
            kind: SequenceTag::Response,
            request_id: 0,
            error_status: 2,
            error_index: 1,
            varbinds: vec![VarBind::null(oid!(1, 3, 6, 1, 2, 1, 1, 9, 0))],
        };
        mock.queue_response(
            CommunityMessage::new(Version::V2c, &b"public"[..], pdu)
                .encode()
                .unwrap(),
        );
        let mut session = session(&mock, Version::V2c);
        let err = session
            .get(&oid!(1, 3, 6, 1, 2, 1, 1, 9, 0))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Snmp {
                status: ErrorStatus::NoSuchName,
                index: 1,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn stale_reply_is_skipped() {
        let mock = MockTransport::new(peer());
        let sys_name = oid!(1, 3, 6, 1, 2, 1, 1, 5, 0);
        // request ID 0 is never generated
        mock.queue_raw_response(response(vec![VarBind::new(
            sys_name.clone(),
            Value::from("stale"),
        )]));
        mock.queue_response(response(vec![VarBind::new(
            sys_name.clone(),
            Value::from("core-1"),
        )]));
        let mut session = session(&mock, Version::V2c);
        let value = session.get(&sys_name).await.unwrap();
        assert_eq!(value.as_str(), Some("core-1"));
        assert_eq!(mock.requests().len(), 1);
    }

    #[tokio::test]
    async fn only_stale_replies_time_out() {
        let mock = MockTransport::new(peer());
        mock.queue_raw_response(response(vec![VarBind::new(
            oid!(1, 3, 6, 1),
            Value::Null,
        )]));
        let mut session = session(&mock, Version::V2c);
        let err = session.get(&oid!(1, 3, 6, 1)).await.unwrap_err();
        assert!(matches!(err, Error::Timeout { retries: 0, .. }));
    }

    #[tokio::test]
    async fn exception_in_response_aborts() {
        let mock = MockTransport::new(peer());
        // GET response carrying noSuchInstance for sysUpTime.1
        let reply = hex::decode(
            "302902010104067075626c6963a21c020400000000020100020100300e300c06082b060102010103018100",
        )
        .unwrap();
        mock.queue_response(reply);
        let mut session = session(&mock, Version::V2c);
        let err = session
            .get(&oid!(1, 3, 6, 1, 2, 1, 1, 3, 1))
            .await
            .unwrap_err();
        assert!(err.is_exception());
    }

    #[tokio::test]
    async fn timeout_after_retries() {
        let mock = MockTransport::new(peer());
        let mut session = Session::community("192.0.2.1", Version::V2c, "public")
            .retries(2)
            .timeout(Duration::from_millis(5))
            .build(mock.clone())
            .unwrap();
        let err = session.get(&oid!(1, 3, 6, 1)).await.unwrap_err();
        assert!(matches!(err, Error::Timeout { retries: 2, .. }));
        assert_eq!(mock.requests().len(), 3);
    }

    #[tokio::test]
    async fn seeded_sessions_repeat_request_ids() {
        let ids = |mock: MockTransport| async move {
            let mut session = session(&mock, Version::V2c);
            let _ = session.get(&oid!(1, 3, 6, 1)).await;
            CommunityMessage::decode(&mock.requests()[0])
                .unwrap()
                .pdu
                .request_id
        };
        let a = ids(MockTransport::new(peer())).await;
        let b = ids(MockTransport::new(peer())).await;
        assert_eq!(a, b);
        assert!(a > 0);
    }

    #[test]
    fn parse_trap_sends_nothing() {
        let mock = MockTransport::new(peer());
        let session = session(&mock, Version::V2c);
        let packet = hex::decode(
            "304302010104067075626c6963a73602047cd94c540201000201003028301006082b0601020101030043043aa3e6303014060a2b06010603010104010006062b0601020100",
        )
        .unwrap();
        let trap = session.parse_trap(&packet).unwrap();
        assert_eq!(trap.error_status, 0);
        assert!(mock.requests().is_empty());
        session.close();
    }
}
