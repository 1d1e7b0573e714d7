//! In-process SNMP agent that answers through the `Transport` trait.
//!
//! `send` hands the request to the agent, which queues its reply; `recv`
//! pops it. Community requests are answered from a fixed MIB. SNMPv3
//! requests go through the USM primitives exported by the crate, so the
//! agent shares no code path with the session beyond the codec.

use std::collections::{BTreeMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use snmp_session::message::{CommunityMessage, MsgGlobalData, ScopedPdu, ScopedPduData, V3Message};
use snmp_session::v3::auth::MAC_LEN;
use snmp_session::v3::{
    LocalizedKey, PrivKey, SaltCounter, UsmSecurityParams, authenticate_message, flags,
    report_oids, verify_message,
};
use snmp_session::{
    AuthProtocol, Error, Oid, Pdu, PrivProtocol, Result, SequenceTag, Transport, Value, VarBind,
};

use super::fixtures::{COMMUNITY, ENGINE_ID, USERNAME, sample_mib};

/// How the agent misbehaves, if at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Fault {
    #[default]
    None,
    /// Flip a byte of every authenticated reply after signing it.
    TamperReply,
    /// Answer v3 requests without authentication or privacy.
    Unprotected,
    /// Answer every GETBULK with the bindings of the first one.
    Stuck,
    /// Send every reply twice.
    DuplicateReply,
}

/// USM user the agent accepts.
#[derive(Clone)]
pub struct AgentUser {
    pub auth_protocol: AuthProtocol,
    pub auth_password: &'static str,
    pub privacy: Option<(PrivProtocol, &'static str)>,
}

struct AgentInner {
    mib: BTreeMap<Oid, Value>,
    user: Option<AgentUser>,
    engine_boots: u32,
    engine_time: u32,
    salts: SaltCounter,
    fault: Fault,
    drop_next: u32,
    stuck: Option<Vec<VarBind>>,
    replies: VecDeque<Bytes>,
    requests: Vec<Bytes>,
}

/// Simulated agent, cloneable so tests can inspect it after handing a copy
/// to a session.
#[derive(Clone)]
pub struct SimulatedAgent {
    addr: SocketAddr,
    inner: Arc<Mutex<AgentInner>>,
}

impl SimulatedAgent {
    /// Community agent serving [`sample_mib`].
    pub fn new() -> Self {
        Self {
            addr: "192.0.2.10:161".parse().unwrap(),
            inner: Arc::new(Mutex::new(AgentInner {
                mib: sample_mib().into_iter().collect(),
                user: None,
                engine_boots: 4,
                engine_time: 86_400,
                salts: SaltCounter::from_value(0x5eed, 0x5eed),
                fault: Fault::None,
                drop_next: 0,
                stuck: None,
                replies: VecDeque::new(),
                requests: Vec::new(),
            })),
        }
    }

    /// Agent that also accepts SNMPv3 requests from `user`.
    pub fn with_user(user: AgentUser) -> Self {
        let agent = Self::new();
        agent.inner.lock().unwrap().user = Some(user);
        agent
    }

    pub fn with_fault(self, fault: Fault) -> Self {
        self.inner.lock().unwrap().fault = fault;
        self
    }

    /// Ignore the next `count` requests.
    pub fn drop_next(&self, count: u32) {
        self.inner.lock().unwrap().drop_next = count;
    }

    pub fn insert(&self, oid: Oid, value: Value) {
        self.inner.lock().unwrap().mib.insert(oid, value);
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<Bytes> {
        self.inner.lock().unwrap().requests.clone()
    }

    pub fn engine_time(&self) -> u32 {
        self.inner.lock().unwrap().engine_time
    }
}

impl Default for SimulatedAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for SimulatedAgent {
    async fn send(&self, data: &[u8]) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.requests.push(Bytes::copy_from_slice(data));
        if inner.drop_next > 0 {
            inner.drop_next -= 1;
            return Ok(());
        }
        if let Some(reply) = inner.handle(data) {
            if inner.fault == Fault::DuplicateReply {
                inner.replies.push_back(reply.clone());
            }
            inner.replies.push_back(reply);
        }
        Ok(())
    }

    async fn recv(&self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        let mut inner = self.inner.lock().unwrap();
        match inner.replies.pop_front() {
            Some(reply) => {
                let len = reply.len().min(buf.len());
                buf[..len].copy_from_slice(&reply[..len]);
                Ok(len)
            }
            None => Err(Error::Timeout {
                target: Some(self.addr),
                elapsed: timeout,
                retries: 0,
            }),
        }
    }

    fn peer_addr(&self) -> SocketAddr {
        self.addr
    }
}

impl AgentInner {
    fn handle(&mut self, data: &[u8]) -> Option<Bytes> {
        if let Ok(msg) = CommunityMessage::decode(data) {
            if &msg.community[..] != COMMUNITY.as_bytes() {
                return None;
            }
            let response = self.respond(&msg.pdu);
            return CommunityMessage::new(msg.version, msg.community, response)
                .encode()
                .ok();
        }
        let msg = V3Message::decode(data).ok()?;
        self.handle_v3(data, msg)
    }

    /// Answer a request PDU from the MIB.
    fn respond(&mut self, request: &Pdu) -> Pdu {
        let varbinds = match request.kind {
            SequenceTag::GetBulkRequest if self.fault == Fault::Stuck => {
                if self.stuck.is_none() {
                    self.stuck = Some(self.bulk(request));
                }
                self.stuck.clone().unwrap_or_default()
            }
            SequenceTag::GetRequest => request
                .varbinds
                .iter()
                .map(|vb| {
                    let value = self.mib.get(&vb.oid).cloned();
                    VarBind::new(vb.oid.clone(), value.unwrap_or(Value::NoSuchInstance))
                })
                .collect(),
            SequenceTag::GetNextRequest => request
                .varbinds
                .iter()
                .map(|vb| self.next_after(&vb.oid))
                .collect(),
            SequenceTag::GetBulkRequest => self.bulk(request),
            _ => Vec::new(),
        };
        Pdu {
            kind: SequenceTag::Response,
            request_id: request.request_id,
            error_status: 0,
            error_index: 0,
            varbinds,
        }
    }

    /// GETBULK with no non-repeaters, as the session sends it.
    fn bulk(&self, request: &Pdu) -> Vec<VarBind> {
        let max_repetitions = request.error_index.max(0) as usize;
        let mut out = Vec::new();
        for vb in &request.varbinds {
            let mut cursor = vb.oid.clone();
            for _ in 0..max_repetitions {
                let next = self.next_after(&cursor);
                let end = next.value == Value::EndOfMibView;
                cursor = next.oid.clone();
                out.push(next);
                if end {
                    break;
                }
            }
        }
        out
    }

    fn next_after(&self, oid: &Oid) -> VarBind {
        use std::ops::Bound::{Excluded, Unbounded};
        match self.mib.range((Excluded(oid.clone()), Unbounded)).next() {
            Some((next, value)) => VarBind::new(next.clone(), value.clone()),
            None => VarBind::new(oid.clone(), Value::EndOfMibView),
        }
    }

    fn handle_v3(&mut self, raw: &[u8], msg: V3Message) -> Option<Bytes> {
        let user = self.user.clone()?;
        let msg_id = msg.global_data.msg_id;

        if msg.security_params.engine_id.is_empty() {
            let report = Pdu {
                kind: SequenceTag::Report,
                request_id: 0,
                error_status: 0,
                error_index: 0,
                varbinds: vec![VarBind::new(
                    report_oids::unknown_engine_ids(),
                    Value::Counter(1),
                )],
            };
            return V3Message::new(
                MsgGlobalData::new(msg_id, 0),
                UsmSecurityParams::new(ENGINE_ID, self.engine_boots, self.engine_time, Bytes::new()),
                ScopedPduData::Plaintext(ScopedPdu::new(ENGINE_ID, report)),
            )
            .encode()
            .ok();
        }

        if &msg.security_params.username[..] != USERNAME.as_bytes() {
            return None;
        }
        let auth_key =
            LocalizedKey::from_password(user.auth_protocol, user.auth_password.as_bytes(), ENGINE_ID);
        verify_message(&auth_key, raw).ok()?;
        let priv_key = user.privacy.map(|(protocol, password)| {
            PrivKey::from_password(user.auth_protocol, protocol, password.as_bytes(), ENGINE_ID)
        });

        let request = match (&msg.data, &priv_key) {
            (ScopedPduData::Encrypted(ciphertext), Some(key)) => {
                let plaintext = key
                    .decrypt(
                        ciphertext,
                        msg.security_params.engine_boots,
                        msg.security_params.engine_time,
                        &msg.security_params.priv_params,
                    )
                    .ok()?;
                ScopedPdu::decode(&plaintext).ok()?
            }
            (ScopedPduData::Plaintext(scoped), None) => scoped.clone(),
            _ => return None,
        };

        // The agent's clock moves on between exchanges.
        self.engine_time += 7;
        let response = ScopedPdu::new(ENGINE_ID, self.respond(&request.pdu));

        if self.fault == Fault::Unprotected {
            return V3Message::new(
                MsgGlobalData::new(msg_id, 0),
                UsmSecurityParams::new(ENGINE_ID, self.engine_boots, self.engine_time, USERNAME),
                ScopedPduData::Plaintext(response),
            )
            .encode()
            .ok();
        }

        let mut params =
            UsmSecurityParams::new(ENGINE_ID, self.engine_boots, self.engine_time, USERNAME)
                .with_auth_params(vec![0u8; MAC_LEN]);
        let (msg_flags, data) = match &priv_key {
            Some(key) => {
                let salt = self.salts.next(key.protocol());
                let (ciphertext, priv_params) = key
                    .encrypt(
                        &response.encode().ok()?,
                        self.engine_boots,
                        self.engine_time,
                        salt,
                    )
                    .ok()?;
                params = params.with_priv_params(priv_params);
                (flags::AUTH | flags::PRIV, ScopedPduData::Encrypted(ciphertext))
            }
            None => (flags::AUTH, ScopedPduData::Plaintext(response)),
        };

        let mut reply = V3Message::new(MsgGlobalData::new(msg_id, msg_flags), params, data)
            .encode()
            .ok()?
            .to_vec();
        authenticate_message(&auth_key, &mut reply).ok()?;
        if self.fault == Fault::TamperReply
            && let Some(last) = reply.last_mut()
        {
            *last ^= 0x01;
        }
        Some(reply.into())
    }
}
