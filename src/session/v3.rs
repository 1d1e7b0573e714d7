//! SNMPv3 USM side of a session: discovery, keys and the authenticated exchange.

use bytes::Bytes;
use zeroize::Zeroizing;

use super::{Session, check_response, matching_reply};
use crate::error::{DecodeErrorKind, EncodeErrorKind, Error, Result};
use crate::message::{MsgGlobalData, ScopedPdu, ScopedPduData, V3Message};
use crate::oid::Oid;
use crate::pdu::Pdu;
use crate::transport::{Transport, poll};
use crate::v3::auth::MAC_LEN;
use crate::v3::{
    AuthProtocol, EngineState, LocalizedKey, PrivKey, PrivProtocol, SaltCounter,
    UsmSecurityParams, authenticate_message, flags, verify_message,
};
use crate::value::{SequenceTag, Value};
use crate::varbind::VarBind;

/// Lifecycle of a session.
///
/// Community sessions need no discovery and are always `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// SNMPv3 session that has not learned the agent's engine yet
    Uninitialized,
    /// Engine ID, boots and time known; keys localized
    Discovered,
    /// At least one authenticated exchange completed
    Active,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Discovered => write!(f, "discovered"),
            Self::Active => write!(f, "active"),
        }
    }
}

/// USM user credentials. Passwords are zeroed on drop.
#[derive(Clone)]
pub struct V3Credentials {
    pub user: Bytes,
    pub auth_protocol: AuthProtocol,
    pub auth_password: Zeroizing<Vec<u8>>,
    /// Privacy protocol and password; `None` for authNoPriv
    pub privacy: Option<(PrivProtocol, Zeroizing<Vec<u8>>)>,
}

impl std::fmt::Debug for V3Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("V3Credentials")
            .field("user", &String::from_utf8_lossy(&self.user))
            .field("auth_protocol", &self.auth_protocol)
            .field("auth_password", &"[REDACTED]")
            .field("privacy", &self.privacy.as_ref().map(|(protocol, _)| protocol))
            .finish()
    }
}

/// Keys and engine values learned by discovery.
struct UsmKeys {
    engine: EngineState,
    auth_key: LocalizedKey,
    priv_key: Option<PrivKey>,
    salts: SaltCounter,
}

pub(crate) struct UsmState {
    credentials: V3Credentials,
    keys: Option<UsmKeys>,
    state: SessionState,
}

impl UsmState {
    pub(crate) fn new(credentials: V3Credentials) -> Self {
        Self {
            credentials,
            keys: None,
            state: SessionState::Uninitialized,
        }
    }
}

impl<T: Transport> Session<T> {
    /// Where this session is in its lifecycle.
    pub fn state(&self) -> SessionState {
        self.usm
            .as_ref()
            .map_or(SessionState::Active, |usm| usm.state)
    }

    /// The agent's engine values, once discovered.
    pub fn engine(&self) -> Option<&EngineState> {
        self.usm
            .as_ref()
            .and_then(|usm| usm.keys.as_ref())
            .map(|keys| &keys.engine)
    }

    /// Learn the agent's engine ID, boots and time, and localize the keys.
    ///
    /// Sends an unauthenticated, reportable probe with empty security
    /// parameters; the agent's Report carries its engine values. Discovering
    /// again replaces the keys.
    pub async fn discover(&mut self) -> Result<()> {
        if self.usm.is_none() {
            return Err(Error::encode(EncodeErrorKind::NotV3Session));
        }
        let target = self.peer_addr();
        let msg_id = self.next_id();
        let request_id = self.next_id();
        let request = V3Message::discovery_request(msg_id, request_id).encode()?;

        tracing::debug!(target: "snmp_session::v3", { snmp.peer = %target, snmp.msg_id = msg_id }, "sending discovery probe");
        let len = poll(
            &self.transport,
            &request,
            &mut self.buf,
            self.config.retries,
            self.config.timeout,
            matching_reply(msg_id),
        )
        .await?;
        let reply = V3Message::decode(&self.buf[..len])?;
        if reply.global_data.msg_id != msg_id {
            return Err(Error::RequestIdMismatch {
                expected: msg_id,
                actual: reply.global_data.msg_id,
            });
        }

        let engine = EngineState::from_usm(&reply.security_params);
        if engine.engine_id.is_empty() {
            return Err(Error::decode(
                0,
                DecodeErrorKind::MissingField {
                    field: "msgAuthoritativeEngineID",
                },
            ));
        }

        let salts = SaltCounter::from_rng(&mut self.rng);
        let Some(usm) = self.usm.as_mut() else {
            return Err(Error::encode(EncodeErrorKind::NotV3Session));
        };
        let creds = &usm.credentials;
        let auth_key =
            LocalizedKey::from_password(creds.auth_protocol, &creds.auth_password, &engine.engine_id);
        let priv_key = creds.privacy.as_ref().map(|(protocol, password)| {
            PrivKey::from_password(creds.auth_protocol, *protocol, password, &engine.engine_id)
        });

        tracing::debug!(
            target: "snmp_session::v3",
            {
                snmp.peer = %target,
                snmp.engine_id = %crate::util::hex::encode(&engine.engine_id),
                snmp.engine_boots = engine.engine_boots,
                snmp.engine_time = engine.engine_time,
            },
            "engine discovered"
        );
        usm.keys = Some(UsmKeys {
            engine,
            auth_key,
            priv_key,
            salts,
        });
        usm.state = SessionState::Discovered;
        Ok(())
    }

    /// Authenticated GET. The session must be SNMPv3 and discovered.
    pub async fn get_v3(&mut self, oid: &Oid) -> Result<Value> {
        self.require_discovered()?;
        self.get(oid).await
    }

    /// Authenticated GETNEXT. The session must be SNMPv3 and discovered.
    pub async fn get_next_v3(&mut self, oid: &Oid) -> Result<VarBind> {
        self.require_discovered()?;
        self.get_next(oid).await
    }

    fn require_discovered(&self) -> Result<()> {
        match &self.usm {
            None => Err(Error::encode(EncodeErrorKind::NotV3Session)),
            Some(usm) if usm.keys.is_none() => {
                Err(Error::encode(EncodeErrorKind::EngineNotDiscovered))
            }
            Some(_) => Ok(()),
        }
    }

    /// One authenticated (and, with privacy, encrypted) request/response.
    pub(super) async fn v3_exchange(&mut self, pdu: Pdu) -> Result<Pdu> {
        let target = self.peer_addr();
        let msg_id = self.next_id();
        let request_id = pdu.request_id;

        let Some(usm) = self.usm.as_mut() else {
            return Err(Error::encode(EncodeErrorKind::NotV3Session));
        };
        let Some(keys) = usm.keys.as_mut() else {
            return Err(Error::encode(EncodeErrorKind::EngineNotDiscovered));
        };

        let engine = &keys.engine;
        let scoped = ScopedPdu::new(engine.engine_id.clone(), pdu);
        let mut params = UsmSecurityParams::new(
            engine.engine_id.clone(),
            engine.engine_boots,
            engine.engine_time,
            usm.credentials.user.clone(),
        )
        .with_auth_params(vec![0u8; MAC_LEN]);

        let (msg_flags, data) = match &keys.priv_key {
            Some(priv_key) => {
                let salt = keys.salts.next(priv_key.protocol());
                let (ciphertext, priv_params) = priv_key
                    .encrypt(
                        &scoped.encode()?,
                        engine.engine_boots,
                        engine.engine_time,
                        salt,
                    )
                    .map_err(|e| e.with_target(target))?;
                params = params.with_priv_params(priv_params);
                (
                    flags::AUTH | flags::PRIV | flags::REPORTABLE,
                    ScopedPduData::Encrypted(ciphertext),
                )
            }
            None => (
                flags::AUTH | flags::REPORTABLE,
                ScopedPduData::Plaintext(scoped),
            ),
        };

        let mut request = V3Message::new(MsgGlobalData::new(msg_id, msg_flags), params, data)
            .encode()?
            .to_vec();
        authenticate_message(&keys.auth_key, &mut request)?;

        let len = poll(
            &self.transport,
            &request,
            &mut self.buf,
            self.config.retries,
            self.config.timeout,
            matching_reply(msg_id),
        )
        .await?;
        let raw = &self.buf[..len];
        let reply = V3Message::decode(raw)?;
        if reply.global_data.msg_id != msg_id {
            return Err(Error::RequestIdMismatch {
                expected: msg_id,
                actual: reply.global_data.msg_id,
            });
        }

        let usm_params = &reply.security_params;
        if usm_params.auth_params.is_empty() {
            tracing::debug!(target: "snmp_session::v3", { snmp.peer = %target }, "reply carries no authentication parameters");
            return Err(Error::UnprotectedResponse {
                target: Some(target),
            });
        }
        verify_message(&keys.auth_key, raw).map_err(|e| e.with_target(target))?;
        keys.engine.refresh(usm_params);

        let scoped = match reply.data {
            ScopedPduData::Encrypted(ciphertext) => {
                let Some(priv_key) = &keys.priv_key else {
                    return Err(Error::decode(
                        0,
                        DecodeErrorKind::UnexpectedType { field: "msgData" },
                    ));
                };
                if usm_params.priv_params.is_empty() {
                    return Err(Error::UnprotectedResponse {
                        target: Some(target),
                    });
                }
                let plaintext = priv_key
                    .decrypt(
                        &ciphertext,
                        usm_params.engine_boots,
                        usm_params.engine_time,
                        &usm_params.priv_params,
                    )
                    .map_err(|e| e.with_target(target))?;
                ScopedPdu::decode(&plaintext)?
            }
            // Agents send some reports in plaintext even to privacy users.
            ScopedPduData::Plaintext(scoped)
                if keys.priv_key.is_some() && scoped.pdu.kind != SequenceTag::Report =>
            {
                return Err(Error::UnprotectedResponse {
                    target: Some(target),
                });
            }
            ScopedPduData::Plaintext(scoped) => scoped,
        };

        let pdu = check_response(scoped.pdu, request_id, target)?;
        usm.state = SessionState::Active;
        Ok(pdu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;
    use crate::session::tests::peer;
    use crate::transport::MockTransport;
    use crate::v3::report_oids;

    const ENGINE_ID: &[u8] = b"\x80\x00\x1f\x88\x04test-engine";

    fn v3_session(mock: &MockTransport) -> Session<MockTransport> {
        Session::usm("192.0.2.1", "operator")
            .auth(AuthProtocol::Sha1, "authpass123")
            .seed(11)
            .retries(0)
            .build(mock.clone())
            .unwrap()
    }

    /// The agent's answer to a discovery probe.
    fn discovery_reply(request: &[u8]) -> Bytes {
        let probe = V3Message::decode(request).unwrap();
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
        V3Message::new(
            MsgGlobalData::new(probe.global_data.msg_id, 0),
            UsmSecurityParams::new(ENGINE_ID, 3, 1200, Bytes::new()),
            ScopedPduData::Plaintext(ScopedPdu::new(ENGINE_ID, report)),
        )
        .encode()
        .unwrap()
    }

    /// Authenticated plaintext answer echoing the request's bindings.
    fn auth_reply(request: &[u8], key: &LocalizedKey) -> Bytes {
        let msg = V3Message::decode(request).unwrap();
        let ScopedPduData::Plaintext(scoped) = msg.data else {
            panic!("expected plaintext request");
        };
        let mut pdu = scoped.pdu;
        pdu.kind = SequenceTag::Response;
        for vb in &mut pdu.varbinds {
            vb.value = Value::from("router-7");
        }
        let mut reply = V3Message::new(
            MsgGlobalData::new(msg.global_data.msg_id, flags::AUTH),
            UsmSecurityParams::new(ENGINE_ID, 3, 1260, &b"operator"[..])
                .with_auth_params(vec![0u8; MAC_LEN]),
            ScopedPduData::Plaintext(ScopedPdu::new(ENGINE_ID, pdu)),
        )
        .encode()
        .unwrap()
        .to_vec();
        authenticate_message(key, &mut reply).unwrap();
        reply.into()
    }

    #[tokio::test]
    async fn discover_learns_engine() {
        let mock = MockTransport::new(peer());
        mock.queue_handler(discovery_reply);
        let mut session = v3_session(&mock);
        assert_eq!(session.state(), SessionState::Uninitialized);

        session.discover().await.unwrap();
        assert_eq!(session.state(), SessionState::Discovered);
        let engine = session.engine().unwrap();
        assert_eq!(&engine.engine_id[..], ENGINE_ID);
        assert_eq!((engine.engine_boots, engine.engine_time), (3, 1200));

        let probe = V3Message::decode(&mock.requests()[0]).unwrap();
        assert_eq!(probe.global_data.msg_flags, flags::REPORTABLE);
        assert!(probe.security_params.engine_id.is_empty());
    }

    #[tokio::test]
    async fn discover_rejects_empty_engine_id() {
        let mock = MockTransport::new(peer());
        mock.queue_handler(|request| {
            let probe = V3Message::decode(request).unwrap();
            V3Message::discovery_request(probe.global_data.msg_id, 1)
                .encode()
                .unwrap()
        });
        let mut session = v3_session(&mock);
        let err = session.discover().await.unwrap_err();
        assert!(matches!(
            err,
            Error::Decode {
                kind: DecodeErrorKind::MissingField { .. },
                ..
            }
        ));
        assert_eq!(session.state(), SessionState::Uninitialized);
    }

    #[tokio::test]
    async fn requests_before_discovery_fail() {
        let mock = MockTransport::new(peer());
        let mut session = v3_session(&mock);
        let err = session.get_v3(&oid!(1, 3, 6, 1, 2, 1, 1, 5, 0)).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Encode {
                kind: EncodeErrorKind::EngineNotDiscovered
            }
        ));
        let err = session.get(&oid!(1, 3, 6, 1, 2, 1, 1, 5, 0)).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Encode {
                kind: EncodeErrorKind::EngineNotDiscovered
            }
        ));
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn v3_calls_rejected_on_community_session() {
        let mock = MockTransport::new(peer());
        let mut session = crate::session::tests::session(&mock, crate::Version::V2c);
        assert_eq!(session.state(), SessionState::Active);
        for err in [
            session.discover().await.unwrap_err(),
            session.get_v3(&oid!(1, 3, 6, 1)).await.unwrap_err(),
            session.get_next_v3(&oid!(1, 3, 6, 1)).await.unwrap_err(),
        ] {
            assert!(matches!(
                err,
                Error::Encode {
                    kind: EncodeErrorKind::NotV3Session
                }
            ));
        }
    }

    #[tokio::test]
    async fn authenticated_get_round_trip() {
        let mock = MockTransport::new(peer());
        let key = LocalizedKey::from_password(AuthProtocol::Sha1, b"authpass123", ENGINE_ID);
        mock.queue_handler(discovery_reply);
        mock.queue_handler(move |request| auth_reply(request, &key));

        let mut session = v3_session(&mock);
        session.discover().await.unwrap();
        let name = session.get_v3(&oid!(1, 3, 6, 1, 2, 1, 1, 5, 0)).await.unwrap();
        assert_eq!(name.as_str(), Some("router-7"));
        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(session.engine().unwrap().engine_time, 1260);

        let sent = V3Message::decode(&mock.requests()[1]).unwrap();
        assert_eq!(sent.global_data.msg_flags, flags::AUTH | flags::REPORTABLE);
        assert_eq!(&sent.security_params.username[..], b"operator");
        assert_eq!(sent.security_params.auth_params.len(), MAC_LEN);
    }

    #[tokio::test]
    async fn wrong_key_fails_authentication() {
        let mock = MockTransport::new(peer());
        let key = LocalizedKey::from_password(AuthProtocol::Sha1, b"not-the-password", ENGINE_ID);
        mock.queue_handler(discovery_reply);
        mock.queue_handler(move |request| auth_reply(request, &key));

        let mut session = v3_session(&mock);
        session.discover().await.unwrap();
        let err = session.get_v3(&oid!(1, 3, 6, 1, 2, 1, 1, 5, 0)).await.unwrap_err();
        assert!(matches!(err, Error::AuthenticationFailed { .. }));
        assert_eq!(err.target(), Some(peer()));
        assert_eq!(session.state(), SessionState::Discovered);
    }

    #[tokio::test]
    async fn unauthenticated_reply_is_rejected() {
        let mock = MockTransport::new(peer());
        mock.queue_handler(discovery_reply);
        mock.queue_handler(|request| {
            let msg = V3Message::decode(request).unwrap();
            let ScopedPduData::Plaintext(mut scoped) = msg.data else {
                panic!("expected plaintext request");
            };
            scoped.pdu.kind = SequenceTag::Response;
            V3Message::new(
                MsgGlobalData::new(msg.global_data.msg_id, 0),
                UsmSecurityParams::new(ENGINE_ID, 3, 1260, &b"operator"[..]),
                ScopedPduData::Plaintext(scoped),
            )
            .encode()
            .unwrap()
        });

        let mut session = v3_session(&mock);
        session.discover().await.unwrap();
        let err = session.get_v3(&oid!(1, 3, 6, 1, 2, 1, 1, 5, 0)).await.unwrap_err();
        assert!(matches!(err, Error::UnprotectedResponse { .. }));
    }

    #[test]
    fn credentials_debug_is_redacted() {
        let creds = V3Credentials {
            user: Bytes::from_static(b"operator"),
            auth_protocol: AuthProtocol::Md5,
            auth_password: Zeroizing::new(b"secret-auth".to_vec()),
            privacy: Some((PrivProtocol::Des, Zeroizing::new(b"secret-priv".to_vec()))),
        };
        let debug = format!("{creds:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("operator"));
        assert!(debug.contains("Des"));
    }
}
