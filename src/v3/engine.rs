//! Authoritative engine state and report handling (RFC 3414 Section 4).
//!
//! A v3 session must know the agent's engine ID, boots counter and time
//! before it can send authenticated messages. Discovery sends an
//! unauthenticated probe; the agent answers with a Report PDU whose USM
//! parameters carry those three values.

use std::net::SocketAddr;

use bytes::Bytes;

use super::UsmSecurityParams;
use crate::error::Error;
use crate::varbind::VarBind;

/// Default msgMaxSize for UDP transport (65535 - 20 IPv4 - 8 UDP = 65507).
pub const DEFAULT_MSG_MAX_SIZE: u32 = 65507;

/// USM statistics OIDs used in Report PDUs.
pub mod report_oids {
    use crate::oid::Oid;

    /// 1.3.6.1.6.3.15.1.1.2.0 - usmStatsNotInTimeWindows
    pub fn not_in_time_windows() -> Oid {
        crate::oid!(1, 3, 6, 1, 6, 3, 15, 1, 1, 2, 0)
    }

    /// 1.3.6.1.6.3.15.1.1.4.0 - usmStatsUnknownEngineIDs
    pub fn unknown_engine_ids() -> Oid {
        crate::oid!(1, 3, 6, 1, 6, 3, 15, 1, 1, 4, 0)
    }
}

/// Discovered engine state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineState {
    /// Authoritative engine ID
    pub engine_id: Bytes,
    /// Engine boot count
    pub engine_boots: u32,
    /// Engine time at last exchange
    pub engine_time: u32,
}

impl EngineState {
    pub fn new(engine_id: Bytes, engine_boots: u32, engine_time: u32) -> Self {
        Self {
            engine_id,
            engine_boots,
            engine_time,
        }
    }

    /// Read the engine values out of a reply's USM parameters.
    pub fn from_usm(params: &UsmSecurityParams) -> Self {
        Self::new(
            params.engine_id.clone(),
            params.engine_boots,
            params.engine_time,
        )
    }

    /// Adopt the boots and time of an authenticated reply.
    pub fn refresh(&mut self, params: &UsmSecurityParams) {
        if params.engine_boots != self.engine_boots || params.engine_time < self.engine_time {
            tracing::debug!(
                target: "snmp_session::v3",
                {
                    snmp.engine_boots = params.engine_boots,
                    snmp.engine_time = params.engine_time,
                    snmp.previous_boots = self.engine_boots,
                },
                "engine clock moved"
            );
        }
        self.engine_boots = params.engine_boots;
        self.engine_time = params.engine_time;
    }
}

/// Map a Report PDU's first varbind to an error.
pub fn report_error(varbinds: &[VarBind], target: SocketAddr) -> Error {
    let Some(first) = varbinds.first() else {
        return Error::Report {
            target: Some(target),
            oid: crate::oid::Oid::empty(),
        };
    };
    if first.oid == report_oids::unknown_engine_ids() {
        Error::UnknownEngineId {
            target: Some(target),
        }
    } else if first.oid == report_oids::not_in_time_windows() {
        Error::NotInTimeWindow {
            target: Some(target),
        }
    } else {
        Error::Report {
            target: Some(target),
            oid: first.oid.clone(),
        }
    }
}
