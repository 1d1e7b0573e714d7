//! Support code for the `snmp-table` and `snmp-trapd` tools.
//!
//! Argument parsing, output formatting and OID name hints. Only available
//! with the `cli` feature.

pub mod args;
pub mod hints;
pub mod output;

use crate::session::Session;
use crate::transport::UdpTransport;
use args::{CommonArgs, V3Args};

/// Open a session from command-line arguments.
///
/// With a username the session is SNMPv3 and is discovered before returning.
pub async fn connect(
    common: &CommonArgs,
    v3: &V3Args,
    max_repetitions: u32,
) -> crate::Result<Session<UdpTransport>> {
    let timeout = common.timeout_duration();
    let Some(username) = &v3.username else {
        return Session::community(
            common.target.as_str(),
            common.snmp_version.into(),
            common.community.clone(),
        )
        .timeout(timeout)
        .retries(common.retries)
        .max_repetitions(max_repetitions)
        .connect()
        .await;
    };

    let (Some(auth_protocol), Some(auth_password)) = (v3.auth_protocol, &v3.auth_password) else {
        return Err(crate::Error::Config(
            "SNMPv3 requires an authentication protocol and password".into(),
        ));
    };
    let mut builder = Session::usm(common.target.as_str(), username.clone())
        .auth(auth_protocol, auth_password.as_bytes())
        .timeout(timeout)
        .retries(common.retries)
        .max_repetitions(max_repetitions);
    if let (Some(priv_protocol), Some(priv_password)) = (v3.priv_protocol, &v3.priv_password) {
        builder = builder.privacy(priv_protocol, priv_password.as_bytes());
    }
    let mut session = builder.connect().await?;
    session.discover().await?;
    Ok(session)
}
