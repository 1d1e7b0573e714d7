//! Command-line arguments shared by the CLI tools.

use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::time::Duration;

use crate::Version;
use crate::v3::{AuthProtocol, PrivProtocol};

/// SNMP version for CLI argument parsing.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum SnmpVersion {
    /// SNMPv1
    #[value(name = "1")]
    V1,
    /// SNMPv2c (default)
    #[default]
    #[value(name = "2c")]
    V2c,
}

impl From<SnmpVersion> for Version {
    fn from(v: SnmpVersion) -> Self {
        match v {
            SnmpVersion::V1 => Version::V1,
            SnmpVersion::V2c => Version::V2c,
        }
    }
}

/// Output format for CLI tools.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output with type information.
    #[default]
    Human,
    /// JSON output for scripting.
    Json,
    /// Tab-separated OID and value.
    Raw,
}

/// Target and community-session arguments.
#[derive(Debug, Parser)]
pub struct CommonArgs {
    /// Target host or host:port (default port 161).
    #[arg(value_name = "TARGET")]
    pub target: String,

    /// SNMP version for community sessions: 1 or 2c. A username selects SNMPv3.
    #[arg(short = 'v', long = "snmp-version", default_value = "2c")]
    pub snmp_version: SnmpVersion,

    /// Community string (v1/v2c).
    #[arg(short = 'c', long = "community", default_value = "public")]
    pub community: String,

    /// Per-attempt timeout in seconds.
    #[arg(short = 't', long = "timeout", default_value = "5")]
    pub timeout: f64,

    /// Retry count.
    #[arg(short = 'r', long = "retries", default_value = "3")]
    pub retries: u32,
}

impl CommonArgs {
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs_f64(self.timeout.max(0.0))
    }
}

/// SNMPv3 USM arguments.
#[derive(Debug, Parser)]
pub struct V3Args {
    /// Security name (selects SNMPv3).
    #[arg(short = 'u', long = "username")]
    pub username: Option<String>,

    /// Authentication protocol: MD5 or SHA.
    #[arg(short = 'a', long = "auth-protocol")]
    pub auth_protocol: Option<AuthProtocol>,

    /// Authentication passphrase.
    #[arg(short = 'A', long = "auth-password")]
    pub auth_password: Option<String>,

    /// Privacy protocol: DES or AES.
    #[arg(short = 'x', long = "priv-protocol")]
    pub priv_protocol: Option<PrivProtocol>,

    /// Privacy passphrase.
    #[arg(short = 'X', long = "priv-password")]
    pub priv_password: Option<String>,
}

impl V3Args {
    pub fn is_v3(&self) -> bool {
        self.username.is_some()
    }

    /// Check the USM options fit together.
    pub fn validate(&self) -> Result<(), String> {
        if self.username.is_none() {
            if self.auth_protocol.is_some() || self.priv_protocol.is_some() {
                return Err("a username (-u) is required for SNMPv3 options".into());
            }
            return Ok(());
        }
        if self.auth_protocol.is_none() {
            return Err("SNMPv3 requires an authentication protocol (-a)".into());
        }
        if self.auth_password.is_none() {
            return Err("authentication password (-A) required when using auth protocol".into());
        }
        if self.priv_protocol.is_some() && self.priv_password.is_none() {
            return Err("privacy password (-X) required when using priv protocol".into());
        }
        Ok(())
    }
}

/// Output control arguments.
#[derive(Debug, Parser)]
pub struct OutputArgs {
    /// Output format: human, json, or raw.
    #[arg(short = 'O', long = "output", default_value = "human")]
    pub format: OutputFormat,

    /// Always display OctetString as hex.
    #[arg(long = "hex")]
    pub hex: bool,

    /// Show request timing.
    #[arg(long = "timing")]
    pub timing: bool,

    /// Disable well-known OID name hints.
    #[arg(long = "no-hints")]
    pub no_hints: bool,

    /// Enable debug logging (snmp_session=debug).
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,

    /// Enable trace logging (snmp_session=trace).
    #[arg(short = 'D', long = "trace")]
    pub trace: bool,
}

impl OutputArgs {
    /// Install a stderr subscriber. `RUST_LOG` overrides the flags.
    pub fn init_tracing(&self) {
        use tracing_subscriber::EnvFilter;

        let default = if self.trace {
            "snmp_session=trace"
        } else if self.debug {
            "snmp_session=debug"
        } else {
            "snmp_session=warn"
        };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }
}

/// Table walk arguments.
#[derive(Debug, Parser)]
pub struct TableArgs {
    /// GETBULK max-repetitions.
    #[arg(long = "max-rep", default_value = "50")]
    pub max_repetitions: u32,
}

/// Trap listener arguments.
#[derive(Debug, Parser)]
pub struct ListenArgs {
    /// Address to listen on.
    #[arg(short = 'l', long = "listen", default_value = "0.0.0.0:162")]
    pub listen: SocketAddr,

    /// Socket receive buffer size in bytes.
    #[arg(long = "recv-buffer", default_value = "65535")]
    pub recv_buffer_size: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Parser)]
    struct TestArgs {
        #[command(flatten)]
        common: CommonArgs,
        #[command(flatten)]
        v3: V3Args,
    }

    #[test]
    fn parses_v3_options() {
        let args = TestArgs::parse_from([
            "test", "192.0.2.1", "-u", "operator", "-a", "sha", "-A", "authpass", "-x", "aes",
            "-X", "privpass",
        ]);
        assert!(args.v3.is_v3());
        assert_eq!(args.v3.auth_protocol, Some(AuthProtocol::Sha1));
        assert_eq!(args.v3.priv_protocol, Some(PrivProtocol::Aes128));
        assert!(args.v3.validate().is_ok());
        assert_eq!(args.common.timeout_duration(), Duration::from_secs(5));
    }

    #[test]
    fn v3_without_auth_is_rejected() {
        let args = TestArgs::parse_from(["test", "192.0.2.1", "-u", "operator"]);
        assert!(args.v3.validate().is_err());
    }

    #[test]
    fn priv_without_password_is_rejected() {
        let args = TestArgs::parse_from([
            "test", "192.0.2.1", "-u", "operator", "-a", "md5", "-A", "authpass", "-x", "des",
        ]);
        assert!(args.v3.validate().is_err());
    }
}
