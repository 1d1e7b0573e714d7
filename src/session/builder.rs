//! Typestate builders for sessions.
//!
//! A USM session cannot be built without authentication: `.auth()` is what
//! turns a [`UsmBuilder`] into something that can connect, and `.privacy()`
//! only exists after it.
//!
//! ```rust,no_run
//! # use snmp_session::Session;
//! # use snmp_session::v3::{AuthProtocol, PrivProtocol};
//! # async fn example() -> snmp_session::Result<()> {
//! let mut session = Session::usm("192.0.2.1", "operator")
//!     .auth(AuthProtocol::Sha1, "authpass123")
//!     .privacy(PrivProtocol::Aes128, "privpass123")
//!     .connect()
//!     .await?;
//! session.discover().await?;
//! # Ok(())
//! # }
//! ```

use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;

use bytes::Bytes;
use rand::SeedableRng;
use rand::rngs::StdRng;
use zeroize::Zeroizing;

use super::v3::{UsmState, V3Credentials};
use super::{Session, SessionConfig};
use crate::error::{Error, Result};
use crate::transport::{Transport, UdpTransport};
use crate::v3::{AuthProtocol, PrivProtocol};
use crate::version::Version;

/// Agent port used when the target names none.
const DEFAULT_PORT: u16 = 161;

/// Settings shared by every builder.
struct BaseConfig {
    target: String,
    timeout: Duration,
    retries: u32,
    max_repetitions: u32,
    recv_buffer_size: usize,
    seed: Option<u64>,
}

impl BaseConfig {
    fn new(target: impl Into<String>) -> Self {
        let defaults = SessionConfig::default();
        Self {
            target: target.into(),
            timeout: defaults.timeout,
            retries: defaults.retries,
            max_repetitions: defaults.max_repetitions,
            recv_buffer_size: defaults.recv_buffer_size,
            seed: None,
        }
    }

    /// `host:port`, or `host` on the default agent port.
    fn resolve_target(&self) -> Result<SocketAddr> {
        let io = |source| Error::Io {
            target: None,
            source,
        };
        let mut addrs = match self.target.to_socket_addrs() {
            Ok(addrs) => addrs,
            Err(_) => (self.target.as_str(), DEFAULT_PORT)
                .to_socket_addrs()
                .map_err(io)?,
        };
        addrs.next().ok_or_else(|| {
            io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "could not resolve address",
            ))
        })
    }

    fn config(&self, version: Version, community: Bytes) -> SessionConfig {
        SessionConfig {
            version,
            community,
            timeout: self.timeout,
            retries: self.retries,
            max_repetitions: self.max_repetitions,
            recv_buffer_size: self.recv_buffer_size,
        }
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    async fn connect(&self) -> Result<UdpTransport> {
        let addr = self.resolve_target()?;
        UdpTransport::connect(addr, Some(self.recv_buffer_size)).await
    }
}

macro_rules! impl_common_methods {
    ($builder:ty) => {
        impl $builder {
            /// Per-attempt deadline.
            pub fn timeout(mut self, timeout: Duration) -> Self {
                self.base.timeout = timeout;
                self
            }

            /// Attempts after the first.
            pub fn retries(mut self, retries: u32) -> Self {
                self.base.retries = retries;
                self
            }

            /// GETBULK max-repetitions used by table walks.
            pub fn max_repetitions(mut self, max: u32) -> Self {
                self.base.max_repetitions = max;
                self
            }

            /// Receive buffer size; also requested as the socket buffer size.
            pub fn recv_buffer_size(mut self, size: usize) -> Self {
                self.base.recv_buffer_size = size;
                self
            }

            /// Seed request IDs, message IDs and privacy salts for reproducible runs.
            pub fn seed(mut self, seed: u64) -> Self {
                self.base.seed = Some(seed);
                self
            }
        }
    };
}

/// Builder for SNMPv1 and SNMPv2c sessions.
///
/// Created via [`Session::community()`].
pub struct CommunityBuilder {
    base: BaseConfig,
    version: Version,
    community: Bytes,
}

impl CommunityBuilder {
    /// Connect a UDP socket to the target and create the session.
    pub async fn connect(self) -> Result<Session<UdpTransport>> {
        let transport = self.base.connect().await?;
        self.build(transport)
    }

    /// Create the session over a caller-supplied transport.
    pub fn build<T: Transport>(self, transport: T) -> Result<Session<T>> {
        if !self.version.is_community() {
            return Err(Error::Config(
                "community sessions support SNMPv1 and SNMPv2c only; use Session::usm for SNMPv3"
                    .into(),
            ));
        }
        let config = self.base.config(self.version, self.community);
        Ok(Session::new(transport, config, self.base.rng(), None))
    }
}

impl_common_methods!(CommunityBuilder);

/// Builder for SNMPv3 sessions before authentication is configured.
///
/// Created via [`Session::usm()`]. Call [`.auth()`](Self::auth) to continue.
pub struct UsmBuilder {
    base: BaseConfig,
    user: Bytes,
}

impl UsmBuilder {
    /// Authenticate with `protocol` keyed from `password`.
    pub fn auth(self, protocol: AuthProtocol, password: impl Into<Vec<u8>>) -> UsmAuthBuilder {
        UsmAuthBuilder {
            base: self.base,
            credentials: V3Credentials {
                user: self.user,
                auth_protocol: protocol,
                auth_password: Zeroizing::new(password.into()),
                privacy: None,
            },
        }
    }
}

impl_common_methods!(UsmBuilder);

/// Builder for authenticated SNMPv3 sessions.
///
/// Created from [`UsmBuilder::auth()`]. Add encryption with
/// [`.privacy()`](Self::privacy).
pub struct UsmAuthBuilder {
    base: BaseConfig,
    credentials: V3Credentials,
}

impl UsmAuthBuilder {
    /// Encrypt scoped PDUs with `protocol` keyed from `password`.
    pub fn privacy(mut self, protocol: PrivProtocol, password: impl Into<Vec<u8>>) -> Self {
        self.credentials.privacy = Some((protocol, Zeroizing::new(password.into())));
        self
    }

    /// Connect a UDP socket to the target and create the session.
    ///
    /// The session still needs [`Session::discover`] before requests.
    pub async fn connect(self) -> Result<Session<UdpTransport>> {
        let transport = self.base.connect().await?;
        self.build(transport)
    }

    /// Create the session over a caller-supplied transport.
    pub fn build<T: Transport>(self, transport: T) -> Result<Session<T>> {
        let config = self.base.config(Version::V3, Bytes::new());
        let usm = UsmState::new(self.credentials);
        Ok(Session::new(transport, config, self.base.rng(), Some(usm)))
    }
}

impl_common_methods!(UsmAuthBuilder);

impl Session<UdpTransport> {
    /// Start building an SNMPv1 or SNMPv2c session.
    ///
    /// `target` is `host:port` or a bare host on port 161.
    pub fn community(
        target: impl Into<String>,
        version: Version,
        community: impl Into<Bytes>,
    ) -> CommunityBuilder {
        CommunityBuilder {
            base: BaseConfig::new(target),
            version,
            community: community.into(),
        }
    }

    /// Start building an SNMPv3 USM session for `user`.
    pub fn usm(target: impl Into<String>, user: impl Into<Bytes>) -> UsmBuilder {
        UsmBuilder {
            base: BaseConfig::new(target),
            user: user.into(),
        }
    }
}
