// The Error enum carries OIDs and addresses inline; boxing them buys little.
#![allow(clippy::result_large_err)]

//! # snmp-session
//!
//! Async SNMP client: a variant-typed BER codec, OIDs, the SNMPv3 User-based
//! Security Model and a session layer that issues GET, GETNEXT and GETBULK
//! requests over UDP with retries.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use snmp_session::{Session, Version, oid};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), snmp_session::Error> {
//!     let mut session = Session::community("192.0.2.1:161", Version::V2c, "public")
//!         .connect()
//!         .await?;
//!
//!     let descr = session.get(&oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)).await?;
//!     println!("sysDescr: {descr}");
//!
//!     for (oid, value) in session.get_table(&oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2)).await? {
//!         println!("{oid} = {value}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## SNMPv3
//!
//! ```rust,no_run
//! use snmp_session::{Session, oid, v3::{AuthProtocol, PrivProtocol}};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), snmp_session::Error> {
//!     let mut session = Session::usm("192.0.2.1", "operator")
//!         .auth(AuthProtocol::Sha1, "authpass123")
//!         .privacy(PrivProtocol::Aes128, "privpass123")
//!         .connect()
//!         .await?;
//!
//!     session.discover().await?;
//!     let next = session.get_next_v3(&oid!(1, 3, 6, 1, 2, 1, 1)).await?;
//!     println!("{next}");
//!     Ok(())
//! }
//! ```

pub mod ber;
pub mod error;
pub mod message;
pub mod oid;
pub mod pdu;
pub mod prelude;
pub mod session;
pub mod transport;
pub mod util;
pub mod v3;
pub mod value;
pub mod varbind;
pub mod version;

#[cfg(feature = "cli")]
pub mod cli;

pub use error::{
    AuthErrorKind, CryptoErrorKind, DecodeErrorKind, EncodeErrorKind, Error, ErrorStatus,
    ExceptionKind, OidErrorKind, Result,
};
pub use message::{Trap, parse_trap};
pub use oid::Oid;
pub use pdu::Pdu;
pub use session::{Session, SessionConfig, SessionState, V3Credentials};
pub use transport::{Transport, UdpTransport};
pub use v3::{AuthProtocol, LocalizedKey, ParseProtocolError, PrivProtocol};
pub use value::{SequenceTag, Value};
pub use varbind::VarBind;
pub use version::Version;
