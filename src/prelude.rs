//! Commonly used types in one import.
//!
//! ```rust,no_run
//! use snmp_session::prelude::*;
//! ```

pub use crate::error::{Error, Result};
pub use crate::oid::Oid;
pub use crate::session::{Session, SessionState};
pub use crate::v3::{AuthProtocol, PrivProtocol};
pub use crate::value::Value;
pub use crate::varbind::VarBind;
pub use crate::version::Version;

#[doc(no_inline)]
pub use crate::oid;
