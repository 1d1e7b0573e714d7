//! Authentication key derivation and HMAC operations (RFC 3414).
//!
//! This module implements:
//! - Password-to-key derivation (1MB expansion + hash)
//! - Key localization (binding key to engine ID)
//! - HMAC-96 authentication for message integrity

use digest::{Digest, KeyInit, Mac};
use hmac::Hmac;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::AuthProtocol;
use super::usm::locate_auth_params;
use crate::error::{AuthErrorKind, EncodeErrorKind, Error, Result};

/// Length of the truncated MAC (HMAC-96).
pub const MAC_LEN: usize = 12;

/// Bytes of repeated password digested by password-to-key.
pub const PASSWORD_EXPANSION: usize = 1_048_576;

/// Minimum password length recommended by net-snmp.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Localized key: a password-derived key bound to one engine ID.
///
/// Used directly for HMAC and, truncated, as privacy key material.
/// Zeroed on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct LocalizedKey {
    key: Vec<u8>,
    #[zeroize(skip)]
    protocol: AuthProtocol,
}

impl LocalizedKey {
    /// Derive a localized key from a password and engine ID (RFC 3414 A.2).
    ///
    /// Empty passwords give an all-zero key. Passwords shorter than
    /// [`MIN_PASSWORD_LENGTH`] are accepted with a warning.
    pub fn from_password(protocol: AuthProtocol, password: &[u8], engine_id: &[u8]) -> Self {
        if password.len() < MIN_PASSWORD_LENGTH {
            tracing::warn!(
                target: "snmp_session::v3",
                password_len = password.len(),
                min_len = MIN_PASSWORD_LENGTH,
                "SNMPv3 password is shorter than recommended minimum"
            );
        }
        let mut master_key = password_to_key(protocol, password);
        let localized = localize_key(protocol, &master_key, engine_id);
        master_key.zeroize();
        Self {
            key: localized,
            protocol,
        }
    }

    /// Create a localized key from raw bytes.
    pub fn from_bytes(protocol: AuthProtocol, key: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            protocol,
        }
    }

    /// Get the protocol this key is for.
    pub fn protocol(&self) -> AuthProtocol {
        self.protocol
    }

    /// Get the raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }

    /// HMAC over `data`, truncated to 12 bytes.
    pub fn compute_hmac(&self, data: &[u8]) -> [u8; MAC_LEN] {
        match self.protocol {
            AuthProtocol::Md5 => hmac_96::<Hmac<md5::Md5>>(&self.key, data),
            AuthProtocol::Sha1 => hmac_96::<Hmac<sha1::Sha1>>(&self.key, data),
        }
    }

    /// Constant-time MAC check.
    pub fn verify_hmac(&self, data: &[u8], expected: &[u8]) -> bool {
        let computed = self.compute_hmac(data);
        computed.len() == expected.len() && bool::from(computed[..].ct_eq(expected))
    }
}

impl std::fmt::Debug for LocalizedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalizedKey")
            .field("protocol", &self.protocol)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Password to key transformation (RFC 3414 Section A.2.1), giving `Ku`.
///
/// Digests exactly [`PASSWORD_EXPANSION`] bytes: the password repeated as many
/// whole times as fit, then its leading bytes up to the limit.
pub fn password_to_key(protocol: AuthProtocol, password: &[u8]) -> Vec<u8> {
    match protocol {
        AuthProtocol::Md5 => password_to_key_impl::<md5::Md5>(password),
        AuthProtocol::Sha1 => password_to_key_impl::<sha1::Sha1>(password),
    }
}

fn password_to_key_impl<D: Digest>(password: &[u8]) -> Vec<u8> {
    if password.is_empty() {
        return vec![0u8; <D as Digest>::output_size()];
    }

    let mut hasher = D::new();
    let repeats = PASSWORD_EXPANSION / password.len();
    let remainder = PASSWORD_EXPANSION % password.len();
    for _ in 0..repeats {
        hasher.update(password);
    }
    hasher.update(&password[..remainder]);
    hasher.finalize().to_vec()
}

/// Key localization (RFC 3414 Section A.2.2): `H(Ku || engineID || Ku)`.
pub fn localize_key(protocol: AuthProtocol, master_key: &[u8], engine_id: &[u8]) -> Vec<u8> {
    match protocol {
        AuthProtocol::Md5 => localize_key_impl::<md5::Md5>(master_key, engine_id),
        AuthProtocol::Sha1 => localize_key_impl::<sha1::Sha1>(master_key, engine_id),
    }
}

fn localize_key_impl<D: Digest>(master_key: &[u8], engine_id: &[u8]) -> Vec<u8> {
    let mut hasher = D::new();
    hasher.update(master_key);
    hasher.update(engine_id);
    hasher.update(master_key);
    hasher.finalize().to_vec()
}

fn hmac_96<M: Mac + KeyInit>(key: &[u8], data: &[u8]) -> [u8; MAC_LEN] {
    let mut mac = <M as KeyInit>::new_from_slice(key).expect("HMAC can take key of any size");
    Mac::update(&mut mac, data);
    let full = mac.finalize().into_bytes();
    let mut out = [0u8; MAC_LEN];
    out.copy_from_slice(&full[..MAC_LEN]);
    out
}

/// Authenticate an outgoing message in place.
///
/// The serialized message must carry a 12-byte zero placeholder in
/// msgAuthenticationParameters. The HMAC covers the whole message with the
/// placeholder in it and then overwrites the placeholder; nothing is re-encoded.
pub fn authenticate_message(key: &LocalizedKey, message: &mut [u8]) -> Result<()> {
    let range = locate_auth_params(message)
        .ok_or(Error::encode(EncodeErrorKind::MissingAuthParams))?;
    if range.len() != MAC_LEN {
        return Err(Error::auth(
            None,
            AuthErrorKind::WrongMacLength {
                expected: MAC_LEN,
                actual: range.len(),
            },
        ));
    }
    let mac = key.compute_hmac(message);
    message[range].copy_from_slice(&mac);
    Ok(())
}

/// Verify the HMAC of an incoming message.
pub fn verify_message(key: &LocalizedKey, message: &[u8]) -> Result<()> {
    let range =
        locate_auth_params(message).ok_or(Error::auth(None, AuthErrorKind::AuthParamsNotFound))?;
    if range.len() != MAC_LEN {
        return Err(Error::auth(
            None,
            AuthErrorKind::WrongMacLength {
                expected: MAC_LEN,
                actual: range.len(),
            },
        ));
    }

    let received = &message[range.clone()];
    let mut zeroed = message.to_vec();
    zeroed[range].fill(0);

    if key.verify_hmac(&zeroed, received) {
        Ok(())
    } else {
        tracing::debug!(target: "snmp_session::v3", "HMAC mismatch on inbound message");
        Err(Error::auth(None, AuthErrorKind::HmacMismatch))
    }
}
