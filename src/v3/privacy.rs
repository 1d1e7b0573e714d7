//! Privacy (encryption) for SNMPv3: DES-CBC (RFC 3414 §8) and AES-128-CFB (RFC 3826).
//!
//! ## DES-CBC
//! - privParameters: engineBoots (4 bytes) || salt (4 bytes)
//! - IV: pre-IV XOR privParameters, pre-IV being bytes 8..16 of the key
//! - plaintext zero-padded to a multiple of 8
//!
//! ## AES-128-CFB
//! - privParameters: 64-bit salt
//! - IV: engineBoots (4 bytes) || engineTime (4 bytes) || salt (8 bytes)

use bytes::Bytes;
use rand::Rng;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::{AuthProtocol, LocalizedKey, PrivProtocol};
use crate::error::{CryptoErrorKind, Error, Result};

const DES_BLOCK: usize = 8;

/// Privacy key for encryption and decryption.
///
/// The first 16 bytes of the localized key: an AES-128 key, or for DES an
/// 8-byte key followed by the 8-byte pre-IV. Zeroed on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PrivKey {
    key: Vec<u8>,
    #[zeroize(skip)]
    protocol: PrivProtocol,
}

impl PrivKey {
    /// Derive a privacy key from a password using the session's auth hash.
    pub fn from_password(
        auth_protocol: AuthProtocol,
        priv_protocol: PrivProtocol,
        password: &[u8],
        engine_id: &[u8],
    ) -> Self {
        let localized = LocalizedKey::from_password(auth_protocol, password, engine_id);
        Self::from_bytes(priv_protocol, localized.as_bytes())
    }

    /// Create a privacy key from localized key bytes; anything past 16 bytes is dropped.
    pub fn from_bytes(protocol: PrivProtocol, key: &[u8]) -> Self {
        let len = key.len().min(protocol.key_len());
        Self {
            key: key[..len].to_vec(),
            protocol,
        }
    }

    pub fn protocol(&self) -> PrivProtocol {
        self.protocol
    }

    /// Encrypt a serialized scoped PDU, returning `(ciphertext, privParameters)`.
    ///
    /// For DES only the low 32 bits of `salt` are used.
    pub fn encrypt(
        &self,
        plaintext: &[u8],
        engine_boots: u32,
        engine_time: u32,
        salt: u64,
    ) -> Result<(Bytes, Bytes)> {
        self.check_key_len()
            .map_err(|kind| Error::encrypt(None, kind))?;
        match self.protocol {
            PrivProtocol::Des => self.encrypt_des(plaintext, engine_boots, salt as u32),
            PrivProtocol::Aes128 => self.encrypt_aes(plaintext, engine_boots, engine_time, salt),
        }
    }

    /// Decrypt an encrypted scoped PDU using the privParameters of the message.
    ///
    /// DES plaintext keeps its zero padding; the BER decoder ignores it.
    pub fn decrypt(
        &self,
        ciphertext: &[u8],
        engine_boots: u32,
        engine_time: u32,
        priv_params: &[u8],
    ) -> Result<Bytes> {
        self.check_key_len()
            .map_err(|kind| Error::decrypt(None, kind))?;
        let salt: [u8; 8] = priv_params.try_into().map_err(|_| {
            Error::decrypt(
                None,
                CryptoErrorKind::InvalidPrivParamsLength {
                    expected: 8,
                    actual: priv_params.len(),
                },
            )
        })?;

        match self.protocol {
            PrivProtocol::Des => self.decrypt_des(ciphertext, &salt),
            PrivProtocol::Aes128 => self.decrypt_aes(ciphertext, engine_boots, engine_time, &salt),
        }
    }

    fn check_key_len(&self) -> std::result::Result<(), CryptoErrorKind> {
        if self.key.len() < self.protocol.key_len() {
            return Err(CryptoErrorKind::InvalidKeyLength);
        }
        Ok(())
    }

    fn des_iv(&self, priv_params: &[u8; 8]) -> [u8; 8] {
        let mut iv = [0u8; 8];
        for (i, byte) in iv.iter_mut().enumerate() {
            *byte = self.key[8 + i] ^ priv_params[i];
        }
        iv
    }

    fn encrypt_des(&self, plaintext: &[u8], engine_boots: u32, salt: u32) -> Result<(Bytes, Bytes)> {
        use cbc::cipher::block_padding::NoPadding;
        use cbc::cipher::{BlockEncryptMut, KeyIvInit};
        type DesCbc = cbc::Encryptor<des::Des>;

        let mut priv_params = [0u8; 8];
        priv_params[..4].copy_from_slice(&engine_boots.to_be_bytes());
        priv_params[4..].copy_from_slice(&salt.to_be_bytes());
        let iv = self.des_iv(&priv_params);

        let padded_len = plaintext.len().next_multiple_of(DES_BLOCK);
        let mut buffer = vec![0u8; padded_len];
        buffer[..plaintext.len()].copy_from_slice(plaintext);

        let cipher = DesCbc::new_from_slices(&self.key[..8], &iv)
            .map_err(|_| Error::encrypt(None, CryptoErrorKind::InvalidKeyLength))?;
        let ciphertext = cipher
            .encrypt_padded_mut::<NoPadding>(&mut buffer, padded_len)
            .map_err(|_| {
                Error::encrypt(
                    None,
                    CryptoErrorKind::InvalidCiphertextLength {
                        length: padded_len,
                        block_size: DES_BLOCK,
                    },
                )
            })?;

        Ok((
            Bytes::copy_from_slice(ciphertext),
            Bytes::copy_from_slice(&priv_params),
        ))
    }

    fn decrypt_des(&self, ciphertext: &[u8], priv_params: &[u8; 8]) -> Result<Bytes> {
        use cbc::cipher::block_padding::NoPadding;
        use cbc::cipher::{BlockDecryptMut, KeyIvInit};
        type DesCbc = cbc::Decryptor<des::Des>;

        let invalid_length = || {
            Error::decrypt(
                None,
                CryptoErrorKind::InvalidCiphertextLength {
                    length: ciphertext.len(),
                    block_size: DES_BLOCK,
                },
            )
        };
        if !ciphertext.len().is_multiple_of(DES_BLOCK) {
            return Err(invalid_length());
        }

        let iv = self.des_iv(priv_params);
        let cipher = DesCbc::new_from_slices(&self.key[..8], &iv)
            .map_err(|_| Error::decrypt(None, CryptoErrorKind::InvalidKeyLength))?;
        let mut buffer = ciphertext.to_vec();
        let plaintext = cipher
            .decrypt_padded_mut::<NoPadding>(&mut buffer)
            .map_err(|_| invalid_length())?;

        Ok(Bytes::copy_from_slice(plaintext))
    }

    fn aes_iv(engine_boots: u32, engine_time: u32, salt: &[u8; 8]) -> [u8; 16] {
        let mut iv = [0u8; 16];
        iv[..4].copy_from_slice(&engine_boots.to_be_bytes());
        iv[4..8].copy_from_slice(&engine_time.to_be_bytes());
        iv[8..].copy_from_slice(salt);
        iv
    }

    fn encrypt_aes(
        &self,
        plaintext: &[u8],
        engine_boots: u32,
        engine_time: u32,
        salt: u64,
    ) -> Result<(Bytes, Bytes)> {
        use cfb_mode::cipher::{AsyncStreamCipher, KeyIvInit};
        type Aes128Cfb = cfb_mode::Encryptor<aes::Aes128>;

        let salt = salt.to_be_bytes();
        let iv = Self::aes_iv(engine_boots, engine_time, &salt);
        let mut buffer = plaintext.to_vec();
        let cipher = Aes128Cfb::new_from_slices(&self.key[..16], &iv)
            .map_err(|_| Error::encrypt(None, CryptoErrorKind::InvalidKeyLength))?;
        cipher.encrypt(&mut buffer);

        Ok((Bytes::from(buffer), Bytes::copy_from_slice(&salt)))
    }

    fn decrypt_aes(
        &self,
        ciphertext: &[u8],
        engine_boots: u32,
        engine_time: u32,
        salt: &[u8; 8],
    ) -> Result<Bytes> {
        use cfb_mode::cipher::{AsyncStreamCipher, KeyIvInit};
        type Aes128Cfb = cfb_mode::Decryptor<aes::Aes128>;

        let iv = Self::aes_iv(engine_boots, engine_time, salt);
        let mut buffer = ciphertext.to_vec();
        let cipher = Aes128Cfb::new_from_slices(&self.key[..16], &iv)
            .map_err(|_| Error::decrypt(None, CryptoErrorKind::InvalidKeyLength))?;
        cipher.decrypt(&mut buffer);

        Ok(Bytes::from(buffer))
    }
}

impl std::fmt::Debug for PrivKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivKey")
            .field("protocol", &self.protocol)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Per-session salt counters.
///
/// Each counter is incremented before use and never yields zero, so the
/// first salt after seeding is `seed + 1`.
#[derive(Debug, Clone)]
pub struct SaltCounter {
    aes: u64,
    des: u32,
}

impl SaltCounter {
    /// Seed both counters from a random source.
    pub fn from_rng<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            aes: rng.r#gen(),
            des: rng.r#gen(),
        }
    }

    /// Start both counters at fixed values.
    pub fn from_value(aes: u64, des: u32) -> Self {
        Self { aes, des }
    }

    /// Next salt for `protocol`.
    pub fn next(&mut self, protocol: PrivProtocol) -> u64 {
        match protocol {
            PrivProtocol::Aes128 => {
                self.aes = self.aes.wrapping_add(1);
                if self.aes == 0 {
                    self.aes = 1;
                }
                self.aes
            }
            PrivProtocol::Des => {
                self.des = self.des.wrapping_add(1);
                if self.des == 0 {
                    self.des = 1;
                }
                u64::from(self.des)
            }
        }
    }
}
