// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use aes_gcm::{aead::Aead, Aes256Gcm, KeyInit, Nonce};
use hkdf::Hkdf;
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;
use std::fmt;
use thiserror::Error;
use x25519_dalek::{EphemeralSecret, PublicKey, SharedSecret, StaticSecret};
use zeroize::Zeroizing;

pub const KEY_BYTE_SIZE: usize = 32;
pub const SALT_BYTE_SIZE: usize = 16;
pub const NONCE_BYTE_SIZE: usize = 12;
const SEALED_HEADER_SIZE: usize = KEY_BYTE_SIZE + SALT_BYTE_SIZE + NONCE_BYTE_SIZE;
const HKDF_INFO: &[u8] = b"purechance/seal/v1";

/// Errors that can occur while sealing or opening values
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SealError {
    #[error("Failed to expand key")]
    KeyExpansionFailed,
    #[error("Failed to encrypt plaintext")]
    EncryptionFailed,
    #[error("Failed to decrypt ciphertext")]
    DecryptionFailed,
    #[error("Malformed key or sealed value: {0}")]
    Malformed(String),
}

/// X25519 keypair generated for a single decryption session.
///
/// The secret half is zeroized when the keypair is dropped.
pub struct EphemeralKeypair {
    secret: StaticSecret,
    public: PublicKey,
}

impl EphemeralKeypair {
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    pub fn from_private_key_hex(private_key: &str) -> Result<Self, SealError> {
        let bytes = Zeroizing::new(decode_key(private_key)?);
        let secret = StaticSecret::from(*bytes);
        let public = PublicKey::from(&secret);
        Ok(Self { secret, public })
    }

    pub fn public_key(&self) -> [u8; KEY_BYTE_SIZE] {
        self.public.to_bytes()
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public.as_bytes())
    }

    pub fn private_key_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.secret.as_bytes()))
    }

    /// Open a value that was sealed to this keypair's public key
    pub fn open(&self, sealed: &SealedValue) -> Result<Vec<u8>, SealError> {
        let shared = self
            .secret
            .diffie_hellman(&PublicKey::from(sealed.sender_public));
        let cipher = cipher_for(&shared, &sealed.salt)?;
        cipher
            .decrypt(Nonce::from_slice(&sealed.nonce), sealed.ciphertext.as_ref())
            .map_err(|_| SealError::DecryptionFailed)
    }
}

impl fmt::Debug for EphemeralKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EphemeralKeypair")
            .field("public", &self.public_key_hex())
            .finish_non_exhaustive()
    }
}

/// Decode a 32 byte key given as hex with or without the `0x` marker
pub fn decode_key(value: &str) -> Result<[u8; KEY_BYTE_SIZE], SealError> {
    let bytes = hex::decode(value.trim_start_matches("0x"))
        .map_err(|e| SealError::Malformed(e.to_string()))?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| SealError::Malformed(format!("expected 32 key bytes, got {}", b.len())))
}

/// A value encrypted to an X25519 public key.
///
/// Wire form: `[sender public key (32)][salt (16)][nonce (12)][ciphertext]`.
#[derive(Clone, PartialEq, Eq)]
pub struct SealedValue {
    sender_public: [u8; KEY_BYTE_SIZE],
    salt: [u8; SALT_BYTE_SIZE],
    nonce: [u8; NONCE_BYTE_SIZE],
    ciphertext: Vec<u8>,
}

impl SealedValue {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SEALED_HEADER_SIZE + self.ciphertext.len());
        out.extend_from_slice(&self.sender_public);
        out.extend_from_slice(&self.salt);
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SealError> {
        if bytes.len() <= SEALED_HEADER_SIZE {
            return Err(SealError::Malformed(format!(
                "sealed value too short: {} bytes",
                bytes.len()
            )));
        }
        let mut sender_public = [0u8; KEY_BYTE_SIZE];
        let mut salt = [0u8; SALT_BYTE_SIZE];
        let mut nonce = [0u8; NONCE_BYTE_SIZE];
        sender_public.copy_from_slice(&bytes[..KEY_BYTE_SIZE]);
        salt.copy_from_slice(&bytes[KEY_BYTE_SIZE..KEY_BYTE_SIZE + SALT_BYTE_SIZE]);
        nonce.copy_from_slice(&bytes[KEY_BYTE_SIZE + SALT_BYTE_SIZE..SEALED_HEADER_SIZE]);
        Ok(Self {
            sender_public,
            salt,
            nonce,
            ciphertext: bytes[SEALED_HEADER_SIZE..].to_vec(),
        })
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub fn from_hex(value: &str) -> Result<Self, SealError> {
        let bytes = hex::decode(value.trim_start_matches("0x"))
            .map_err(|e| SealError::Malformed(e.to_string()))?;
        Self::from_bytes(&bytes)
    }
}

impl fmt::Debug for SealedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SealedValue(")?;
        purechance_utils::hexf(&self.ciphertext, f)?;
        write!(f, ")")
    }
}

/// Encrypt `plaintext` so only the holder of `recipient`'s secret can read it.
///
/// A one-shot sender key is generated per call so no two sealed values share a
/// symmetric key.
pub fn seal(recipient: &[u8; KEY_BYTE_SIZE], plaintext: &[u8]) -> Result<SealedValue, SealError> {
    let sender = EphemeralSecret::random_from_rng(OsRng);
    let sender_public = PublicKey::from(&sender).to_bytes();
    let shared = sender.diffie_hellman(&PublicKey::from(*recipient));

    let mut salt = [0u8; SALT_BYTE_SIZE];
    OsRng.fill_bytes(&mut salt);
    let mut nonce = [0u8; NONCE_BYTE_SIZE];
    OsRng.fill_bytes(&mut nonce);

    let cipher = cipher_for(&shared, &salt)?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| SealError::EncryptionFailed)?;

    Ok(SealedValue {
        sender_public,
        salt,
        nonce,
        ciphertext,
    })
}

fn cipher_for(shared: &SharedSecret, salt: &[u8]) -> Result<Aes256Gcm, SealError> {
    let hkdf = Hkdf::<Sha256>::new(Some(salt), shared.as_bytes());
    let mut symmetric_key = Zeroizing::new([0u8; 32]);
    hkdf.expand(HKDF_INFO, &mut symmetric_key[..])
        .map_err(|_| SealError::KeyExpansionFailed)?;
    Aes256Gcm::new_from_slice(&symmetric_key[..]).map_err(|_| SealError::KeyExpansionFailed)
}
