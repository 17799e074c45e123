//! Participant display name encryption.
//!
//! Display names are stored as AES-256-GCM ciphertext so the database never
//! holds them in plaintext. The stored form is hex of
//! `nonce(12 bytes) || ciphertext || tag(16 bytes)`.

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use thiserror::Error;

const NONCE_LEN: usize = 12;

/// Encryption errors.
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Invalid encryption key length (expected 32 bytes, got {0})")]
    InvalidKeyLength(usize),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Invalid encrypted data format")]
    InvalidFormat,

    #[error("Hex decoding failed: {0}")]
    HexError(#[from] hex::FromHexError),
}

pub type CryptoResult<T> = Result<T, CryptoError>;

/// AES-256-GCM cipher for participant names.
#[derive(Clone)]
pub struct NameCipher {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for NameCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NameCipher").finish_non_exhaustive()
    }
}

impl NameCipher {
    /// Build a cipher from a raw 32-byte key.
    pub fn new(key: &[u8]) -> CryptoResult<Self> {
        if key.len() != 32 {
            return Err(CryptoError::InvalidKeyLength(key.len()));
        }

        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

        Ok(Self { cipher })
    }

    /// Build a cipher from a hex-encoded 32-byte key.
    pub fn from_hex_key(key: &str) -> CryptoResult<Self> {
        Self::new(&hex::decode(key.trim())?)
    }

    /// Encrypt a display name. A fresh random nonce is used per call.
    pub fn encrypt(&self, plaintext: &str) -> CryptoResult<String> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

        let mut combined = nonce.to_vec();
        combined.extend_from_slice(&ciphertext);

        Ok(hex::encode(combined))
    }

    /// Decrypt a value produced by [`NameCipher::encrypt`].
    pub fn decrypt(&self, encrypted: &str) -> CryptoResult<String> {
        let combined = hex::decode(encrypted)?;

        if combined.len() < NONCE_LEN {
            return Err(CryptoError::InvalidFormat);
        }

        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = self
            .cipher
            .decrypt(nonce, ciphertext)
            .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|e| CryptoError::DecryptionFailed(format!("Invalid UTF-8: {e}")))
    }
}
