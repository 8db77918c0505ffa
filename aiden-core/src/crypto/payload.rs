use std::fmt;

use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use thiserror::Error;
use zeroize::Zeroizing;

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CipherError {
    #[error("invalid encryption key: {0}")]
    InvalidKey(String),
    #[error("encryption failed: {0}")]
    Encrypt(String),
    #[error("ciphertext is not valid base64")]
    Encoding,
    #[error("ciphertext is truncated ({0} bytes)")]
    Truncated(usize),
    #[error("ciphertext failed authentication")]
    Authentication,
    #[error("plaintext is not valid UTF-8")]
    Utf8,
}

/// AES-256-GCM gateway for payloads persisted at rest.
///
/// Output format is `base64(nonce || ciphertext || tag)` with a fresh random
/// 96-bit nonce per call. The key is wiped when the cipher is dropped.
pub struct PayloadCipher {
    key: Zeroizing<[u8; KEY_LEN]>,
}

impl fmt::Debug for PayloadCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PayloadCipher")
            .field("key", &"<redacted>")
            .finish()
    }
}

impl PayloadCipher {
    pub fn new(key: [u8; KEY_LEN]) -> Self {
        Self {
            key: Zeroizing::new(key),
        }
    }

    /// Build a cipher from a base64 encoded 32-byte key. A leading `base64:`
    /// marker is accepted.
    pub fn from_base64(encoded: &str) -> Result<Self, CipherError> {
        let trimmed = encoded.trim();
        let trimmed = trimmed.strip_prefix("base64:").unwrap_or(trimmed);
        let bytes = Zeroizing::new(BASE64.decode(trimmed).map_err(|_| {
            CipherError::InvalidKey("key is not valid base64".into())
        })?);
        if bytes.len() != KEY_LEN {
            return Err(CipherError::InvalidKey(format!(
                "expected {KEY_LEN} bytes, got {}",
                bytes.len()
            )));
        }

        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(&bytes);
        let cipher = Self::new(key);
        zeroize::Zeroize::zeroize(&mut key);
        Ok(cipher)
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(self.key.as_slice()))
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher()
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| CipherError::Encrypt(e.to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(sealed))
    }

    pub fn decrypt(&self, sealed: &str) -> Result<String, CipherError> {
        let bytes = BASE64
            .decode(sealed.trim())
            .map_err(|_| CipherError::Encoding)?;
        if bytes.len() < NONCE_LEN + TAG_LEN {
            return Err(CipherError::Truncated(bytes.len()));
        }

        let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);
        let plaintext = self
            .cipher()
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CipherError::Authentication)?;
        String::from_utf8(plaintext).map_err(|_| CipherError::Utf8)
    }
}
