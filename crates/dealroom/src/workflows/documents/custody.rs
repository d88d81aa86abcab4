use std::fmt;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::RngCore;

pub const KEY_LEN: usize = 32;
pub const IV_LEN: usize = 12;

/// Process-wide AES-256 key for documents at rest.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionKey([u8; KEY_LEN]);

impl EncryptionKey {
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse a 64 character hex string.
    pub fn from_hex(raw: &str) -> Result<Self, KeyError> {
        let decoded = hex::decode(raw.trim()).map_err(|_| KeyError::InvalidHex)?;
        let bytes: [u8; KEY_LEN] = decoded
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidLength(decoded.len()))?;
        Ok(Self(bytes))
    }

    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey(<redacted>)")
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("key is not valid hex")]
    InvalidHex,
    #[error("key must be {KEY_LEN} bytes, got {0}")]
    InvalidLength(usize),
}

#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("encryption failed")]
    Encrypt,
    #[error("decryption failed: ciphertext or key mismatch")]
    Decrypt,
    #[error("stored initialization vector is malformed")]
    InvalidIv,
}

/// Ciphertext plus the random IV it was sealed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedBlob {
    pub ciphertext: Vec<u8>,
    pub iv: [u8; IV_LEN],
}

impl SealedBlob {
    pub fn iv_hex(&self) -> String {
        hex::encode(self.iv)
    }
}

/// AES-256-GCM with a fresh 96-bit IV per document.
#[derive(Clone)]
pub struct DocumentCipher {
    key: EncryptionKey,
}

impl DocumentCipher {
    pub fn new(key: EncryptionKey) -> Self {
        Self { key }
    }

    pub fn seal(&self, plaintext: &[u8]) -> Result<SealedBlob, CipherError> {
        let cipher = Aes256Gcm::new(self.key.as_bytes().into());
        let mut iv = [0u8; IV_LEN];
        rand::thread_rng().fill_bytes(&mut iv);

        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&iv), plaintext)
            .map_err(|_| CipherError::Encrypt)?;
        Ok(SealedBlob { ciphertext, iv })
    }

    pub fn open(&self, ciphertext: &[u8], iv_hex: &str) -> Result<Vec<u8>, CipherError> {
        let iv: [u8; IV_LEN] = hex::decode(iv_hex)
            .map_err(|_| CipherError::InvalidIv)?
            .as_slice()
            .try_into()
            .map_err(|_| CipherError::InvalidIv)?;
        let cipher = Aes256Gcm::new(self.key.as_bytes().into());
        cipher
            .decrypt(Nonce::from_slice(&iv), ciphertext)
            .map_err(|_| CipherError::Decrypt)
    }
}

impl fmt::Debug for DocumentCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentCipher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sealed_blobs_use_distinct_ivs_and_open_with_the_same_key() {
        let cipher = DocumentCipher::new(EncryptionKey::generate());
        let first = cipher.seal(b"due diligence pack").expect("seal");
        let second = cipher.seal(b"due diligence pack").expect("seal");

        assert_ne!(first.iv, second.iv);
        assert_ne!(first.ciphertext, b"due diligence pack".to_vec());
        let opened = cipher
            .open(&first.ciphertext, &first.iv_hex())
            .expect("open");
        assert_eq!(opened, b"due diligence pack".to_vec());
    }

    #[test]
    fn opening_with_another_key_fails() {
        let sealed = DocumentCipher::new(EncryptionKey::generate())
            .seal(b"share register")
            .expect("seal");
        let other = DocumentCipher::new(EncryptionKey::generate());
        assert!(matches!(
            other.open(&sealed.ciphertext, &sealed.iv_hex()),
            Err(CipherError::Decrypt)
        ));
    }

    #[test]
    fn keys_parse_from_hex_and_reject_wrong_lengths() {
        assert!(EncryptionKey::from_hex(&"0f".repeat(32)).is_ok());
        assert_eq!(
            EncryptionKey::from_hex("abcd"),
            Err(KeyError::InvalidLength(2))
        );
        assert_eq!(
            EncryptionKey::from_hex(&"zz".repeat(32)),
            Err(KeyError::InvalidHex)
        );
        assert_eq!(
            format!("{:?}", EncryptionKey::generate()),
            "EncryptionKey(<redacted>)"
        );
    }
}
