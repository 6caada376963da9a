//! Message sealing using AES-256-GCM
//!
//! All functions are pure - the nonce must be provided by the caller.
//!
//! Blob layout:
//! - bytes 0-11: nonce (fresh random per call)
//! - bytes 12..: ciphertext followed by the 16-byte GCM tag

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};

use crate::{CryptoError, SymmetricKey};

/// AES-GCM nonce size (12 bytes)
pub const NONCE_SIZE: usize = 12;

/// GCM tag size (16 bytes)
pub const TAG_SIZE: usize = 16;

/// Authenticated symmetric cipher contract.
///
/// [`AesGcmCipher`] is the production implementation.
pub trait SymmetricCipher {
    /// Encrypt, returning `nonce || ciphertext || tag`.
    fn encrypt(
        &self,
        key: &SymmetricKey,
        plaintext: &[u8],
        nonce: [u8; NONCE_SIZE],
    ) -> Result<Vec<u8>, CryptoError>;

    /// Verify and decrypt a blob produced by [`SymmetricCipher::encrypt`].
    fn decrypt(&self, key: &SymmetricKey, blob: &[u8]) -> Result<Vec<u8>, CryptoError>;
}

/// AES-256-GCM implementation of [`SymmetricCipher`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AesGcmCipher;

impl SymmetricCipher for AesGcmCipher {
    fn encrypt(
        &self,
        key: &SymmetricKey,
        plaintext: &[u8],
        nonce: [u8; NONCE_SIZE],
    ) -> Result<Vec<u8>, CryptoError> {
        seal(key, plaintext, nonce)
    }

    fn decrypt(&self, key: &SymmetricKey, blob: &[u8]) -> Result<Vec<u8>, CryptoError> {
        open(key, blob)
    }
}

/// Encrypt a message with AES-256-GCM.
///
/// # Security
///
/// - Caller MUST provide a fresh random nonce per call in production
/// - Nonce reuse under the same key breaks confidentiality and integrity
pub fn seal(
    key: &SymmetricKey,
    plaintext: &[u8],
    nonce: [u8; NONCE_SIZE],
) -> Result<Vec<u8>, CryptoError> {
    let cipher = Aes256Gcm::new(key.as_bytes().into());
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| CryptoError::EncryptionFailed)?;

    let mut blob = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&ciphertext);
    Ok(blob)
}

/// Decrypt a blob produced by [`seal`].
///
/// # Errors
///
/// - `MalformedBlob`: shorter than the nonce
/// - `AuthenticationFailed`: tag or key is incorrect (tamper)
pub fn open(key: &SymmetricKey, blob: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if blob.len() < NONCE_SIZE {
        return Err(CryptoError::MalformedBlob { actual: blob.len(), minimum: NONCE_SIZE });
    }

    let (nonce, ciphertext) = blob.split_at(NONCE_SIZE);
    let cipher = Aes256Gcm::new(key.as_bytes().into());

    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::AuthenticationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(byte: u8) -> SymmetricKey {
        SymmetricKey::from_bytes([byte; 32])
    }

    #[test]
    fn seal_open_roundtrip() {
        let key = key(1);
        let blob = seal(&key, b"Hello, World!", [0xAB; NONCE_SIZE]).unwrap();
        assert_eq!(open(&key, &blob).unwrap(), b"Hello, World!");
    }

    #[test]
    fn blob_carries_nonce_prefix_and_tag() {
        let nonce = [7u8; NONCE_SIZE];
        let blob = seal(&key(1), b"test message", nonce).unwrap();

        assert_eq!(&blob[..NONCE_SIZE], &nonce);
        assert_eq!(blob.len(), NONCE_SIZE + b"test message".len() + TAG_SIZE);
    }

    #[test]
    fn different_nonces_produce_different_blobs() {
        let key = key(1);
        let a = seal(&key, b"test", [0x00; NONCE_SIZE]).unwrap();
        let b = seal(&key, b"test", [0xFF; NONCE_SIZE]).unwrap();
        assert_ne!(a[NONCE_SIZE..], b[NONCE_SIZE..]);
    }

    #[test]
    fn wrong_key_fails_authentication() {
        let blob = seal(&key(1), b"secret message", [0; NONCE_SIZE]).unwrap();
        assert_eq!(open(&key(2), &blob), Err(CryptoError::AuthenticationFailed));
    }

    #[test]
    fn tampered_ciphertext_fails_authentication() {
        let key = key(1);
        let mut blob = seal(&key, b"original message", [0; NONCE_SIZE]).unwrap();
        blob[NONCE_SIZE] ^= 0xFF;
        assert_eq!(open(&key, &blob), Err(CryptoError::AuthenticationFailed));
    }

    #[test]
    fn tampered_nonce_fails_authentication() {
        let key = key(1);
        let mut blob = seal(&key, b"original message", [0; NONCE_SIZE]).unwrap();
        blob[0] ^= 0x01;
        assert_eq!(open(&key, &blob), Err(CryptoError::AuthenticationFailed));
    }

    #[test]
    fn short_blob_is_malformed() {
        let result = open(&key(1), &[0u8; NONCE_SIZE - 1]);
        assert_eq!(result, Err(CryptoError::MalformedBlob { actual: 11, minimum: NONCE_SIZE }));
    }

    #[test]
    fn nonce_only_blob_fails_authentication() {
        let result = open(&key(1), &[0u8; NONCE_SIZE]);
        assert_eq!(result, Err(CryptoError::AuthenticationFailed));
    }
}
