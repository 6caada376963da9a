//! Symmetric key derivation using HKDF

use hkdf::Hkdf;
use sha2::Sha256;

use crate::{SYMMETRIC_KEY_SIZE, SharedSecret, SymmetricKey};

/// Label used for symmetric key derivation
const SYMMETRIC_KEY_LABEL: &[u8] = b"ml-kem demo aes-gcm key";

/// Derive an AES-256 key from a KEM shared secret.
///
/// HKDF-SHA256 with no salt, so the output depends on the shared secret
/// alone. Two roles holding the same shared secret always derive the same
/// key.
pub fn derive_symmetric_key(shared_secret: &SharedSecret) -> SymmetricKey {
    let hkdf = Hkdf::<Sha256>::new(None, shared_secret.as_bytes());

    let mut okm = [0u8; SYMMETRIC_KEY_SIZE];
    let Ok(()) = hkdf.expand(SYMMETRIC_KEY_LABEL, &mut okm) else {
        unreachable!("32 bytes is a valid HKDF-SHA256 output length");
    };

    SymmetricKey::from_bytes(okm)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(byte: u8) -> SharedSecret {
        SharedSecret::from_slice(&[byte; 32]).unwrap()
    }

    #[test]
    fn derive_is_deterministic() {
        let a = derive_symmetric_key(&secret(7));
        let b = derive_symmetric_key(&secret(7));
        assert_eq!(a.as_bytes(), b.as_bytes(), "same inputs must produce same output");
    }

    #[test]
    fn different_secrets_produce_different_keys() {
        let a = derive_symmetric_key(&secret(1));
        let b = derive_symmetric_key(&secret(2));
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn key_differs_from_shared_secret() {
        let ss = secret(3);
        let key = derive_symmetric_key(&ss);
        assert_ne!(key.as_bytes(), ss.as_bytes());
    }
}
