//! Encrypt/decrypt requests gated on an established key.
//!
//! The key is read from the registry at the moment of use and never cached,
//! so a wipe by the scheduler is observed by the very next request.

use kemlink_crypto::{AesGcmCipher, NONCE_SIZE, SymmetricCipher, encoding};
use tracing::debug;

use crate::{Role, SessionError, SessionRegistry, env::Timestamp};

/// Messaging front door for both roles.
///
/// Generic over the cipher so tests can substitute a failing engine.
#[derive(Debug, Clone, Default)]
pub struct MessagingGate<C = AesGcmCipher> {
    cipher: C,
}

impl<C: SymmetricCipher> MessagingGate<C> {
    /// Gate over the given cipher engine.
    pub fn new(cipher: C) -> Self {
        Self { cipher }
    }

    /// Encrypt `plaintext` under `role`'s key, returning a base64 blob.
    ///
    /// The key check comes first, so a role without a key always gets
    /// `NoKeyEstablished`. Whitespace-only plaintext is rejected, but a
    /// non-empty message is encrypted exactly as given.
    pub fn encrypt<I: Timestamp>(
        &self,
        registry: &SessionRegistry<I>,
        role: Role,
        plaintext: &str,
        nonce: [u8; NONCE_SIZE],
    ) -> Result<String, SessionError> {
        let key = registry.symmetric_key(role).ok_or(SessionError::NoKeyEstablished { role })?;

        if plaintext.trim().is_empty() {
            return Err(SessionError::EmptyInput { field: "message" });
        }

        let blob = self
            .cipher
            .encrypt(key, plaintext.as_bytes(), nonce)
            .map_err(|source| SessionError::CryptoOperation { operation: "encrypt", source })?;

        debug!(%role, bytes = blob.len(), "message encrypted");
        Ok(encoding::encode(&blob))
    }

    /// Decrypt a base64 blob under `role`'s key.
    ///
    /// Bad base64, a short blob and a failed tag all surface as
    /// `CipherFailure`. Non-UTF-8 plaintext is decoded lossily.
    pub fn decrypt<I: Timestamp>(
        &self,
        registry: &SessionRegistry<I>,
        role: Role,
        blob: &str,
    ) -> Result<String, SessionError> {
        let key = registry.symmetric_key(role).ok_or(SessionError::NoKeyEstablished { role })?;

        let blob = blob.trim();
        if blob.is_empty() {
            return Err(SessionError::EmptyInput { field: "encrypted message" });
        }

        let bytes = encoding::decode("encrypted message", blob)
            .map_err(|source| SessionError::CipherFailure { source })?;
        let plaintext = self
            .cipher
            .decrypt(key, &bytes)
            .map_err(|source| SessionError::CipherFailure { source })?;

        debug!(%role, bytes = plaintext.len(), "message decrypted");
        Ok(String::from_utf8_lossy(&plaintext).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use kemlink_crypto::{CryptoError, SymmetricKey};

    use super::*;

    fn registry_with_keys(a: Option<u8>, b: Option<u8>) -> SessionRegistry<Instant> {
        let mut registry = SessionRegistry::new();
        if let Some(byte) = a {
            registry.set_symmetric_key(Role::A, SymmetricKey::from_bytes([byte; 32]));
        }
        if let Some(byte) = b {
            registry.set_symmetric_key(Role::B, SymmetricKey::from_bytes([byte; 32]));
        }
        registry
    }

    #[test]
    fn cross_role_round_trip_with_shared_key() {
        let registry = registry_with_keys(Some(5), Some(5));
        let gate: MessagingGate = MessagingGate::default();

        let blob = gate.encrypt(&registry, Role::A, "hello B", [1; NONCE_SIZE]).unwrap();
        let plaintext = gate.decrypt(&registry, Role::B, &blob).unwrap();

        assert_eq!(plaintext, "hello B");
    }

    #[test]
    fn no_key_is_reported_before_input_checks() {
        let registry = registry_with_keys(None, None);
        let gate: MessagingGate = MessagingGate::default();

        assert_eq!(
            gate.encrypt(&registry, Role::A, "", [0; NONCE_SIZE]),
            Err(SessionError::NoKeyEstablished { role: Role::A })
        );
        assert_eq!(
            gate.decrypt(&registry, Role::B, ""),
            Err(SessionError::NoKeyEstablished { role: Role::B })
        );
    }

    #[test]
    fn blank_inputs_are_rejected() {
        let registry = registry_with_keys(Some(1), Some(1));
        let gate: MessagingGate = MessagingGate::default();

        assert_eq!(
            gate.encrypt(&registry, Role::A, "  ", [0; NONCE_SIZE]),
            Err(SessionError::EmptyInput { field: "message" })
        );
        assert_eq!(
            gate.decrypt(&registry, Role::A, "\n"),
            Err(SessionError::EmptyInput { field: "encrypted message" })
        );
    }

    #[test]
    fn plaintext_whitespace_is_preserved() {
        let registry = registry_with_keys(Some(1), Some(1));
        let gate: MessagingGate = MessagingGate::default();

        let blob = gate.encrypt(&registry, Role::B, "  padded  ", [3; NONCE_SIZE]).unwrap();
        assert_eq!(gate.decrypt(&registry, Role::A, &blob).unwrap(), "  padded  ");
    }

    #[test]
    fn mismatched_keys_fail_authentication() {
        let registry = registry_with_keys(Some(1), Some(2));
        let gate: MessagingGate = MessagingGate::default();

        let blob = gate.encrypt(&registry, Role::A, "secret", [0; NONCE_SIZE]).unwrap();
        let err = gate.decrypt(&registry, Role::B, &blob).unwrap_err();

        assert_eq!(err, SessionError::CipherFailure { source: CryptoError::AuthenticationFailed });
    }

    #[test]
    fn invalid_base64_is_a_cipher_failure() {
        let registry = registry_with_keys(Some(1), None);
        let gate: MessagingGate = MessagingGate::default();

        let err = gate.decrypt(&registry, Role::A, "not base64!").unwrap_err();
        assert!(matches!(err, SessionError::CipherFailure {
            source: CryptoError::InvalidEncoding { .. }
        }));
    }

    #[test]
    fn short_blob_is_a_cipher_failure() {
        let registry = registry_with_keys(Some(1), None);
        let gate: MessagingGate = MessagingGate::default();

        let err = gate.decrypt(&registry, Role::A, &encoding::encode(&[0; 4])).unwrap_err();
        assert!(matches!(err, SessionError::CipherFailure {
            source: CryptoError::MalformedBlob { actual: 4, .. }
        }));
    }

    #[test]
    fn blob_is_trimmed_before_decoding() {
        let registry = registry_with_keys(Some(1), Some(1));
        let gate: MessagingGate = MessagingGate::default();

        let blob = gate.encrypt(&registry, Role::A, "x", [0; NONCE_SIZE]).unwrap();
        assert_eq!(gate.decrypt(&registry, Role::B, &format!(" {blob}\n")).unwrap(), "x");
    }
}
