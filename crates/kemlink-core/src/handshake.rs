//! Handshake sequencing for both roles.
//!
//! ```text
//! Role A: Empty ──generate_keys──► KeysGenerated ──decapsulate──► SecretDerived
//! Role B: Empty ──encapsulate────────────────────────────────────► SecretDerived
//! ```
//!
//! Every step computes its cryptographic result BEFORE touching the
//! registry. A failed step leaves the role exactly as it was; a successful
//! restart (keygen or encapsulate from any phase) is applied as
//! `Any -> Empty -> next` in one call.

use std::time::Duration;

use kemlink_crypto::{
    ENCAPSULATION_SEED_SIZE, KEYGEN_SEED_SIZE, KemCiphertext, KeyEncapsulation, MlKem768Kem,
    PublicKey,
};
use tracing::{debug, info};

use crate::{
    ExpirationScheduler, KeyMaterial, Role, SessionError, SessionRegistry, SessionState,
    env::Timestamp, registry::ArmedTimer,
};

/// Handshake progress of one role, derived from its session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandshakePhase {
    /// No material.
    Empty,
    /// Role A holds a keypair but no shared secret yet.
    KeysGenerated,
    /// Shared secret and symmetric key established.
    SecretDerived,
}

impl HandshakePhase {
    /// Phase implied by a role's record.
    pub fn of<I: Timestamp>(state: &SessionState<I>) -> Self {
        match state.material() {
            None => Self::Empty,
            Some(material) if material.shared_secret().is_some() => Self::SecretDerived,
            Some(_) => Self::KeysGenerated,
        }
    }
}

/// Sequences keygen, encapsulation and decapsulation into the registry.
///
/// Generic over the KEM so tests can substitute a failing implementation.
#[derive(Debug, Clone, Default)]
pub struct HandshakeCoordinator<K = MlKem768Kem> {
    kem: K,
}

impl<K: KeyEncapsulation> HandshakeCoordinator<K> {
    /// Coordinator over the given KEM.
    pub fn new(kem: K) -> Self {
        Self { kem }
    }

    /// Role A: generate a keypair and arm A's timer.
    ///
    /// Restarts A from `Empty` whatever its prior phase, discarding any
    /// earlier keypair, shared secret and symmetric key.
    pub fn generate_keys<I: Timestamp>(
        &self,
        registry: &mut SessionRegistry<I>,
        scheduler: &ExpirationScheduler,
        lifetime: Duration,
        now: I,
        seed: &[u8; KEYGEN_SEED_SIZE],
    ) -> Result<ArmedTimer<I>, SessionError> {
        let key_pair = self
            .kem
            .keygen(seed)
            .map_err(|source| SessionError::CryptoOperation {
                operation: "generate keys",
                source,
            })?;

        let fingerprint = key_pair.public_key.fingerprint();
        let previous = HandshakePhase::of(registry.state(Role::A));

        registry.clear(Role::A);
        registry.set_material(Role::A, KeyMaterial::Initiator { key_pair, shared_secret: None });
        let timer = scheduler.arm(registry, Role::A, lifetime, now);

        info!(role = %Role::A, ?previous, public_key = %fingerprint, "keys generated");
        Ok(timer)
    }

    /// Role B: encapsulate to A's public key, derive B's key and arm B's
    /// timer.
    ///
    /// `public_key` is base64 text; surrounding whitespace is ignored.
    pub fn encapsulate<I: Timestamp>(
        &self,
        registry: &mut SessionRegistry<I>,
        scheduler: &ExpirationScheduler,
        lifetime: Duration,
        now: I,
        public_key: &str,
        seed: &[u8; ENCAPSULATION_SEED_SIZE],
    ) -> Result<ArmedTimer<I>, SessionError> {
        let public_key = public_key.trim();
        if public_key.is_empty() {
            return Err(SessionError::MissingPublicKey);
        }

        let crypto = |source| SessionError::CryptoOperation { operation: "encapsulate", source };
        let public_key = PublicKey::from_base64(public_key).map_err(crypto)?;
        let encapsulation = self.kem.encapsulate(&public_key, seed).map_err(crypto)?;
        let symmetric_key = self.kem.derive_symmetric_key(&encapsulation.shared_secret);

        let fingerprint = symmetric_key.fingerprint();
        let previous = HandshakePhase::of(registry.state(Role::B));

        registry.clear(Role::B);
        registry.set_material(Role::B, KeyMaterial::Responder {
            ciphertext: encapsulation.ciphertext,
            shared_secret: encapsulation.shared_secret,
        });
        registry.set_symmetric_key(Role::B, symmetric_key);
        let timer = scheduler.arm(registry, Role::B, lifetime, now);

        info!(role = %Role::B, ?previous, key = %fingerprint, "secret derived by encapsulation");
        Ok(timer)
    }

    /// Role A: recover the shared secret from B's ciphertext and derive A's
    /// key.
    ///
    /// Does not re-arm A's timer; the keypair's lifetime bounds the derived
    /// key too. Checks run in order: ciphertext present, then keypair
    /// present.
    pub fn decapsulate<I: Timestamp>(
        &self,
        registry: &mut SessionRegistry<I>,
        ciphertext: &str,
    ) -> Result<(), SessionError> {
        let ciphertext = ciphertext.trim();
        if ciphertext.is_empty() {
            return Err(SessionError::MissingCiphertext);
        }

        let Some(KeyMaterial::Initiator { key_pair, .. }) = registry.state(Role::A).material()
        else {
            return Err(SessionError::MissingSecretKey { role: Role::A });
        };

        let crypto = |source| SessionError::CryptoOperation { operation: "decapsulate", source };
        let ciphertext = KemCiphertext::from_base64(ciphertext).map_err(crypto)?;
        let shared_secret =
            self.kem.decapsulate(&ciphertext, &key_pair.secret_key).map_err(crypto)?;
        let symmetric_key = self.kem.derive_symmetric_key(&shared_secret);
        let fingerprint = symmetric_key.fingerprint();

        if let Some(KeyMaterial::Initiator { shared_secret: slot, .. }) =
            registry.material_mut(Role::A)
        {
            *slot = Some(shared_secret);
        }
        registry.set_symmetric_key(Role::A, symmetric_key);

        info!(role = %Role::A, key = %fingerprint, "secret derived by decapsulation");
        let deadline = registry.expiration_deadline(Role::A);
        debug!(role = %Role::A, ?deadline, "timer unchanged");
        Ok(())
    }
}
