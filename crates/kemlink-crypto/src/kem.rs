//! ML-KEM-768 key encapsulation.
//!
//! Deterministic entry points: the caller supplies the randomness (64 bytes
//! for keygen, 32 bytes for encapsulation), which keeps every function pure
//! and replayable under a seeded environment.
//!
//! ML-KEM decapsulation uses implicit rejection: a well-formed ciphertext
//! under the wrong secret key yields an unrelated shared secret rather than
//! an error. The mismatch surfaces later as an AEAD authentication failure.

use ml_kem::{
    B32, Ciphertext, EncapsulateDeterministic, Encoded, EncodedSizeUser, KemCore, MlKem768,
    MlKem768Params,
    kem::{Decapsulate, DecapsulationKey, EncapsulationKey},
};
use zeroize::Zeroizing;

use crate::{
    CryptoError, Encapsulation, KemCiphertext, KeyPair, PublicKey, SecretKey, SharedSecret,
    SymmetricKey, kdf,
};

/// Random bytes consumed by [`keygen`] (seeds `d` and `z`).
pub const KEYGEN_SEED_SIZE: usize = 64;

/// Random bytes consumed by [`encapsulate`] (message `m`).
pub const ENCAPSULATION_SEED_SIZE: usize = 32;

/// Key-encapsulation module contract.
///
/// The session core treats the KEM as an opaque collaborator behind this
/// trait. [`MlKem768Kem`] is the production implementation.
pub trait KeyEncapsulation {
    /// Generate a fresh keypair from caller-provided randomness.
    fn keygen(&self, seed: &[u8; KEYGEN_SEED_SIZE]) -> Result<KeyPair, CryptoError>;

    /// Encapsulate to a public key, producing a ciphertext and shared secret.
    fn encapsulate(
        &self,
        public_key: &PublicKey,
        seed: &[u8; ENCAPSULATION_SEED_SIZE],
    ) -> Result<Encapsulation, CryptoError>;

    /// Recover the shared secret from a ciphertext.
    fn decapsulate(
        &self,
        ciphertext: &KemCiphertext,
        secret_key: &SecretKey,
    ) -> Result<SharedSecret, CryptoError>;

    /// Derive the symmetric key from a shared secret. Deterministic.
    fn derive_symmetric_key(&self, shared_secret: &SharedSecret) -> SymmetricKey {
        kdf::derive_symmetric_key(shared_secret)
    }
}

/// ML-KEM-768 implementation of [`KeyEncapsulation`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MlKem768Kem;

impl KeyEncapsulation for MlKem768Kem {
    fn keygen(&self, seed: &[u8; KEYGEN_SEED_SIZE]) -> Result<KeyPair, CryptoError> {
        keygen(seed)
    }

    fn encapsulate(
        &self,
        public_key: &PublicKey,
        seed: &[u8; ENCAPSULATION_SEED_SIZE],
    ) -> Result<Encapsulation, CryptoError> {
        encapsulate(public_key, seed)
    }

    fn decapsulate(
        &self,
        ciphertext: &KemCiphertext,
        secret_key: &SecretKey,
    ) -> Result<SharedSecret, CryptoError> {
        decapsulate(ciphertext, secret_key)
    }
}

/// Generate an ML-KEM-768 keypair.
///
/// The first 32 seed bytes are `d`, the last 32 are `z`.
pub fn keygen(seed: &[u8; KEYGEN_SEED_SIZE]) -> Result<KeyPair, CryptoError> {
    let mut d = Zeroizing::new([0u8; 32]);
    let mut z = Zeroizing::new([0u8; 32]);
    d.copy_from_slice(&seed[..32]);
    z.copy_from_slice(&seed[32..]);

    let (dk, ek) = MlKem768::generate_deterministic(&B32::from(*d), &B32::from(*z));

    let public_key = PublicKey::from_bytes(ek.as_bytes().as_slice().to_vec())?;
    let secret_key = SecretKey::from_bytes(dk.as_bytes().as_slice().to_vec())?;

    Ok(KeyPair { public_key, secret_key })
}

/// Encapsulate to an ML-KEM-768 public key.
pub fn encapsulate(
    public_key: &PublicKey,
    seed: &[u8; ENCAPSULATION_SEED_SIZE],
) -> Result<Encapsulation, CryptoError> {
    let bytes = public_key.as_bytes();
    let encoded = Encoded::<EncapsulationKey<MlKem768Params>>::try_from(bytes).map_err(|_| {
        CryptoError::InvalidLength {
            what: "public key",
            expected: crate::PUBLIC_KEY_SIZE,
            actual: bytes.len(),
        }
    })?;
    let ek = EncapsulationKey::<MlKem768Params>::from_bytes(&encoded);

    let (ct, ss) = ek
        .encapsulate_deterministic(&B32::from(*seed))
        .map_err(|_| CryptoError::KemFailure { operation: "encapsulate" })?;

    Ok(Encapsulation {
        ciphertext: KemCiphertext::from_bytes(ct.as_slice().to_vec())?,
        shared_secret: SharedSecret::from_slice(ss.as_slice())?,
    })
}

/// Decapsulate an ML-KEM-768 ciphertext.
pub fn decapsulate(
    ciphertext: &KemCiphertext,
    secret_key: &SecretKey,
) -> Result<SharedSecret, CryptoError> {
    let sk_bytes = secret_key.as_bytes();
    let encoded = Encoded::<DecapsulationKey<MlKem768Params>>::try_from(sk_bytes).map_err(|_| {
        CryptoError::InvalidLength {
            what: "secret key",
            expected: crate::SECRET_KEY_SIZE,
            actual: sk_bytes.len(),
        }
    })?;
    let dk = DecapsulationKey::<MlKem768Params>::from_bytes(&encoded);

    let ct_bytes = ciphertext.as_bytes();
    let ct = Ciphertext::<MlKem768>::try_from(ct_bytes).map_err(|_| {
        CryptoError::InvalidLength {
            what: "ciphertext",
            expected: crate::CIPHERTEXT_SIZE,
            actual: ct_bytes.len(),
        }
    })?;

    let ss =
        dk.decapsulate(&ct).map_err(|_| CryptoError::KemFailure { operation: "decapsulate" })?;

    SharedSecret::from_slice(ss.as_slice())
}
