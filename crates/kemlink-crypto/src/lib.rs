//! Kemlink Cryptographic Primitives
//!
//! The two external collaborators of a kemlink session: a key-encapsulation
//! module and an authenticated symmetric cipher. Pure functions with
//! deterministic outputs. Callers provide random bytes for deterministic
//! testing.
//!
//! # Key Lifecycle
//!
//! ```text
//! User A                                 User B
//! keygen(seed) ─── public key ─────────► encapsulate(pk, seed)
//!      │                                      │
//!      │  ◄──────────── ciphertext ───────────┤
//!      ▼                                      ▼
//! decapsulate(ct, sk)                    shared secret
//!      │                                      │
//!      ▼                                      ▼
//! HKDF-SHA256 → symmetric key ══ identical ══ HKDF-SHA256 → symmetric key
//!      │                                      │
//!      ▼                                      ▼
//! AES-256-GCM: nonce(12) || ciphertext || tag(16)
//! ```
//!
//! # Security
//!
//! Agreement:
//! - Key derivation depends on the shared secret only, so matching handshake
//!   messages always yield byte-identical symmetric keys on both sides
//!
//! Authenticity:
//! - AES-256-GCM rejects any modified nonce, ciphertext, or tag
//! - Failed authentication is reported, never retried
//!
//! Hygiene:
//! - Secret keys, shared secrets, and symmetric keys are zeroized on drop
//! - Secrets are displayed by [`fingerprint`] only

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod aead;
pub mod encoding;
pub mod error;
pub mod kdf;
pub mod kem;
pub mod keys;

pub use aead::{AesGcmCipher, NONCE_SIZE, SymmetricCipher, TAG_SIZE, open, seal};
pub use encoding::fingerprint;
pub use error::CryptoError;
pub use kdf::derive_symmetric_key;
pub use kem::{
    ENCAPSULATION_SEED_SIZE, KEYGEN_SEED_SIZE, KeyEncapsulation, MlKem768Kem, decapsulate,
    encapsulate, keygen,
};
pub use keys::{
    CIPHERTEXT_SIZE, Encapsulation, KemCiphertext, KeyPair, PUBLIC_KEY_SIZE, PublicKey,
    SECRET_KEY_SIZE, SHARED_SECRET_SIZE, SYMMETRIC_KEY_SIZE, SecretKey, SharedSecret,
    SymmetricKey,
};
