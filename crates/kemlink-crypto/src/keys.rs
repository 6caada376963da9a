//! Typed key material.
//!
//! Raw bytes inside, standard base64 at the boundary. Secret types are
//! zeroized on drop and never print their contents.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{
    CryptoError,
    encoding::{decode, encode, fingerprint},
};

/// ML-KEM-768 encapsulation key size in bytes.
pub const PUBLIC_KEY_SIZE: usize = 1184;

/// ML-KEM-768 decapsulation key size in bytes.
pub const SECRET_KEY_SIZE: usize = 2400;

/// ML-KEM-768 ciphertext size in bytes.
pub const CIPHERTEXT_SIZE: usize = 1088;

/// Shared secret size in bytes.
pub const SHARED_SECRET_SIZE: usize = 32;

/// AES-256 key size in bytes.
pub const SYMMETRIC_KEY_SIZE: usize = 32;

fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<(), CryptoError> {
    if actual == expected {
        Ok(())
    } else {
        Err(CryptoError::InvalidLength { what, expected, actual })
    }
}

/// KEM public (encapsulation) key. Safe to share.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey(Vec<u8>);

impl PublicKey {
    /// Wrap raw key bytes, checking the length.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, CryptoError> {
        check_len("public key", PUBLIC_KEY_SIZE, bytes.len())?;
        Ok(Self(bytes))
    }

    /// Parse a base64 public key.
    pub fn from_base64(input: &str) -> Result<Self, CryptoError> {
        Self::from_bytes(decode("public key", input)?)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Base64 form for sharing with the peer.
    pub fn to_base64(&self) -> String {
        encode(&self.0)
    }

    /// Display fingerprint.
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.0)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.fingerprint())
    }
}

/// KEM secret (decapsulation) key. Never leaves its owning role.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretKey(Vec<u8>);

impl SecretKey {
    /// Wrap raw key bytes, checking the length.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, CryptoError> {
        check_len("secret key", SECRET_KEY_SIZE, bytes.len())?;
        Ok(Self(bytes))
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}

/// KEM ciphertext produced by encapsulation. Safe to share.
#[derive(Clone, PartialEq, Eq)]
pub struct KemCiphertext(Vec<u8>);

impl KemCiphertext {
    /// Wrap raw ciphertext bytes, checking the length.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, CryptoError> {
        check_len("ciphertext", CIPHERTEXT_SIZE, bytes.len())?;
        Ok(Self(bytes))
    }

    /// Parse a base64 ciphertext.
    pub fn from_base64(input: &str) -> Result<Self, CryptoError> {
        Self::from_bytes(decode("ciphertext", input)?)
    }

    /// Raw ciphertext bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Base64 form for handing back to the key owner.
    pub fn to_base64(&self) -> String {
        encode(&self.0)
    }

    /// Display fingerprint.
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.0)
    }
}

impl fmt::Debug for KemCiphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KemCiphertext({})", self.fingerprint())
    }
}

/// Raw KEM output. Not used for encryption directly.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret([u8; SHARED_SECRET_SIZE]);

impl SharedSecret {
    /// Wrap raw secret bytes, checking the length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let array = <[u8; SHARED_SECRET_SIZE]>::try_from(bytes).map_err(|_| {
            CryptoError::InvalidLength {
                what: "shared secret",
                expected: SHARED_SECRET_SIZE,
                actual: bytes.len(),
            }
        })?;
        Ok(Self(array))
    }

    /// Raw secret bytes.
    pub fn as_bytes(&self) -> &[u8; SHARED_SECRET_SIZE] {
        &self.0
    }

    /// Display fingerprint.
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.0)
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedSecret({})", self.fingerprint())
    }
}

/// AES-256-GCM key derived from a shared secret.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; SYMMETRIC_KEY_SIZE]);

impl SymmetricKey {
    /// Wrap raw key bytes.
    pub fn from_bytes(bytes: [u8; SYMMETRIC_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; SYMMETRIC_KEY_SIZE] {
        &self.0
    }

    /// Display fingerprint.
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.0)
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymmetricKey({})", self.fingerprint())
    }
}

/// Output of key generation.
#[derive(Debug)]
pub struct KeyPair {
    /// Encapsulation key to share with the peer.
    pub public_key: PublicKey,
    /// Decapsulation key kept by the owner.
    pub secret_key: SecretKey,
}

/// Output of encapsulation.
#[derive(Debug)]
pub struct Encapsulation {
    /// Ciphertext to hand back to the key owner.
    pub ciphertext: KemCiphertext,
    /// Shared secret held by the encapsulating side.
    pub shared_secret: SharedSecret,
}
