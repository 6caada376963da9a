//! Error types for cryptographic operations

use thiserror::Error;

/// Errors from the key-encapsulation module and the cipher engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Input was not valid standard base64
    #[error("invalid {what} encoding: {reason}")]
    InvalidEncoding {
        /// Which input was malformed
        what: &'static str,
        /// Decoder message
        reason: String,
    },

    /// Decoded input had the wrong size for its type
    #[error("invalid {what} length: expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// Which input was malformed
        what: &'static str,
        /// Required length in bytes
        expected: usize,
        /// Length actually supplied
        actual: usize,
    },

    /// Encrypted blob is too short to contain a nonce
    #[error("malformed encrypted message: {actual} bytes, need at least {minimum}")]
    MalformedBlob {
        /// Length of the supplied blob
        actual: usize,
        /// Minimum acceptable length
        minimum: usize,
    },

    /// AEAD tag did not verify (tampering or wrong key)
    #[error("authentication failed")]
    AuthenticationFailed,

    /// KEM primitive rejected well-formed input
    #[error("{operation} failed")]
    KemFailure {
        /// Operation that failed
        operation: &'static str,
    },

    /// AEAD encryption rejected the input
    #[error("encryption failed")]
    EncryptionFailed,
}

impl CryptoError {
    /// Returns true if the error came from opening an encrypted blob.
    ///
    /// Such failures indicate tampering or a mismatched key. Retrying with
    /// the same key and blob cannot succeed.
    pub fn is_cipher_failure(&self) -> bool {
        matches!(self, Self::MalformedBlob { .. } | Self::AuthenticationFailed)
    }
}
