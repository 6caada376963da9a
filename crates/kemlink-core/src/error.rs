//! Error types for session operations.
//!
//! Every failure is recoverable: the session stays usable for both roles and
//! nothing is retried automatically. [`SessionError::kind`] maps each variant
//! onto the four user-facing categories.

use kemlink_crypto::CryptoError;
use thiserror::Error;

use crate::Role;

/// User-facing error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Empty or missing required input. User corrects and retries.
    Validation,
    /// A cryptographic primitive rejected its input.
    CryptoOperation,
    /// Messaging attempted without an established key.
    NoKeyEstablished,
    /// Decryption failed authentication or the blob was malformed.
    ///
    /// Never retried: the same key and blob cannot succeed, and a retry
    /// could mask tampering.
    CipherFailure,
}

/// Errors from handshake and messaging operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Encapsulation requested without a public key
    #[error("paste User A's public key first")]
    MissingPublicKey,

    /// Decapsulation requested without a ciphertext
    #[error("paste the ciphertext from User B first")]
    MissingCiphertext,

    /// Decapsulation requested before keys were generated
    #[error("{role} has no secret key; generate keys first")]
    MissingSecretKey {
        /// Role that attempted decapsulation
        role: Role,
    },

    /// Required text input was empty after trimming
    #[error("enter a {field} first")]
    EmptyInput {
        /// Which input was empty
        field: &'static str,
    },

    /// The key-encapsulation module or cipher rejected its input
    #[error("failed to {operation}: {source}")]
    CryptoOperation {
        /// Operation that failed
        operation: &'static str,
        /// Underlying primitive error
        #[source]
        source: CryptoError,
    },

    /// No symmetric key for the role (never established, or expired)
    #[error("{role} has no key; complete the key exchange first")]
    NoKeyEstablished {
        /// Role that attempted to use the key
        role: Role,
    },

    /// Decryption failed: tampered blob, malformed blob, or mismatched key
    #[error("failed to decrypt: {source}")]
    CipherFailure {
        /// Underlying cipher error
        #[source]
        source: CryptoError,
    },
}

impl SessionError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingPublicKey
            | Self::MissingCiphertext
            | Self::MissingSecretKey { .. }
            | Self::EmptyInput { .. } => ErrorKind::Validation,
            Self::CryptoOperation { .. } => ErrorKind::CryptoOperation,
            Self::NoKeyEstablished { .. } => ErrorKind::NoKeyEstablished,
            Self::CipherFailure { .. } => ErrorKind::CipherFailure,
        }
    }

    /// Returns true if retrying the same request could succeed.
    ///
    /// Only validation errors qualify, and only once the user supplies the
    /// missing input. Cipher failures are never retryable.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }
}
