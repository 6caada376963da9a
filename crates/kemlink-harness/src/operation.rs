//! Operations for model-based testing.
//!
//! Operations represent every user-reachable action on a session. They are
//! generated randomly (by proptest or the fuzzer) and applied to both the
//! reference model and the real implementation.

use arbitrary::Arbitrary;
use kemlink_core::{DurationUnit, ErrorKind, Role};

/// Result of applying an operation: success, or the class of the failure.
pub type OperationResult = Result<(), ErrorKind>;

/// Role selector that can be generated arbitrarily.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub enum ModelRole {
    /// Initiator.
    A,
    /// Responder.
    B,
}

impl From<ModelRole> for Role {
    fn from(role: ModelRole) -> Self {
        match role {
            ModelRole::A => Role::A,
            ModelRole::B => Role::B,
        }
    }
}

/// Lifetime unit that can be generated arbitrarily.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub enum ModelUnit {
    /// Seconds.
    Seconds,
    /// Minutes.
    Minutes,
    /// Hours.
    Hours,
}

impl From<ModelUnit> for DurationUnit {
    fn from(unit: ModelUnit) -> Self {
        match unit {
            ModelUnit::Seconds => DurationUnit::Seconds,
            ModelUnit::Minutes => DurationUnit::Minutes,
            ModelUnit::Hours => DurationUnit::Hours,
        }
    }
}

/// Which previously published text an operation pastes.
///
/// Public keys, ciphertexts and blobs are kept in publication order; an
/// operation refers to one of them, to junk, or to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub enum MessageRef {
    /// Most recently published item.
    Latest,
    /// The item this many steps before the latest (wrapping).
    Earlier(u8),
    /// Well-formed base64 that is not a valid item.
    Garbage,
    /// Whitespace only.
    Blank,
}

/// A resolved [`MessageRef`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved<T> {
    /// A published item.
    Item(T),
    /// Junk input.
    Garbage,
    /// Blank input (also used when nothing was published yet).
    Blank,
}

impl MessageRef {
    /// Text pasted for [`MessageRef::Garbage`]: valid base64 of three bytes.
    pub const GARBAGE: &'static str = "AAAA";

    /// Text pasted for [`MessageRef::Blank`].
    pub const BLANK: &'static str = "  ";

    /// Resolve against a publication history, oldest first.
    pub fn resolve<T>(self, history: &[T]) -> Resolved<&T> {
        let len = history.len();
        match self {
            Self::Garbage => Resolved::Garbage,
            Self::Blank => Resolved::Blank,
            Self::Latest | Self::Earlier(_) if len == 0 => Resolved::Blank,
            Self::Latest => Resolved::Item(&history[len - 1]),
            Self::Earlier(back) => Resolved::Item(&history[len - 1 - usize::from(back) % len]),
        }
    }
}

/// Small message content for testing.
///
/// Compact representation to keep test cases small; the text is derived
/// deterministically and is never blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub struct SmallMessage {
    /// Content seed.
    pub seed: u8,
    /// Length class (0-3).
    pub size_class: u8,
}

impl SmallMessage {
    /// Message text.
    pub fn to_text(self) -> String {
        let padding = match self.size_class % 4 {
            0 => 0,
            1 => 8,
            2 => 64,
            _ => 512,
        };
        format!("msg-{}{}", self.seed, " x".repeat(padding / 2))
    }
}

/// Operations that can be applied to a session.
///
/// Operations are small and composable so proptest can explore interesting
/// combinations of handshakes, messaging and expiry.
#[derive(Debug, Clone, PartialEq, Eq, Arbitrary)]
pub enum Operation {
    /// A generates a keypair.
    GenerateKeys,

    /// B encapsulates to a published public key.
    Encapsulate {
        /// Public key to paste.
        public_key: MessageRef,
    },

    /// A decapsulates a published ciphertext.
    Decapsulate {
        /// Ciphertext to paste.
        ciphertext: MessageRef,
    },

    /// A role encrypts a message.
    Encrypt {
        /// Role whose key is used.
        role: ModelRole,
        /// Message content.
        content: SmallMessage,
    },

    /// A role decrypts a published blob.
    Decrypt {
        /// Role whose key is used.
        role: ModelRole,
        /// Blob to paste.
        blob: MessageRef,
        /// Flip a bit at this position (modulo blob length) before pasting.
        tamper: Option<u8>,
    },

    /// Configure a role's lifetime.
    SetExpiration {
        /// Role to configure.
        role: ModelRole,
        /// Requested value (may be out of range).
        value: i16,
        /// Unit.
        unit: ModelUnit,
    },

    /// Stop a role's countdown.
    Stop {
        /// Role to stop.
        role: ModelRole,
    },

    /// Clear a role.
    Clear {
        /// Role to clear.
        role: ModelRole,
    },

    /// Advance simulation time, then tick.
    AdvanceTime {
        /// Seconds to advance.
        seconds: u16,
    },

    /// Advance simulation time without ticking.
    ///
    /// Deadlines that pass here are only enforced by the next operation
    /// that touches the role, or by the next tick.
    Sleep {
        /// Seconds to advance.
        seconds: u16,
    },
}

impl Operation {
    /// True if the operation is followed by a tick.
    pub fn ticks(&self) -> bool {
        !matches!(self, Self::Sleep { .. })
    }
}
