//! Application input events.
//!
//! This module defines [`AppEvent`], the set of inputs that drive the
//! [`crate::App`] state machine.
//!
//! Events originate from two distinct sources:
//! - User input lines and periodic ticks from the driver.
//! - Session outcomes translated by the [`crate::Bridge`].

use std::time::Duration;

use kemlink_core::{ErrorKind, ExpirationSetting, Role, Urgency};

/// Events processed by the App state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// One line of user input.
    Input(String),

    /// Periodic tick.
    Tick,

    /// A's keypair is ready.
    KeysGenerated {
        /// Base64 public key for B.
        public_key: String,
        /// Short fingerprint of the public key.
        fingerprint: String,
    },

    /// B's ciphertext is ready.
    CiphertextReady {
        /// Base64 ciphertext for A.
        ciphertext: String,
        /// Short fingerprint of the ciphertext.
        fingerprint: String,
    },

    /// A role derived its symmetric key.
    SecretEstablished {
        /// Role that completed.
        role: Role,
        /// Shared-secret fingerprint.
        fingerprint: String,
    },

    /// A message was encrypted.
    Encrypted {
        /// Role whose key was used.
        role: Role,
        /// Base64 blob.
        blob: String,
    },

    /// A blob was decrypted.
    Decrypted {
        /// Role whose key was used.
        role: Role,
        /// Recovered text.
        plaintext: String,
    },

    /// A countdown started.
    CountdownStarted {
        /// Owning role.
        role: Role,
        /// Full lifetime.
        lifetime: Duration,
    },

    /// A countdown moved.
    CountdownUpdated {
        /// Owning role.
        role: Role,
        /// Time until expiry.
        remaining: Duration,
        /// Display urgency.
        urgency: Urgency,
    },

    /// A role's material expired and was wiped.
    Expired {
        /// Wiped role.
        role: Role,
    },

    /// A countdown was stopped by the user.
    CountdownStopped {
        /// Owning role.
        role: Role,
        /// False if nothing was running.
        was_armed: bool,
    },

    /// A role was cleared by the user.
    Cleared {
        /// Cleared role.
        role: Role,
        /// False if the role was already empty.
        had_material: bool,
    },

    /// A role's lifetime setting changed.
    ExpirationChanged {
        /// Configured role.
        role: Role,
        /// Effective setting.
        setting: ExpirationSetting,
        /// True if the requested value was clamped.
        clamped: bool,
    },

    /// A requested operation failed.
    Error {
        /// User-facing message.
        message: String,
        /// Error class.
        kind: ErrorKind,
    },
}
