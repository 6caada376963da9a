//! Session events and actions.

use std::time::Duration;

use crate::{DurationUnit, ExpirationSetting, Role, TimerHandle, Urgency};

/// Events the caller feeds into the session.
///
/// The caller is responsible for:
/// - Driving time forward via ticks
/// - Forwarding user intents (generate keys, encrypt, ...)
///
/// Generic over `I` (Instant type) to support both production
/// (`std::time::Instant`) and simulation (virtual) clocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent<I = std::time::Instant> {
    /// Time tick for countdowns and expiry.
    ///
    /// The caller should send ticks at least once per scheduler period.
    Tick {
        /// Current time from the environment.
        now: I,
    },

    /// Role A generates a fresh keypair.
    GenerateKeys,

    /// Role B encapsulates to A's public key.
    Encapsulate {
        /// Base64 public key as pasted by the user.
        public_key: String,
    },

    /// Role A decapsulates B's ciphertext.
    Decapsulate {
        /// Base64 ciphertext as pasted by the user.
        ciphertext: String,
    },

    /// Encrypt a message under a role's key.
    Encrypt {
        /// Role whose key is used.
        role: Role,
        /// Message text.
        plaintext: String,
    },

    /// Decrypt a blob under a role's key.
    Decrypt {
        /// Role whose key is used.
        role: Role,
        /// Base64 blob as pasted by the user.
        ciphertext: String,
    },

    /// Change a role's lifetime for its next arming.
    SetExpiration {
        /// Role to configure.
        role: Role,
        /// Requested value, clamped to the unit's bounds.
        value: i64,
        /// Unit of `value`.
        unit: DurationUnit,
    },

    /// Cancel a role's countdown, keeping its material.
    Stop {
        /// Role to stop.
        role: Role,
    },

    /// Wipe a role's material and cancel its countdown.
    Clear {
        /// Role to clear.
        role: Role,
    },
}

/// Actions produced by the session for the caller to render.
///
/// Secret material never appears here: shared secrets and symmetric keys
/// are represented by fingerprints only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Role A generated a keypair.
    KeysGenerated {
        /// Base64 public key to share with B.
        public_key: String,
        /// Short fingerprint of the public key.
        fingerprint: String,
    },

    /// Role B produced a ciphertext for A.
    CiphertextReady {
        /// Base64 ciphertext to share with A.
        ciphertext: String,
        /// Short fingerprint of the ciphertext.
        fingerprint: String,
    },

    /// A role derived its symmetric key.
    SecretEstablished {
        /// Role that completed its handshake step.
        role: Role,
        /// Fingerprint of the shared secret; equal on both sides on success.
        fingerprint: String,
    },

    /// Encryption succeeded.
    Encrypted {
        /// Role whose key was used.
        role: Role,
        /// Base64 `nonce || ciphertext || tag`.
        blob: String,
    },

    /// Decryption succeeded.
    Decrypted {
        /// Role whose key was used.
        role: Role,
        /// Recovered message text.
        plaintext: String,
    },

    /// A countdown was (re)armed.
    TimerArmed {
        /// Owning role.
        role: Role,
        /// Arming cycle identity.
        handle: TimerHandle,
        /// Time until expiry.
        lifetime: Duration,
    },

    /// Periodic remaining-time observation.
    TimeRemaining {
        /// Owning role.
        role: Role,
        /// Time until expiry.
        remaining: Duration,
        /// Display urgency.
        urgency: Urgency,
    },

    /// A role's deadline was reached and its material wiped.
    MaterialExpired {
        /// Wiped role.
        role: Role,
    },

    /// A role's countdown was cancelled by the user.
    TimerStopped {
        /// Owning role.
        role: Role,
        /// False if no countdown was running.
        was_armed: bool,
    },

    /// A role's material was wiped by the user.
    MaterialCleared {
        /// Wiped role.
        role: Role,
        /// False if the role was already empty.
        had_material: bool,
    },

    /// A role's lifetime setting changed.
    ExpirationConfigured {
        /// Configured role.
        role: Role,
        /// Effective (clamped) setting.
        setting: ExpirationSetting,
        /// True if the requested value was out of range.
        clamped: bool,
    },
}
