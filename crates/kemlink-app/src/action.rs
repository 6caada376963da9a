//! Application side-effects and intents.
//!
//! This module defines the [`AppAction`] enum, which represents instructions
//! produced by the [`crate::App`] state machine for the runtime to execute.

use kemlink_core::{DurationUnit, Role};

/// Actions produced by the App state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    /// Render the UI.
    Render,

    /// Quit the application.
    Quit,

    /// Show command usage.
    ShowHelp,

    /// Show both role panels.
    ShowStatus,

    /// Generate A's keypair.
    GenerateKeys,

    /// B encapsulates to a public key.
    Encapsulate {
        /// Public key as typed.
        public_key: String,
    },

    /// A decapsulates a ciphertext.
    Decapsulate {
        /// Ciphertext as typed.
        ciphertext: String,
    },

    /// Encrypt a message.
    Encrypt {
        /// Role whose key is used.
        role: Role,
        /// Message text.
        plaintext: String,
    },

    /// Decrypt a blob.
    Decrypt {
        /// Role whose key is used.
        role: Role,
        /// Blob as typed.
        ciphertext: String,
    },

    /// Change a role's lifetime.
    SetExpiration {
        /// Role to configure.
        role: Role,
        /// Requested value.
        value: i64,
        /// Unit of `value`.
        unit: DurationUnit,
    },

    /// Stop a role's countdown.
    Stop {
        /// Role to stop.
        role: Role,
    },

    /// Wipe a role's material.
    Clear {
        /// Role to clear.
        role: Role,
    },
}

impl AppAction {
    /// True if the action must be routed through the session.
    pub fn is_session_action(&self) -> bool {
        !matches!(self, Self::Render | Self::Quit | Self::ShowHelp | Self::ShowStatus)
    }
}
