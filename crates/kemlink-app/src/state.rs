//! Observable application state types.
//!
//! These structures are the view model of the application: the subset of
//! session state needed for display, without the key material itself.
//! Secrets appear only as fingerprints.

use std::{fmt, time::Duration};

use kemlink_core::{ErrorKind, ExpirationSetting, HandshakePhase, Role, Urgency};

/// Ticks a notification stays visible.
pub const NOTIFICATION_TICKS: u32 = 4;

/// Notification category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// An operation succeeded.
    Success,
    /// An operation failed.
    Error,
    /// Neutral information (expiry, configuration).
    Info,
}

/// Transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Monotonic sequence number, so drivers can tell new from seen.
    pub seq: u64,
    /// Category.
    pub kind: NotificationKind,
    /// Headline.
    pub message: String,
    /// Output to show under the headline (public key, blob, plaintext).
    pub detail: Option<String>,
    /// Error class, for error notifications raised by the session.
    pub error_kind: Option<ErrorKind>,
    /// Ticks left before the notification is dismissed.
    pub remaining_ticks: u32,
}

/// Remaining lifetime of a role's countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    /// Time until expiry.
    pub remaining: Duration,
    /// Display urgency.
    pub urgency: Urgency,
}

impl Countdown {
    /// Countdown with urgency derived from `remaining`.
    pub fn new(remaining: Duration) -> Self {
        Self { remaining, urgency: Urgency::from_remaining(remaining) }
    }
}

/// Formats as `MM:SS`, or `H:MM:SS` from one hour up.
impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.remaining.as_secs();
        let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
        if hours > 0 {
            write!(f, "{hours}:{minutes:02}:{seconds:02}")
        } else {
            write!(f, "{minutes:02}:{seconds:02}")
        }
    }
}

/// Display label of an urgency level.
pub fn urgency_label(urgency: Urgency) -> &'static str {
    match urgency {
        Urgency::Normal => "normal",
        Urgency::Warning => "warning",
        Urgency::Critical => "critical",
    }
}

/// Per-role view state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePanel {
    /// Role described.
    pub role: Role,
    /// Handshake progress as last reported.
    pub phase: HandshakePhase,
    /// A's public key for sharing.
    pub public_key: Option<String>,
    /// B's ciphertext for sharing.
    pub ciphertext: Option<String>,
    /// Fingerprint of the public key (A) or ciphertext (B).
    pub material_fingerprint: Option<String>,
    /// Shared-secret fingerprint.
    pub secret_fingerprint: Option<String>,
    /// Running countdown. `None` if stopped or never armed.
    pub countdown: Option<Countdown>,
    /// Lifetime the next arming will use.
    pub setting: ExpirationSetting,
    /// Last blob this role produced.
    pub last_encrypted: Option<String>,
    /// Last plaintext this role recovered.
    pub last_decrypted: Option<String>,
}

impl RolePanel {
    /// Empty panel.
    pub fn new(role: Role, setting: ExpirationSetting) -> Self {
        Self {
            role,
            phase: HandshakePhase::Empty,
            public_key: None,
            ciphertext: None,
            material_fingerprint: None,
            secret_fingerprint: None,
            countdown: None,
            setting,
            last_encrypted: None,
            last_decrypted: None,
        }
    }

    /// Drop everything derived from key material, keeping the setting.
    pub fn reset(&mut self) {
        *self = Self::new(self.role, self.setting);
    }

    /// True if the panel shows any handshake material.
    pub fn has_material(&self) -> bool {
        self.phase != HandshakePhase::Empty
    }
}
