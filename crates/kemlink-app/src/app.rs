//! Application state machine.
//!
//! This module defines the [`App`] state machine, which manages the
//! interactive state of the application completely decoupled from I/O and
//! from the session.
//!
//! This is a pure state machine: it consumes [`crate::AppEvent`] inputs and
//! produces [`crate::AppAction`] instructions for the runtime to execute.
//!
//! # Responsibilities
//!
//! - Parses input lines into commands and turns them into session intents.
//! - Mirrors each role's handshake progress and countdown in a panel.
//! - Holds one transient notification, replaced by the next and dismissed
//!   after a few ticks.

use kemlink_core::{ErrorKind, ExpirationPolicy, HandshakePhase, Role};

use crate::{
    AppAction, AppEvent,
    input::{Command, InputError},
    state::{Countdown, NOTIFICATION_TICKS, Notification, NotificationKind, RolePanel},
};

/// Application state machine.
///
/// Pure state machine that processes events and produces actions.
/// No I/O dependencies - fully testable in simulation.
#[derive(Debug, Clone)]
pub struct App {
    /// Per-role view state, indexed by [`Role::index`].
    panels: [RolePanel; 2],
    /// Current notification. `None` once dismissed.
    notification: Option<Notification>,
    /// Sequence number for the next notification.
    next_seq: u64,
}

impl App {
    /// Create an App whose panels show the given lifetimes.
    pub fn new(policy: ExpirationPolicy) -> Self {
        Self {
            panels: Role::ALL.map(|role| RolePanel::new(role, policy.get(role))),
            notification: None,
            next_seq: 0,
        }
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: AppEvent) -> Vec<AppAction> {
        match event {
            AppEvent::Input(line) => match Command::parse(&line) {
                Ok(command) => self.execute(command),
                Err(InputError::Empty) => vec![],
                Err(e) => self.error(e.to_string(), None),
            },
            AppEvent::Tick => {
                self.age_notification();
                vec![]
            },
            AppEvent::KeysGenerated { public_key, fingerprint } => {
                let panel = self.panel_mut(Role::A);
                panel.reset();
                panel.phase = HandshakePhase::KeysGenerated;
                panel.public_key = Some(public_key.clone());
                panel.material_fingerprint = Some(fingerprint);
                self.success(
                    "Keys generated successfully! Share the public key with User B.",
                    Some(public_key),
                )
            },
            AppEvent::CiphertextReady { ciphertext, fingerprint } => {
                let panel = self.panel_mut(Role::B);
                panel.reset();
                panel.ciphertext = Some(ciphertext.clone());
                panel.material_fingerprint = Some(fingerprint);
                self.success(
                    "Encapsulation successful! Send the ciphertext to User A.",
                    Some(ciphertext),
                )
            },
            AppEvent::SecretEstablished { role, fingerprint } => {
                let panel = self.panel_mut(role);
                panel.phase = HandshakePhase::SecretDerived;
                panel.secret_fingerprint = Some(fingerprint.clone());
                match role {
                    // B's completion is announced by its ciphertext.
                    Role::B => vec![AppAction::Render],
                    Role::A => self.success(
                        "Decapsulation successful! Both users now have the same shared secret.",
                        Some(format!("shared secret fingerprint {fingerprint}")),
                    ),
                }
            },
            AppEvent::Encrypted { role, blob } => {
                self.panel_mut(role).last_encrypted = Some(blob.clone());
                self.success("Message encrypted successfully!", Some(blob))
            },
            AppEvent::Decrypted { role, plaintext } => {
                self.panel_mut(role).last_decrypted = Some(plaintext.clone());
                self.success("Message decrypted successfully!", Some(plaintext))
            },
            AppEvent::CountdownStarted { role, lifetime } => {
                self.panel_mut(role).countdown = Some(Countdown::new(lifetime));
                vec![AppAction::Render]
            },
            AppEvent::CountdownUpdated { role, remaining, urgency } => {
                let panel = self.panel_mut(role);
                let previous = panel.countdown.replace(Countdown { remaining, urgency });
                match previous {
                    Some(previous) if urgency > previous.urgency => {
                        let countdown = Countdown::new(remaining);
                        let message = format!("{role} keys expire in {countdown}");
                        self.notify(NotificationKind::Info, message, None, None)
                    },
                    _ => vec![],
                }
            },
            AppEvent::Expired { role } => {
                self.panel_mut(role).reset();
                let restart = match role {
                    Role::A => "run 'gen' to start over",
                    Role::B => "run 'encap' with User A's public key to start over",
                };
                let message = format!("{role} key material expired and was wiped; {restart}");
                self.notify(NotificationKind::Info, message, None, None)
            },
            AppEvent::CountdownStopped { role, was_armed } => {
                self.panel_mut(role).countdown = None;
                let message = if was_armed {
                    format!("{role} countdown stopped; keys are kept until cleared")
                } else {
                    format!("{role} has no running countdown")
                };
                self.notify(NotificationKind::Info, message, None, None)
            },
            AppEvent::Cleared { role, had_material } => {
                self.panel_mut(role).reset();
                let message = if had_material {
                    format!("{role} keys cleared")
                } else {
                    format!("{role} has no keys to clear")
                };
                self.notify(NotificationKind::Info, message, None, None)
            },
            AppEvent::ExpirationChanged { role, setting, clamped } => {
                self.panel_mut(role).setting = setting;
                let mut message = format!("{role} keys will expire after {setting}");
                if clamped {
                    let (min, max) = setting.unit().bounds();
                    message.push_str(&format!(" (clamped to {min}-{max} {})", setting.unit()));
                }
                self.notify(NotificationKind::Info, message, None, None)
            },
            AppEvent::Error { message, kind } => self.error(message, Some(kind)),
        }
    }

    /// Turn a parsed command into actions.
    pub fn execute(&mut self, command: Command) -> Vec<AppAction> {
        match command {
            Command::Gen => vec![AppAction::GenerateKeys],
            Command::Encap { public_key } => vec![AppAction::Encapsulate { public_key }],
            Command::Decap { ciphertext } => vec![AppAction::Decapsulate { ciphertext }],
            Command::Encrypt { role, plaintext } => vec![AppAction::Encrypt { role, plaintext }],
            Command::Decrypt { role, ciphertext } => vec![AppAction::Decrypt { role, ciphertext }],
            Command::Expire { role, value, unit } => {
                vec![AppAction::SetExpiration { role, value, unit }]
            },
            Command::Stop { role } => vec![AppAction::Stop { role }],
            Command::Clear { role } => vec![AppAction::Clear { role }],
            Command::Status => vec![AppAction::ShowStatus],
            Command::Help => vec![AppAction::ShowHelp],
            Command::Quit => vec![AppAction::Quit],
        }
    }

    /// Panel of `role`.
    pub fn panel(&self, role: Role) -> &RolePanel {
        &self.panels[role.index()]
    }

    /// Both panels, A first.
    pub fn panels(&self) -> &[RolePanel; 2] {
        &self.panels
    }

    /// Current notification. `None` if there is none or it was dismissed.
    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    fn panel_mut(&mut self, role: Role) -> &mut RolePanel {
        &mut self.panels[role.index()]
    }

    fn success(&mut self, message: &str, detail: Option<String>) -> Vec<AppAction> {
        self.notify(NotificationKind::Success, message.to_string(), detail, None)
    }

    fn error(&mut self, message: String, kind: Option<ErrorKind>) -> Vec<AppAction> {
        self.notify(NotificationKind::Error, format!("Error: {message}"), None, kind)
    }

    fn notify(
        &mut self,
        kind: NotificationKind,
        message: String,
        detail: Option<String>,
        error_kind: Option<ErrorKind>,
    ) -> Vec<AppAction> {
        self.next_seq += 1;
        self.notification = Some(Notification {
            seq: self.next_seq,
            kind,
            message,
            detail,
            error_kind,
            remaining_ticks: NOTIFICATION_TICKS,
        });
        vec![AppAction::Render]
    }

    fn age_notification(&mut self) {
        if let Some(notification) = &mut self.notification {
            notification.remaining_ticks = notification.remaining_ticks.saturating_sub(1);
            if notification.remaining_ticks == 0 {
                self.notification = None;
            }
        }
    }
}
