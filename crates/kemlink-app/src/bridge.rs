//! Session-to-Application translation layer.
//!
//! The [`Bridge`] wraps the Sans-IO [`kemlink_core::Session`] and adapts it
//! to the application lifecycle.
//!
//! # Responsibilities
//!
//! - Converts [`crate::AppAction`] intents into [`SessionEvent`]s.
//! - Interprets [`SessionAction`]s and converts them back into
//!   [`crate::AppEvent`]s to update the UI.
//! - Catches every [`SessionError`] at this boundary and turns it into an
//!   error event; nothing here is fatal and nothing is retried.
//! - Passes time ticks through generically to support both real-time
//!   execution and deterministic simulation.

use kemlink_core::{
    ExpirationPolicy, Session, SessionAction, SessionError, SessionEvent, env::Environment,
};
use tracing::warn;

use crate::{AppAction, AppEvent};

/// Bridge between App and the session state machine.
///
/// Generic over Environment to support both production and simulation.
/// The Instant type is determined by the Environment's associated type.
pub struct Bridge<E: Environment> {
    session: Session<E>,
}

impl<E: Environment> Bridge<E> {
    /// Create a new Bridge with the given environment and lifetimes.
    pub fn new(env: E, policy: ExpirationPolicy) -> Self {
        Self { session: Session::with_policy(env, policy) }
    }

    /// Process an App action and return resulting App events.
    pub fn process_app_action(&mut self, action: AppAction) -> Vec<AppEvent> {
        let event = match action {
            AppAction::GenerateKeys => SessionEvent::GenerateKeys,
            AppAction::Encapsulate { public_key } => SessionEvent::Encapsulate { public_key },
            AppAction::Decapsulate { ciphertext } => SessionEvent::Decapsulate { ciphertext },
            AppAction::Encrypt { role, plaintext } => SessionEvent::Encrypt { role, plaintext },
            AppAction::Decrypt { role, ciphertext } => SessionEvent::Decrypt { role, ciphertext },
            AppAction::SetExpiration { role, value, unit } => {
                SessionEvent::SetExpiration { role, value, unit }
            },
            AppAction::Stop { role } => SessionEvent::Stop { role },
            AppAction::Clear { role } => SessionEvent::Clear { role },
            AppAction::Render | AppAction::Quit | AppAction::ShowHelp | AppAction::ShowStatus => {
                return vec![];
            },
        };

        let result = self.session.handle(event);
        Self::handle_session_result(result)
    }

    /// Process a time tick.
    pub fn handle_tick(&mut self, now: E::Instant) -> Vec<AppEvent> {
        let result = self.session.handle(SessionEvent::Tick { now });
        Self::handle_session_result(result)
    }

    /// Underlying session, for inspection.
    pub fn session(&self) -> &Session<E> {
        &self.session
    }

    fn handle_session_result(result: Result<Vec<SessionAction>, SessionError>) -> Vec<AppEvent> {
        match result {
            Ok(actions) => actions.into_iter().map(Self::translate).collect(),
            Err(e) => {
                warn!(error = %e, kind = ?e.kind(), "session operation failed");
                vec![AppEvent::Error { message: e.to_string(), kind: e.kind() }]
            },
        }
    }

    fn translate(action: SessionAction) -> AppEvent {
        match action {
            SessionAction::KeysGenerated { public_key, fingerprint } => {
                AppEvent::KeysGenerated { public_key, fingerprint }
            },
            SessionAction::CiphertextReady { ciphertext, fingerprint } => {
                AppEvent::CiphertextReady { ciphertext, fingerprint }
            },
            SessionAction::SecretEstablished { role, fingerprint } => {
                AppEvent::SecretEstablished { role, fingerprint }
            },
            SessionAction::Encrypted { role, blob } => AppEvent::Encrypted { role, blob },
            SessionAction::Decrypted { role, plaintext } => AppEvent::Decrypted { role, plaintext },
            SessionAction::TimerArmed { role, lifetime, .. } => {
                AppEvent::CountdownStarted { role, lifetime }
            },
            SessionAction::TimeRemaining { role, remaining, urgency } => {
                AppEvent::CountdownUpdated { role, remaining, urgency }
            },
            SessionAction::MaterialExpired { role } => AppEvent::Expired { role },
            SessionAction::TimerStopped { role, was_armed } => {
                AppEvent::CountdownStopped { role, was_armed }
            },
            SessionAction::MaterialCleared { role, had_material } => {
                AppEvent::Cleared { role, had_material }
            },
            SessionAction::ExpirationConfigured { role, setting, clamped } => {
                AppEvent::ExpirationChanged { role, setting, clamped }
            },
        }
    }
}
