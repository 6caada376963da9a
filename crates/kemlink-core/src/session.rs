//! Session state machine.
//!
//! The `Session` owns the registry, the scheduler, the handshake coordinator
//! and the messaging gate, and exposes them through a single
//! event-in/actions-out entry point.
//!
//! # Expiry enforcement
//!
//! Deadlines are enforced at two points: on every [`SessionEvent::Tick`],
//! and immediately before every encrypt or decrypt. The second check means
//! a key is never used past its deadline even if the driver's ticks lag.
//! An expiry detected outside a tick is reported on the next tick.

use std::time::Duration;

use kemlink_crypto::{
    AesGcmCipher, ENCAPSULATION_SEED_SIZE, KEYGEN_SEED_SIZE, KeyEncapsulation, MlKem768Kem,
    NONCE_SIZE, SymmetricCipher,
};
use tracing::{debug, info};

use crate::{
    DurationUnit, ExpirationPolicy, ExpirationScheduler, ExpirationSetting, HandshakeCoordinator,
    HandshakePhase, MessagingGate, Role, SessionAction, SessionError, SessionEvent,
    SessionRegistry, Urgency,
    env::Environment,
    scheduler::{self, Tick},
};

/// Read-only snapshot of one role for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleView {
    /// Role described.
    pub role: Role,
    /// Handshake progress.
    pub phase: HandshakePhase,
    /// Base64 public key (A only).
    pub public_key: Option<String>,
    /// Base64 ciphertext (B only).
    pub ciphertext: Option<String>,
    /// Fingerprint of the shared secret.
    pub shared_secret_fingerprint: Option<String>,
    /// Fingerprint of the symmetric key.
    pub key_fingerprint: Option<String>,
    /// Time until expiry. `None` if no countdown is running.
    pub remaining: Option<Duration>,
    /// Urgency of `remaining`.
    pub urgency: Option<Urgency>,
    /// Lifetime the next arming will use.
    pub setting: ExpirationSetting,
}

/// Two-role key-exchange session.
///
/// Generic over the environment, the KEM and the cipher engine. The
/// defaults are the production primitives.
pub struct Session<E: Environment, K = MlKem768Kem, C = AesGcmCipher> {
    env: E,
    registry: SessionRegistry<E::Instant>,
    scheduler: ExpirationScheduler,
    coordinator: HandshakeCoordinator<K>,
    gate: MessagingGate<C>,
    policy: ExpirationPolicy,
    /// Expiries detected outside a tick, reported on the next tick.
    deferred: Vec<SessionAction>,
}

impl<E: Environment> Session<E> {
    /// Session with default lifetimes and the production primitives.
    pub fn new(env: E) -> Self {
        Self::with_policy(env, ExpirationPolicy::default())
    }

    /// Session with explicit lifetimes and the production primitives.
    pub fn with_policy(env: E, policy: ExpirationPolicy) -> Self {
        Self::with_collaborators(env, policy, MlKem768Kem, AesGcmCipher)
    }
}

impl<E, K, C> Session<E, K, C>
where
    E: Environment,
    K: KeyEncapsulation,
    C: SymmetricCipher,
{
    /// Session over custom cryptographic collaborators.
    pub fn with_collaborators(env: E, policy: ExpirationPolicy, kem: K, cipher: C) -> Self {
        Self {
            env,
            registry: SessionRegistry::new(),
            scheduler: ExpirationScheduler::new(),
            coordinator: HandshakeCoordinator::new(kem),
            gate: MessagingGate::new(cipher),
            policy,
            deferred: Vec::new(),
        }
    }

    /// Replace the scheduler (e.g. a custom observation period).
    #[must_use]
    pub fn with_scheduler(mut self, scheduler: ExpirationScheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Process an event and return resulting actions.
    ///
    /// On error the session is unchanged except for expiries enforced before
    /// a messaging request.
    pub fn handle(
        &mut self,
        event: SessionEvent<E::Instant>,
    ) -> Result<Vec<SessionAction>, SessionError> {
        match event {
            SessionEvent::Tick { now } => Ok(self.handle_tick(now)),
            SessionEvent::GenerateKeys => self.handle_generate_keys(),
            SessionEvent::Encapsulate { public_key } => self.handle_encapsulate(&public_key),
            SessionEvent::Decapsulate { ciphertext } => self.handle_decapsulate(&ciphertext),
            SessionEvent::Encrypt { role, plaintext } => self.handle_encrypt(role, &plaintext),
            SessionEvent::Decrypt { role, ciphertext } => self.handle_decrypt(role, &ciphertext),
            SessionEvent::SetExpiration { role, value, unit } => {
                Ok(self.handle_set_expiration(role, value, unit))
            },
            SessionEvent::Stop { role } => Ok(self.handle_stop(role)),
            SessionEvent::Clear { role } => Ok(self.handle_clear(role)),
        }
    }

    fn handle_tick(&mut self, now: E::Instant) -> Vec<SessionAction> {
        let mut actions = std::mem::take(&mut self.deferred);

        for (role, tick) in self.scheduler.poll_all(&mut self.registry, now) {
            actions.push(match tick {
                Tick::Remaining { remaining, urgency } => {
                    SessionAction::TimeRemaining { role, remaining, urgency }
                },
                Tick::Expired => SessionAction::MaterialExpired { role },
            });
        }

        actions
    }

    fn handle_generate_keys(&mut self) -> Result<Vec<SessionAction>, SessionError> {
        let seed: [u8; KEYGEN_SEED_SIZE] = self.env.random_array();
        let lifetime = self.policy.lifetime(Role::A);
        let timer = self.coordinator.generate_keys(
            &mut self.registry,
            &self.scheduler,
            lifetime,
            self.env.now(),
            &seed,
        )?;
        self.take_deferred_expiry(Role::A);

        let mut actions = Vec::with_capacity(2);
        if let Some(public_key) = self.registry.state(Role::A).public_key() {
            actions.push(SessionAction::KeysGenerated {
                public_key: public_key.to_base64(),
                fingerprint: public_key.fingerprint(),
            });
        }
        actions.push(SessionAction::TimerArmed { role: Role::A, handle: timer.handle, lifetime });
        Ok(actions)
    }

    fn handle_encapsulate(&mut self, public_key: &str) -> Result<Vec<SessionAction>, SessionError> {
        let seed: [u8; ENCAPSULATION_SEED_SIZE] = self.env.random_array();
        let lifetime = self.policy.lifetime(Role::B);
        let timer = self.coordinator.encapsulate(
            &mut self.registry,
            &self.scheduler,
            lifetime,
            self.env.now(),
            public_key,
            &seed,
        )?;
        self.take_deferred_expiry(Role::B);

        let mut actions = Vec::with_capacity(3);
        if let Some(ciphertext) = self.registry.state(Role::B).ciphertext() {
            actions.push(SessionAction::CiphertextReady {
                ciphertext: ciphertext.to_base64(),
                fingerprint: ciphertext.fingerprint(),
            });
        }
        actions.extend(self.secret_established(Role::B));
        actions.push(SessionAction::TimerArmed { role: Role::B, handle: timer.handle, lifetime });
        Ok(actions)
    }

    fn handle_decapsulate(&mut self, ciphertext: &str) -> Result<Vec<SessionAction>, SessionError> {
        self.enforce_deadline(Role::A);
        self.coordinator.decapsulate(&mut self.registry, ciphertext)?;
        Ok(self.secret_established(Role::A).into_iter().collect())
    }

    fn handle_encrypt(
        &mut self,
        role: Role,
        plaintext: &str,
    ) -> Result<Vec<SessionAction>, SessionError> {
        self.enforce_deadline(role);
        let nonce: [u8; NONCE_SIZE] = self.env.random_array();
        let blob = self.gate.encrypt(&self.registry, role, plaintext, nonce)?;
        Ok(vec![SessionAction::Encrypted { role, blob }])
    }

    fn handle_decrypt(
        &mut self,
        role: Role,
        ciphertext: &str,
    ) -> Result<Vec<SessionAction>, SessionError> {
        self.enforce_deadline(role);
        let plaintext = self.gate.decrypt(&self.registry, role, ciphertext)?;
        Ok(vec![SessionAction::Decrypted { role, plaintext }])
    }

    fn handle_set_expiration(
        &mut self,
        role: Role,
        value: i64,
        unit: DurationUnit,
    ) -> Vec<SessionAction> {
        let setting = ExpirationSetting::new(value, unit);
        let clamped = i64::try_from(setting.value()) != Ok(value);
        self.policy.set(role, setting);

        debug!(%role, %setting, clamped, "expiration configured");
        vec![SessionAction::ExpirationConfigured { role, setting, clamped }]
    }

    fn handle_stop(&mut self, role: Role) -> Vec<SessionAction> {
        self.enforce_deadline(role);
        let mut actions: Vec<_> = self.take_deferred_expiry(role).into_iter().collect();

        let was_armed = self.scheduler.disarm(&mut self.registry, role).is_some();
        actions.push(SessionAction::TimerStopped { role, was_armed });
        actions
    }

    fn handle_clear(&mut self, role: Role) -> Vec<SessionAction> {
        self.enforce_deadline(role);
        let mut actions: Vec<_> = self.take_deferred_expiry(role).into_iter().collect();

        let had_material = self.registry.clear(role);
        if had_material {
            info!(%role, "key material cleared");
        }
        actions.push(SessionAction::MaterialCleared { role, had_material });
        actions
    }

    /// Wipe `role` now if its deadline has passed.
    fn enforce_deadline(&mut self, role: Role) {
        let now = self.env.now();
        let due = self
            .registry
            .expiration_deadline(role)
            .is_some_and(|deadline| scheduler::tick(deadline, now) == Tick::Expired);

        if due && self.scheduler.poll(&mut self.registry, role, now) == Some(Tick::Expired) {
            self.deferred.push(SessionAction::MaterialExpired { role });
        }
    }

    /// Remove a pending expiry for `role`, if one was deferred.
    fn take_deferred_expiry(&mut self, role: Role) -> Option<SessionAction> {
        let expired = SessionAction::MaterialExpired { role };
        let index = self.deferred.iter().position(|action| *action == expired)?;
        Some(self.deferred.remove(index))
    }

    fn secret_established(&self, role: Role) -> Option<SessionAction> {
        let shared_secret = self.registry.state(role).material()?.shared_secret()?;
        Some(SessionAction::SecretEstablished { role, fingerprint: shared_secret.fingerprint() })
    }

    /// Snapshot of `role` at the environment's current time.
    pub fn view(&self, role: Role) -> RoleView {
        let state = self.registry.state(role);
        let remaining = self.scheduler.remaining(&self.registry, role, self.env.now());

        RoleView {
            role,
            phase: HandshakePhase::of(state),
            public_key: state.public_key().map(|pk| pk.to_base64()),
            ciphertext: state.ciphertext().map(|ct| ct.to_base64()),
            shared_secret_fingerprint: state
                .material()
                .and_then(|m| m.shared_secret())
                .map(|ss| ss.fingerprint()),
            key_fingerprint: state.symmetric_key().map(|k| k.fingerprint()),
            remaining,
            urgency: remaining.map(Urgency::from_remaining),
            setting: self.policy.get(role),
        }
    }

    /// Handshake phase of `role`.
    pub fn phase(&self, role: Role) -> HandshakePhase {
        HandshakePhase::of(self.registry.state(role))
    }

    /// Underlying registry.
    pub fn registry(&self) -> &SessionRegistry<E::Instant> {
        &self.registry
    }

    /// Current lifetime settings.
    pub fn policy(&self) -> &ExpirationPolicy {
        &self.policy
    }

    /// Environment the session draws time and randomness from.
    pub fn env(&self) -> &E {
        &self.env
    }
}
