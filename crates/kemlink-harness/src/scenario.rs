//! Real session wrapper that mirrors [`ModelSession`](crate::ModelSession)'s
//! interface.
//!
//! A `Scenario` owns a [`Session`] over [`SimEnv`] and replays
//! [`Operation`]s against it the way a user would: by pasting previously
//! published text. Every operation except [`Operation::Sleep`] is followed
//! by a tick at the current virtual time. Snapshots record whether that tick
//! has run since the clock last moved.

use std::time::Duration;

use kemlink_core::{
    ExpirationPolicy, Role, Session, SessionAction, SessionError, SessionEvent, env::Environment,
};
use kemlink_crypto::encoding;
use tracing::{debug, trace};

use crate::{
    invariants::{HandshakeLineage, SystemSnapshot},
    model::ObservableState,
    operation::{MessageRef, Operation, OperationResult, Resolved},
    sim_env::{SimEnv, SimInstant},
};

/// Published handshake text and its fingerprint.
#[derive(Debug, Clone)]
struct Published {
    text: String,
    fingerprint: String,
}

/// Deterministic session driven by operations.
pub struct Scenario {
    env: SimEnv,
    session: Session<SimEnv>,
    public_keys: Vec<Published>,
    ciphertexts: Vec<Published>,
    blobs: Vec<String>,
    lineage: HandshakeLineage,
    expirations: Vec<(Role, Duration)>,
    settled: bool,
}

impl Scenario {
    /// Scenario with default lifetimes and the given RNG seed.
    pub fn new(seed: u64) -> Self {
        Self::with_policy(seed, ExpirationPolicy::default())
    }

    /// Scenario with explicit lifetimes.
    pub fn with_policy(seed: u64, policy: ExpirationPolicy) -> Self {
        let env = SimEnv::with_seed(seed);
        let session = Session::with_policy(env.clone(), policy);
        Self {
            env,
            session,
            public_keys: Vec::new(),
            ciphertexts: Vec::new(),
            blobs: Vec::new(),
            lineage: HandshakeLineage::default(),
            expirations: Vec::new(),
            settled: true,
        }
    }

    /// Apply an operation, then tick at the current time unless the
    /// operation is a [`Operation::Sleep`].
    ///
    /// Returns the operation's own result; tick output is recorded but does
    /// not affect it.
    pub fn apply(&mut self, op: &Operation) -> OperationResult {
        debug!(?op, elapsed = ?self.env.elapsed(), "applying operation");

        let result = match *op {
            Operation::GenerateKeys => self.generate_keys(),
            Operation::Encapsulate { public_key } => self.encapsulate(public_key),
            Operation::Decapsulate { ciphertext } => self.decapsulate(ciphertext),
            Operation::Encrypt { role, content } => {
                let plaintext = content.to_text();
                self.handle(SessionEvent::Encrypt { role: role.into(), plaintext })
                    .map(|actions| self.record_blobs(&actions))
            },
            Operation::Decrypt { role, blob, tamper } => {
                let ciphertext = self.blob_text(blob, tamper);
                self.handle(SessionEvent::Decrypt { role: role.into(), ciphertext }).map(drop)
            },
            Operation::SetExpiration { role, value, unit } => self
                .handle(SessionEvent::SetExpiration {
                    role: role.into(),
                    value: i64::from(value),
                    unit: unit.into(),
                })
                .map(drop),
            Operation::Stop { role } => {
                self.handle(SessionEvent::Stop { role: role.into() }).map(drop)
            },
            Operation::Clear { role } => {
                self.handle(SessionEvent::Clear { role: role.into() }).map(drop)
            },
            Operation::AdvanceTime { seconds } | Operation::Sleep { seconds } => {
                self.env.advance(Duration::from_secs(u64::from(seconds)));
                Ok(())
            },
        };

        self.settled = op.ticks();
        if self.settled {
            self.tick();
        }
        result.map_err(|e| e.kind())
    }

    /// Deliver one tick at the current virtual time.
    pub fn tick(&mut self) -> Vec<SessionAction> {
        let now = self.env.now();
        let actions = self.session.handle(SessionEvent::Tick { now }).unwrap_or_default();
        self.record_expirations(&actions);
        actions
    }

    /// Observable state for comparison with the model.
    pub fn observable(&self) -> ObservableState {
        ObservableState {
            phases: Role::ALL.map(|role| self.session.phase(role)),
            timers: Role::ALL.map(|role| self.session.registry().timer(role).is_some()),
            settings: Role::ALL.map(|role| self.session.policy().get(role)),
        }
    }

    /// Snapshot for invariant checking.
    pub fn snapshot(&self) -> SystemSnapshot {
        let mut snapshot = SystemSnapshot::capture(&self.session, self.lineage.clone());
        snapshot.settled = self.settled;
        snapshot
    }

    /// Expiries observed so far, with their virtual time.
    pub fn expirations(&self) -> &[(Role, Duration)] {
        &self.expirations
    }

    /// Blobs encrypted so far, oldest first.
    pub fn blobs(&self) -> &[String] {
        &self.blobs
    }

    /// The session under test.
    pub fn session(&self) -> &Session<SimEnv> {
        &self.session
    }

    /// The simulated environment.
    pub fn env(&self) -> &SimEnv {
        &self.env
    }

    fn handle(
        &mut self,
        event: SessionEvent<SimInstant>,
    ) -> Result<Vec<SessionAction>, SessionError> {
        let actions = self.session.handle(event)?;
        self.record_expirations(&actions);
        Ok(actions)
    }

    fn record_expirations(&mut self, actions: &[SessionAction]) {
        let at = self.env.now().since_start();
        for action in actions {
            if let SessionAction::MaterialExpired { role } = action {
                trace!(%role, ?at, "material expired");
                self.expirations.push((*role, at));
            }
        }
    }

    fn generate_keys(&mut self) -> Result<(), SessionError> {
        let actions = self.handle(SessionEvent::GenerateKeys)?;
        for action in actions {
            if let SessionAction::KeysGenerated { public_key, fingerprint } = action {
                self.public_keys.push(Published { text: public_key, fingerprint });
            }
        }
        Ok(())
    }

    fn encapsulate(&mut self, public_key: MessageRef) -> Result<(), SessionError> {
        let (text, source) = paste(public_key, &self.public_keys);
        let actions = self.handle(SessionEvent::Encapsulate { public_key: text })?;

        for action in actions {
            if let SessionAction::CiphertextReady { ciphertext, fingerprint } = action {
                self.ciphertexts.push(Published { text: ciphertext, fingerprint });
            }
        }
        self.lineage.b_encapsulated_to = source;
        Ok(())
    }

    fn decapsulate(&mut self, ciphertext: MessageRef) -> Result<(), SessionError> {
        let (text, source) = paste(ciphertext, &self.ciphertexts);
        self.handle(SessionEvent::Decapsulate { ciphertext: text })?;
        self.lineage.a_decapsulated = source;
        Ok(())
    }

    fn record_blobs(&mut self, actions: &[SessionAction]) {
        for action in actions {
            if let SessionAction::Encrypted { blob, .. } = action {
                self.blobs.push(blob.clone());
            }
        }
    }

    fn blob_text(&self, blob: MessageRef, tamper: Option<u8>) -> String {
        match blob.resolve(&self.blobs) {
            Resolved::Item(text) => match tamper {
                Some(position) => flip_bit(text, position),
                None => text.clone(),
            },
            Resolved::Garbage => MessageRef::GARBAGE.to_string(),
            Resolved::Blank => MessageRef::BLANK.to_string(),
        }
    }
}

/// Text to paste for `reference`, plus the fingerprint of the published
/// item it names.
fn paste(reference: MessageRef, history: &[Published]) -> (String, Option<String>) {
    match reference.resolve(history) {
        Resolved::Item(item) => (item.text.clone(), Some(item.fingerprint.clone())),
        Resolved::Garbage => (MessageRef::GARBAGE.to_string(), None),
        Resolved::Blank => (MessageRef::BLANK.to_string(), None),
    }
}

/// Flip one bit of a base64 blob's decoded bytes and re-encode.
fn flip_bit(blob: &str, position: u8) -> String {
    match encoding::decode("encrypted message", blob) {
        Ok(mut bytes) if !bytes.is_empty() => {
            let index = usize::from(position) % bytes.len();
            bytes[index] ^= 1 << (position % 8);
            encoding::encode(&bytes)
        },
        _ => blob.to_string(),
    }
}
