//! Reference model of the session.
//!
//! The model tracks handshake messages by identity instead of bytes: each
//! published public key, ciphertext and blob gets a number, and a symmetric
//! key is identified by the handshake messages it came from. This is the
//! oracle the real session is compared against.

use std::collections::HashMap;

use kemlink_core::{ErrorKind, ExpirationPolicy, ExpirationSetting, HandshakePhase, Role};

use crate::operation::{MessageRef, Operation, OperationResult, Resolved};

/// Identity of a derived symmetric key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKey {
    /// Secret shared by the encapsulation that produced this ciphertext.
    Shared {
        /// Ciphertext identity.
        ciphertext: u64,
    },
    /// Implicit-rejection secret from decapsulating a ciphertext made for a
    /// different public key.
    Rejected {
        /// A's public key identity at decapsulation.
        public_key: u64,
        /// Ciphertext identity.
        ciphertext: u64,
    },
}

/// Model state of one role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelRoleState {
    /// A's public key identity.
    pub public_key: Option<u64>,
    /// B's ciphertext identity.
    pub ciphertext: Option<u64>,
    /// Derived key identity.
    pub key: Option<ModelKey>,
    /// Deadline in whole seconds since start. `None` if no countdown.
    pub deadline: Option<u64>,
}

impl ModelRoleState {
    /// Phase implied by the held material.
    pub fn phase(&self) -> HandshakePhase {
        if self.key.is_some() {
            HandshakePhase::SecretDerived
        } else if self.public_key.is_some() || self.ciphertext.is_some() {
            HandshakePhase::KeysGenerated
        } else {
            HandshakePhase::Empty
        }
    }
}

/// Observable state for oracle comparison.
///
/// This is the subset of session state that can be compared against the
/// real implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObservableState {
    /// Phase per role.
    pub phases: [HandshakePhase; 2],
    /// Countdown armed per role.
    pub timers: [bool; 2],
    /// Effective lifetime setting per role.
    pub settings: [ExpirationSetting; 2],
}

/// Reference model of a two-role session.
#[derive(Debug, Clone)]
pub struct ModelSession {
    roles: [ModelRoleState; 2],
    policy: ExpirationPolicy,
    now: u64,
    public_keys: Vec<u64>,
    ciphertexts: Vec<u64>,
    /// Key each blob was encrypted under, in publication order.
    blobs: Vec<ModelKey>,
    /// Public key each ciphertext was made for.
    ciphertext_targets: HashMap<u64, u64>,
    next_id: u64,
}

impl ModelSession {
    /// Empty model with the given lifetimes.
    pub fn new(policy: ExpirationPolicy) -> Self {
        Self {
            roles: Default::default(),
            policy,
            now: 0,
            public_keys: Vec::new(),
            ciphertexts: Vec::new(),
            blobs: Vec::new(),
            ciphertext_targets: HashMap::new(),
            next_id: 0,
        }
    }

    /// Model state of `role`.
    pub fn role(&self, role: Role) -> &ModelRoleState {
        &self.roles[role.index()]
    }

    /// Seconds elapsed since start.
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Observable state.
    pub fn observable(&self) -> ObservableState {
        ObservableState {
            phases: Role::ALL.map(|role| self.role(role).phase()),
            timers: Role::ALL.map(|role| self.role(role).deadline.is_some()),
            settings: Role::ALL.map(|role| self.policy.get(role)),
        }
    }

    /// Apply an operation, expiring every due role before and after it.
    ///
    /// [`Operation::Sleep`] only moves the clock; due roles stay as they are
    /// until the next operation. This is the main entry point for
    /// model-based testing. The result should match the real
    /// implementation's result.
    pub fn apply(&mut self, op: &Operation) -> OperationResult {
        if let Operation::Sleep { seconds } = *op {
            self.now += u64::from(seconds);
            return Ok(());
        }
        self.expire_due();

        let result = match *op {
            Operation::GenerateKeys => {
                let id = self.next_id();
                self.public_keys.push(id);
                let deadline = self.deadline(Role::A);
                *self.role_mut(Role::A) = ModelRoleState {
                    public_key: Some(id),
                    deadline: Some(deadline),
                    ..ModelRoleState::default()
                };
                Ok(())
            },
            Operation::Encapsulate { public_key } => self.apply_encapsulate(public_key),
            Operation::Decapsulate { ciphertext } => self.apply_decapsulate(ciphertext),
            Operation::Encrypt { role, .. } => {
                let key = self.role(role.into()).key.ok_or(ErrorKind::NoKeyEstablished)?;
                self.blobs.push(key);
                Ok(())
            },
            Operation::Decrypt { role, blob, tamper } => {
                let key = self.role(role.into()).key.ok_or(ErrorKind::NoKeyEstablished)?;
                match blob.resolve(&self.blobs) {
                    Resolved::Blank => Err(ErrorKind::Validation),
                    Resolved::Garbage => Err(ErrorKind::CipherFailure),
                    Resolved::Item(_) if tamper.is_some() => Err(ErrorKind::CipherFailure),
                    Resolved::Item(sealed) if *sealed == key => Ok(()),
                    Resolved::Item(_) => Err(ErrorKind::CipherFailure),
                }
            },
            Operation::SetExpiration { role, value, unit } => {
                self.policy.set(role.into(), ExpirationSetting::new(i64::from(value), unit.into()));
                Ok(())
            },
            Operation::Stop { role } => {
                self.role_mut(role.into()).deadline = None;
                Ok(())
            },
            Operation::Clear { role } => {
                *self.role_mut(role.into()) = ModelRoleState::default();
                Ok(())
            },
            Operation::AdvanceTime { seconds } | Operation::Sleep { seconds } => {
                self.now += u64::from(seconds);
                Ok(())
            },
        };

        self.expire_due();
        result
    }

    fn apply_encapsulate(&mut self, public_key: MessageRef) -> OperationResult {
        let target = match public_key.resolve(&self.public_keys) {
            Resolved::Blank => return Err(ErrorKind::Validation),
            Resolved::Garbage => return Err(ErrorKind::CryptoOperation),
            Resolved::Item(id) => *id,
        };

        let ciphertext = self.next_id();
        self.ciphertexts.push(ciphertext);
        self.ciphertext_targets.insert(ciphertext, target);
        let deadline = self.deadline(Role::B);
        *self.role_mut(Role::B) = ModelRoleState {
            ciphertext: Some(ciphertext),
            key: Some(ModelKey::Shared { ciphertext }),
            deadline: Some(deadline),
            ..ModelRoleState::default()
        };
        Ok(())
    }

    fn apply_decapsulate(&mut self, ciphertext: MessageRef) -> OperationResult {
        let resolved = ciphertext.resolve(&self.ciphertexts).map_item(|id| *id);
        if resolved == Resolved::Blank {
            return Err(ErrorKind::Validation);
        }
        let public_key = self.role(Role::A).public_key.ok_or(ErrorKind::Validation)?;
        let Resolved::Item(ciphertext) = resolved else {
            return Err(ErrorKind::CryptoOperation);
        };

        let key = if self.ciphertext_targets.get(&ciphertext) == Some(&public_key) {
            ModelKey::Shared { ciphertext }
        } else {
            ModelKey::Rejected { public_key, ciphertext }
        };
        self.role_mut(Role::A).key = Some(key);
        Ok(())
    }

    fn expire_due(&mut self) {
        let now = self.now;
        for state in &mut self.roles {
            if state.deadline.is_some_and(|deadline| deadline <= now) {
                *state = ModelRoleState::default();
            }
        }
    }

    fn deadline(&self, role: Role) -> u64 {
        self.now + self.policy.lifetime(role).as_secs()
    }

    fn role_mut(&mut self, role: Role) -> &mut ModelRoleState {
        &mut self.roles[role.index()]
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl<T> Resolved<T> {
    /// Map the published item, keeping the other cases.
    pub fn map_item<U>(self, f: impl FnOnce(T) -> U) -> Resolved<U> {
        match self {
            Resolved::Item(item) => Resolved::Item(f(item)),
            Resolved::Garbage => Resolved::Garbage,
            Resolved::Blank => Resolved::Blank,
        }
    }
}
