//! Per-role session records.
//!
//! The [`SessionRegistry`] owns one [`SessionState`] per [`Role`] for the
//! life of the process. Records are reset, never removed.
//!
//! # Invariants
//!
//! - Deadline and timer handle live in one [`ArmedTimer`], so they are set
//!   and cleared together
//! - At most one armed timer per role; installing a timer replaces the old one
//! - Every mutation is scoped to a single role
//! - Secret material is zeroized when dropped from a record

use kemlink_crypto::{KemCiphertext, KeyPair, PublicKey, SharedSecret, SymmetricKey};

use crate::{Role, env::Timestamp};

/// Handshake material held by a role.
#[derive(Debug)]
pub enum KeyMaterial {
    /// Role A: its keypair and, after decapsulation, the shared secret.
    Initiator {
        /// Locally generated ML-KEM keypair.
        key_pair: KeyPair,
        /// Recovered shared secret. `None` until decapsulation succeeds.
        shared_secret: Option<SharedSecret>,
    },
    /// Role B: the encapsulation result.
    Responder {
        /// Ciphertext to hand back to A.
        ciphertext: KemCiphertext,
        /// Encapsulated shared secret.
        shared_secret: SharedSecret,
    },
}

impl KeyMaterial {
    /// Shared secret, if one has been established.
    pub fn shared_secret(&self) -> Option<&SharedSecret> {
        match self {
            Self::Initiator { shared_secret, .. } => shared_secret.as_ref(),
            Self::Responder { shared_secret, .. } => Some(shared_secret),
        }
    }
}

/// Identity of one arming cycle.
///
/// Handles are never reused within a registry, so a stale handle can be
/// told apart from the live one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    /// Raw handle value.
    pub fn value(self) -> u64 {
        self.0
    }
}

/// A live recurring countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmedTimer<I> {
    /// Arming cycle this timer belongs to.
    pub handle: TimerHandle,
    /// Absolute expiry time.
    pub deadline: I,
    /// Earliest time the next remaining-time observation is due.
    pub next_tick: I,
}

/// Mutable record for one role.
#[derive(Debug)]
pub struct SessionState<I> {
    material: Option<KeyMaterial>,
    symmetric_key: Option<SymmetricKey>,
    timer: Option<ArmedTimer<I>>,
}

impl<I> Default for SessionState<I> {
    fn default() -> Self {
        Self { material: None, symmetric_key: None, timer: None }
    }
}

impl<I: Timestamp> SessionState<I> {
    /// Handshake material, if any.
    pub fn material(&self) -> Option<&KeyMaterial> {
        self.material.as_ref()
    }

    /// Derived symmetric key, if the handshake completed for this role.
    pub fn symmetric_key(&self) -> Option<&SymmetricKey> {
        self.symmetric_key.as_ref()
    }

    /// Live timer, if armed.
    pub fn timer(&self) -> Option<&ArmedTimer<I>> {
        self.timer.as_ref()
    }

    /// Absolute expiry time. `None` means no active timer.
    pub fn expiration_deadline(&self) -> Option<I> {
        self.timer.map(|t| t.deadline)
    }

    /// Public key generated by this role (A only).
    pub fn public_key(&self) -> Option<&PublicKey> {
        match &self.material {
            Some(KeyMaterial::Initiator { key_pair, .. }) => Some(&key_pair.public_key),
            _ => None,
        }
    }

    /// Ciphertext produced by this role (B only).
    pub fn ciphertext(&self) -> Option<&KemCiphertext> {
        match &self.material {
            Some(KeyMaterial::Responder { ciphertext, .. }) => Some(ciphertext),
            _ => None,
        }
    }

    /// True if nothing is held and no timer is armed.
    pub fn is_empty(&self) -> bool {
        self.material.is_none() && self.symmetric_key.is_none() && self.timer.is_none()
    }
}

/// Process-wide owner of both roles' session states.
#[derive(Debug)]
pub struct SessionRegistry<I> {
    states: [SessionState<I>; 2],
    next_handle: u64,
}

impl<I> Default for SessionRegistry<I> {
    fn default() -> Self {
        Self { states: [SessionState::default(), SessionState::default()], next_handle: 1 }
    }
}

impl<I: Timestamp> SessionRegistry<I> {
    /// Registry with both roles empty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only view of a role's record.
    pub fn state(&self, role: Role) -> &SessionState<I> {
        &self.states[role.index()]
    }

    /// Store handshake material, replacing (and zeroizing) any prior material.
    pub fn set_material(&mut self, role: Role, material: KeyMaterial) {
        self.states[role.index()].material = Some(material);
    }

    pub(crate) fn material_mut(&mut self, role: Role) -> Option<&mut KeyMaterial> {
        self.states[role.index()].material.as_mut()
    }

    /// Store the derived symmetric key, replacing any prior key.
    pub fn set_symmetric_key(&mut self, role: Role, key: SymmetricKey) {
        self.states[role.index()].symmetric_key = Some(key);
    }

    /// The role's symmetric key. Re-read immediately before every use.
    pub fn symmetric_key(&self, role: Role) -> Option<&SymmetricKey> {
        self.state(role).symmetric_key()
    }

    /// Absolute expiry time for `role`. `None` means no active timer.
    pub fn expiration_deadline(&self, role: Role) -> Option<I> {
        self.state(role).expiration_deadline()
    }

    /// Live timer for `role`.
    pub fn timer(&self, role: Role) -> Option<&ArmedTimer<I>> {
        self.state(role).timer()
    }

    /// Wipe material and key, cancel the timer and clear the deadline.
    ///
    /// Idempotent. Returns `true` if anything was present.
    pub fn clear(&mut self, role: Role) -> bool {
        let state = &mut self.states[role.index()];
        let had_anything = !state.is_empty();
        state.material = None;
        state.symmetric_key = None;
        state.timer = None;
        had_anything
    }

    /// Install a fresh timer for `role`, replacing any live one.
    pub(crate) fn install_timer(&mut self, role: Role, deadline: I, next_tick: I) -> ArmedTimer<I> {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;

        let timer = ArmedTimer { handle, deadline, next_tick };
        self.states[role.index()].timer = Some(timer);
        timer
    }

    pub(crate) fn timer_mut(&mut self, role: Role) -> Option<&mut ArmedTimer<I>> {
        self.states[role.index()].timer.as_mut()
    }

    pub(crate) fn remove_timer(&mut self, role: Role) -> Option<ArmedTimer<I>> {
        self.states[role.index()].timer.take()
    }
}
