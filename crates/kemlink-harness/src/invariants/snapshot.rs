//! Observable state snapshots for invariant checking.
//!
//! Snapshots capture the observable state of the session at a point in
//! time. Invariants operate on snapshots rather than live state to ensure
//! consistent, atomic checks. Secrets are captured as fingerprints only.

use kemlink_core::{HandshakePhase, Role, Session, env::Environment};

/// Snapshot of both roles plus the handshake messages each one consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemSnapshot {
    /// Per-role state, indexed by [`Role::index`].
    pub roles: [RoleSnapshot; 2],
    /// Which handshake messages produced the current secrets.
    pub lineage: HandshakeLineage,
    /// A tick has run at the snapshot time, so every due deadline has been
    /// enforced.
    pub settled: bool,
}

impl SystemSnapshot {
    /// Snapshot of two empty roles.
    pub fn empty() -> Self {
        Self {
            roles: Role::ALL.map(RoleSnapshot::new),
            lineage: HandshakeLineage::default(),
            settled: true,
        }
    }

    /// Capture `session` at its environment's current time.
    ///
    /// The snapshot counts as settled; callers that skipped the tick must
    /// clear [`Self::settled`].
    pub fn capture<E: Environment>(session: &Session<E>, lineage: HandshakeLineage) -> Self {
        Self {
            roles: Role::ALL.map(|role| RoleSnapshot::capture(session, role)),
            lineage,
            settled: true,
        }
    }

    /// Snapshot of `role`.
    pub fn role(&self, role: Role) -> &RoleSnapshot {
        &self.roles[role.index()]
    }

    /// Mutable snapshot of `role`, for building test fixtures.
    pub fn role_mut(&mut self, role: Role) -> &mut RoleSnapshot {
        &mut self.roles[role.index()]
    }
}

/// Snapshot of a single role's observable state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSnapshot {
    /// Role described.
    pub role: Role,
    /// Handshake phase.
    pub phase: HandshakePhase,
    /// Key material (keypair or ciphertext) is present.
    pub has_material: bool,
    /// A symmetric key is present.
    pub has_key: bool,
    /// A countdown is armed.
    pub has_timer: bool,
    /// The armed deadline is at or before the snapshot time.
    pub overdue: bool,
    /// Fingerprint of A's public key or B's ciphertext.
    pub material_fingerprint: Option<String>,
    /// Fingerprint of the symmetric key.
    pub key_fingerprint: Option<String>,
}

impl RoleSnapshot {
    /// Snapshot of an empty role.
    pub fn new(role: Role) -> Self {
        Self {
            role,
            phase: HandshakePhase::Empty,
            has_material: false,
            has_key: false,
            has_timer: false,
            overdue: false,
            material_fingerprint: None,
            key_fingerprint: None,
        }
    }

    /// Capture one role of `session`.
    pub fn capture<E: Environment>(session: &Session<E>, role: Role) -> Self {
        let state = session.registry().state(role);
        let now = session.env().now();

        let material_fingerprint = match role {
            Role::A => state.public_key().map(|pk| pk.fingerprint()),
            Role::B => state.ciphertext().map(|ct| ct.fingerprint()),
        };

        Self {
            role,
            phase: session.phase(role),
            has_material: state.material().is_some(),
            has_key: state.symmetric_key().is_some(),
            has_timer: state.timer().is_some(),
            overdue: state.expiration_deadline().is_some_and(|deadline| deadline <= now),
            material_fingerprint,
            key_fingerprint: state.symmetric_key().map(|key| key.fingerprint()),
        }
    }
}

/// Handshake messages consumed by each role's current secret.
///
/// Fingerprints are recorded by whoever drives the session: B's entry when
/// an encapsulation succeeds, A's entry when a decapsulation succeeds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandshakeLineage {
    /// Fingerprint of the public key B last encapsulated to.
    pub b_encapsulated_to: Option<String>,
    /// Fingerprint of the ciphertext A last decapsulated.
    pub a_decapsulated: Option<String>,
}

impl HandshakeLineage {
    /// True if A's secret came from B's current ciphertext, which in turn
    /// was made for A's current public key.
    pub fn is_matched(&self, a: &RoleSnapshot, b: &RoleSnapshot) -> bool {
        a.material_fingerprint.is_some()
            && b.material_fingerprint.is_some()
            && self.b_encapsulated_to == a.material_fingerprint
            && self.a_decapsulated == b.material_fingerprint
    }
}

#[cfg(test)]
mod tests {
    use kemlink_core::{SessionEvent, env::test_utils::MockEnv};

    use super::*;

    #[test]
    fn empty_snapshot_has_both_roles() {
        let snapshot = SystemSnapshot::empty();
        assert_eq!(snapshot.role(Role::A).role, Role::A);
        assert_eq!(snapshot.role(Role::B).role, Role::B);
        assert!(!snapshot.role(Role::B).has_material);
    }

    #[test]
    fn capture_reflects_generated_keys() {
        let mut session = Session::new(MockEnv::new());
        session.handle(SessionEvent::GenerateKeys).unwrap();

        let snapshot = SystemSnapshot::capture(&session, HandshakeLineage::default());
        let a = snapshot.role(Role::A);

        assert_eq!(a.phase, HandshakePhase::KeysGenerated);
        assert!(a.has_material && a.has_timer && !a.has_key && !a.overdue);
        assert!(a.material_fingerprint.is_some());
        assert_eq!(snapshot.role(Role::B), &RoleSnapshot::new(Role::B));
    }

    #[test]
    fn lineage_requires_both_links() {
        let mut a = RoleSnapshot::new(Role::A);
        a.material_fingerprint = Some("pk".into());
        let mut b = RoleSnapshot::new(Role::B);
        b.material_fingerprint = Some("ct".into());

        let mut lineage = HandshakeLineage {
            b_encapsulated_to: Some("pk".into()),
            a_decapsulated: Some("ct".into()),
        };
        assert!(lineage.is_matched(&a, &b));

        lineage.a_decapsulated = Some("old".into());
        assert!(!lineage.is_matched(&a, &b));
    }
}
