//! Standard invariant checks.
//!
//! Each check inspects a [`SystemSnapshot`] and reports the first role that
//! breaks it.

use kemlink_core::{HandshakePhase, Role};

use super::{Invariant, InvariantResult, SystemSnapshot, Violation};

/// A symmetric key never exists without the material it was derived from.
///
/// Expiry and clear wipe material and key together; a key surviving its
/// material would be usable after the role was reset.
pub struct KeyRequiresMaterial;

impl Invariant for KeyRequiresMaterial {
    fn name(&self) -> &'static str {
        "KeyRequiresMaterial"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for role in &state.roles {
            if role.has_key && !role.has_material {
                return Err(Violation::on_role(
                    self.name(),
                    role.role,
                    "symmetric key present without key material",
                ));
            }
            if role.has_timer && !role.has_material {
                return Err(Violation::on_role(
                    self.name(),
                    role.role,
                    "countdown armed for an empty role",
                ));
            }
        }
        Ok(())
    }
}

/// No role keeps material past its deadline once a tick has run.
///
/// Unsettled snapshots are skipped: between a clock jump and the next tick a
/// due role may still hold material, as long as nothing can use it.
pub struct NoMaterialPastDeadline;

impl Invariant for NoMaterialPastDeadline {
    fn name(&self) -> &'static str {
        "NoMaterialPastDeadline"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        if !state.settled {
            return Ok(());
        }
        for role in &state.roles {
            if role.overdue {
                return Err(Violation::on_role(
                    self.name(),
                    role.role,
                    format!("deadline passed but material survived (phase {:?})", role.phase),
                ));
            }
        }
        Ok(())
    }
}

/// Phases agree with the record they are derived from.
///
/// - `SecretDerived` if and only if a symmetric key is present
/// - `Empty` if and only if no material is present
/// - B never sits in `KeysGenerated`
pub struct PhaseConsistency;

impl Invariant for PhaseConsistency {
    fn name(&self) -> &'static str {
        "PhaseConsistency"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for role in &state.roles {
            let derived = role.phase == HandshakePhase::SecretDerived;
            let empty = role.phase == HandshakePhase::Empty;

            let problem = if derived != role.has_key {
                Some("SecretDerived disagrees with key presence")
            } else if empty == role.has_material {
                Some("Empty disagrees with material presence")
            } else if role.role == Role::B && role.phase == HandshakePhase::KeysGenerated {
                Some("responder reached KeysGenerated")
            } else {
                None
            };

            if let Some(problem) = problem {
                let message = format!("{problem} (phase {:?})", role.phase);
                return Err(Violation::on_role(self.name(), role.role, message));
            }
        }
        Ok(())
    }
}

/// Roles that completed a matched handshake hold the same key.
///
/// If B encapsulated to A's current public key and A decapsulated B's
/// current ciphertext, both derived keys must be identical.
pub struct SharedKeyAgreement;

impl Invariant for SharedKeyAgreement {
    fn name(&self) -> &'static str {
        "SharedKeyAgreement"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let a = state.role(Role::A);
        let b = state.role(Role::B);

        if !(a.has_key && b.has_key && state.lineage.is_matched(a, b)) {
            return Ok(());
        }

        if a.key_fingerprint != b.key_fingerprint {
            return Err(Violation::across_roles(
                self.name(),
                format!(
                    "matched handshake derived different keys: A {:?}, B {:?}",
                    a.key_fingerprint, b.key_fingerprint
                ),
            ));
        }
        Ok(())
    }
}
