//! Session invariants.
//!
//! A [`SystemSnapshot`] captures what each role holds at one instant (phase,
//! material, key, countdown, whether the deadline has passed) plus which
//! handshake texts each role consumed. [`Invariant`] checks run against the
//! snapshot after every simulated step, so a broken wipe or a mismatched key
//! is caught at the operation that caused it.
//!
//! ```ignore
//! let invariants = InvariantRegistry::standard();
//! scenario.apply(&Operation::GenerateKeys)?;
//! invariants.assert_all(&scenario.snapshot(), "after gen");
//! ```

mod checks;
mod snapshot;

use std::fmt;

use kemlink_core::Role;

pub use checks::{KeyRequiresMaterial, NoMaterialPastDeadline, PhaseConsistency, SharedKeyAgreement};
pub use snapshot::{HandshakeLineage, RoleSnapshot, SystemSnapshot};

/// Outcome of one invariant check.
pub type InvariantResult = Result<(), Violation>;

/// A broken invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Name of the violated invariant.
    pub invariant: &'static str,
    /// Role the violation was found on, `None` if it spans both.
    pub role: Option<Role>,
    /// What was observed.
    pub message: String,
}

impl Violation {
    /// Violation found on a single role.
    pub fn on_role(invariant: &'static str, role: Role, message: impl Into<String>) -> Self {
        Self { invariant, role: Some(role), message: message.into() }
    }

    /// Violation involving both roles.
    pub fn across_roles(invariant: &'static str, message: impl Into<String>) -> Self {
        Self { invariant, role: None, message: message.into() }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.role {
            Some(role) => write!(f, "[{}] {role}: {}", self.invariant, self.message),
            None => write!(f, "[{}] {}", self.invariant, self.message),
        }
    }
}

impl std::error::Error for Violation {}

/// A property of the session that holds after every step.
pub trait Invariant: Send + Sync {
    /// Name used in violation reports.
    fn name(&self) -> &'static str;

    /// Check `state`, returning the first violation found.
    fn check(&self, state: &SystemSnapshot) -> InvariantResult;
}

/// Set of invariants checked together.
#[derive(Default)]
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl InvariantRegistry {
    /// Registry with no checks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every session invariant:
    ///
    /// - [`KeyRequiresMaterial`]
    /// - [`NoMaterialPastDeadline`]
    /// - [`PhaseConsistency`]
    /// - [`SharedKeyAgreement`]
    pub fn standard() -> Self {
        Self::new()
            .with(KeyRequiresMaterial)
            .with(NoMaterialPastDeadline)
            .with(PhaseConsistency)
            .with(SharedKeyAgreement)
    }

    /// Add a check.
    #[must_use]
    pub fn with(mut self, invariant: impl Invariant + 'static) -> Self {
        self.invariants.push(Box::new(invariant));
        self
    }

    /// Names of the registered checks, in evaluation order.
    pub fn names(&self) -> Vec<&'static str> {
        self.invariants.iter().map(|invariant| invariant.name()).collect()
    }

    /// Run every check.
    ///
    /// # Errors
    ///
    /// Returns one violation per failing invariant.
    pub fn check_all(&self, state: &SystemSnapshot) -> Result<(), Vec<Violation>> {
        let violations: Vec<_> =
            self.invariants.iter().filter_map(|invariant| invariant.check(state).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Run every check and panic with all violations if any fails.
    ///
    /// `context` names the step that produced `state`.
    ///
    /// # Panics
    ///
    /// Panics if any invariant is violated.
    #[allow(clippy::panic)]
    pub fn assert_all(&self, state: &SystemSnapshot, context: &str) {
        if let Err(violations) = self.check_all(state) {
            let report: Vec<_> = violations.iter().map(ToString::to_string).collect();
            panic!("invariants broken {context}:\n  {}", report.join("\n  "));
        }
    }
}
