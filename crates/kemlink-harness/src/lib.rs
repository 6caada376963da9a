//! Deterministic simulation harness for Kemlink session testing.
//!
//! Virtual-clock and seeded-RNG implementations of the Environment and
//! Driver traits for deterministic, reproducible testing of handshakes,
//! messaging and key expiry.
//!
//! # Model-Based Testing
//!
//! The `model` module provides a reference implementation for model-based
//! testing. Operations are applied to both the model and a real
//! [`Scenario`], and their results and observable states are compared.
//!
//! # Invariant Testing
//!
//! [`InvariantRegistry::standard()`] checks a [`SystemSnapshot`] after every
//! step: keys never outlive their material, nothing survives a tick past its
//! deadline, phases match the record, and matched handshakes agree on the key.
//! [`SimDriver`] runs the same checks against the App panels while the
//! production runtime executes on virtual time.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod invariants;
pub mod model;
pub mod operation;
pub mod scenario;
pub mod sim_driver;
pub mod sim_env;

pub use invariants::{
    HandshakeLineage, Invariant, InvariantRegistry, InvariantResult, KeyRequiresMaterial,
    NoMaterialPastDeadline, PhaseConsistency, RoleSnapshot, SharedKeyAgreement, SystemSnapshot,
    Violation,
};
pub use model::{ModelKey, ModelRoleState, ModelSession, ObservableState};
pub use operation::{
    MessageRef, ModelRole, ModelUnit, Operation, OperationResult, Resolved, SmallMessage,
};
pub use scenario::Scenario;
pub use sim_driver::{SimDriver, SimDriverError};
pub use sim_env::{SimEnv, SimInstant};
