//! Kemlink session core
//!
//! Sans-IO state machines for a two-party key exchange between local roles
//! A and B. The core never touches a clock, a socket or an OS RNG directly:
//! time and randomness come from an injected [`env::Environment`], and all
//! results are returned as [`SessionAction`]s for a driver to render.
//!
//! # Components
//!
//! - [`SessionRegistry`]: per-role [`SessionState`] records (material,
//!   symmetric key, armed timer), empty at start and reset, never destroyed
//! - [`ExpirationScheduler`]: arms, disarms and polls per-role deadlines,
//!   wiping a role's material the moment its deadline is reached
//! - [`HandshakeCoordinator`]: keygen, encapsulate, decapsulate sequencing
//! - [`MessagingGate`]: encrypt/decrypt gated on an established key
//! - [`Session`]: event/action facade tying the above together
//!
//! # Handshake
//!
//! ```text
//! Role A: Empty ──keygen──► KeysGenerated ──decapsulate(ct)──► SecretDerived
//! Role B: Empty ──────────encapsulate(pk)────────────────────► SecretDerived
//!
//! Re-running keygen (A) or encapsulate (B) restarts: Any ─► Empty ─► next
//! Expiry or clear from any state:                    Any ─► Empty
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod env;
pub mod error;
pub mod event;
pub mod gate;
pub mod handshake;
pub mod policy;
pub mod registry;
pub mod role;
pub mod scheduler;
pub mod session;

pub use error::{ErrorKind, SessionError};
pub use event::{SessionAction, SessionEvent};
pub use gate::MessagingGate;
pub use handshake::{HandshakeCoordinator, HandshakePhase};
pub use policy::{DurationUnit, ExpirationPolicy, ExpirationSetting};
pub use registry::{ArmedTimer, KeyMaterial, SessionRegistry, SessionState, TimerHandle};
pub use role::Role;
pub use scheduler::{ExpirationScheduler, Tick, Urgency};
pub use session::{RoleView, Session};
