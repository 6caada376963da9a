//! Application layer for Kemlink
//!
//! Pure state machines and generic runtime for the key-exchange console,
//! enabling deterministic simulation testing with the same code that runs in
//! production.
//!
//! # Components
//!
//! - [`App`]: view-model state machine (command handling, role panels,
//!   countdowns, notifications)
//! - [`Bridge`]: session bridge (translates App actions to session events)
//! - [`Driver`]: trait for platform-specific I/O abstraction
//! - [`Runtime`]: generic orchestration loop using Driver
//! - [`SystemEnv`]: production environment (system clock, OS RNG)

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod app;
mod bridge;
mod driver;
mod event;
pub mod input;
mod runtime;
pub mod state;
mod system_env;

pub use action::AppAction;
pub use app::App;
pub use bridge::Bridge;
pub use driver::Driver;
pub use event::AppEvent;
pub use input::{Command, InputError};
pub use runtime::Runtime;
pub use state::{Countdown, Notification, NotificationKind, RolePanel};
pub use system_env::SystemEnv;
