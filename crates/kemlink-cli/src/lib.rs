//! Line-oriented console for the KEM link session.
//!
//! Reads commands from stdin, writes notifications and panels to stdout and
//! keeps both roles' countdowns moving with a one-second interval. All
//! session and presentation logic lives in `kemlink-app`; this crate only
//! provides the [`Driver`](kemlink_app::Driver) for a terminal.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod console;
pub mod ui;

pub use console::{ConsoleDriver, ConsoleError};
