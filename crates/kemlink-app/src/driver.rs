//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the application runtime from specific I/O
//! implementations. Each frontend implements the trait to provide
//! platform-specific I/O, while the generic [`crate::Runtime`] handles all
//! orchestration.

use std::future::Future;

use kemlink_core::env::Timestamp;

use crate::{App, AppAction};

/// Abstracts I/O operations for the application runtime.
///
/// Implementations provide platform-specific I/O while the generic
/// [`Runtime`](crate::Runtime) handles orchestration logic. This ensures
/// the same orchestration code runs in the console and in simulation.
///
/// # Implementations
///
/// - **Console**: stdin lines and a one-second interval, stdout output
/// - **Simulation**: queued events and a virtual clock
///
/// # Associated Types
///
/// - [`Error`](Driver::Error): Platform-specific error type
/// - [`Instant`](Driver::Instant): Time representation (real or virtual)
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Time instant type. Enables virtual time in simulation.
    type Instant: Timestamp;

    /// Wait for the next input and let the App handle it.
    ///
    /// Implementations should return within one scheduler period even
    /// without input (delivering [`crate::AppEvent::Tick`]), so countdowns
    /// keep moving. Returns the App's resulting actions.
    fn poll_event(
        &mut self,
        app: &mut App,
    ) -> impl Future<Output = Result<Vec<AppAction>, Self::Error>> + Send;

    /// Current time instant.
    fn now(&self) -> Self::Instant;

    /// Render the application state.
    ///
    /// # Errors
    ///
    /// Returns an error if output fails.
    fn render(&mut self, app: &App) -> Result<(), Self::Error>;

    /// Show command usage.
    ///
    /// # Errors
    ///
    /// Returns an error if output fails.
    fn show_help(&mut self) -> Result<(), Self::Error>;

    /// Show both role panels.
    ///
    /// # Errors
    ///
    /// Returns an error if output fails.
    fn show_status(&mut self, app: &App) -> Result<(), Self::Error>;

    /// Release resources before exit.
    fn stop(&mut self);

    /// True once the input source is exhausted.
    fn is_finished(&self) -> bool {
        false
    }
}
