//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the application runtime from specific I/O
//! implementations. Each frontend implements the trait to provide
//! platform-specific input and rendering, while the generic
//! [`crate::Runtime`] handles all orchestration.

use std::{future::Future, time::Duration};

use huddle_core::session::SessionStore;

use crate::{AppEvent, CallPhase};

/// Abstracts I/O operations for the application runtime.
///
/// Implementations provide platform-specific I/O while the generic
/// [`Runtime`](crate::Runtime) handles orchestration logic. This ensures
/// the same orchestration code runs in the console binary and simulation.
///
/// # Implementations
///
/// - **Console**: line commands on stdin, one log line per render
/// - **Simulation**: scripted events against a virtual clock
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Wait for the next input event.
    ///
    /// `wait` is how long until the app has timed work due. Implementations
    /// return `Ok(None)` once it elapses without input. `None` means no
    /// timer is armed.
    fn poll_event(
        &mut self,
        wait: Option<Duration>,
    ) -> impl Future<Output = Result<Option<AppEvent>, Self::Error>> + Send;

    /// Render the current session snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, phase: CallPhase, session: &SessionStore) -> Result<(), Self::Error>;

    /// Release platform resources.
    fn stop(&mut self);
}
