//! Application side-effects and intents.
//!
//! This module defines the [`AppAction`] enum, which represents instructions
//! produced by the [`crate::App`] state machine for the runtime to execute.

use huddle_core::media::AcquisitionTicket;

/// Actions produced by the App state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    /// Render the current session snapshot.
    Render,

    /// Quit the application.
    Quit,

    /// Start acquiring a media stream.
    ///
    /// The result must come back as [`crate::AppEvent::MediaAcquired`] with
    /// the same ticket.
    AcquireMedia {
        /// Ticket identifying the request.
        ticket: AcquisitionTicket,
    },
}
