//! Error types for the session core.
//!
//! Nothing here is fatal. Store errors reject a single operation and leave
//! state untouched; media errors degrade one feature (camera or screen
//! share) without affecting the rest of the session.

use thiserror::Error;

use crate::{
    media::{AcquisitionTicket, MediaKind},
    session::ParticipantId,
};

/// Errors returned by [`crate::session::SessionStore`] operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Chat message was empty or whitespace-only
    #[error("message content is empty")]
    EmptyContent,

    /// Operation referenced a participant that is not in the roster
    #[error("unknown participant {id}")]
    UnknownParticipant {
        /// The id that was not found
        id: ParticipantId,
    },

    /// Participant with this id is already in the roster
    #[error("participant {id} is already in the roster")]
    DuplicateParticipant {
        /// The id that already exists
        id: ParticipantId,
    },

    /// The local participant cannot leave its own session roster
    #[error("the local participant cannot be removed")]
    LocalParticipant,
}

/// Errors produced while acquiring or owning media resources.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediaError {
    /// Device or user rejected the request
    #[error("{kind} access denied: {reason}")]
    AccessDenied {
        /// Which resource was requested
        kind: MediaKind,
        /// Reason reported by the capability
        reason: String,
    },

    /// Capability is not available on this platform
    #[error("{kind} is not supported")]
    UnsupportedCapability {
        /// Which resource was requested
        kind: MediaKind,
    },

    /// Acquisition resolved after its owner stopped waiting for it
    #[error("stale {} acquisition (session {}, seq {})", .ticket.kind, .ticket.session, .ticket.seq)]
    StaleResult {
        /// Ticket the result was delivered for
        ticket: AcquisitionTicket,
    },
}

impl MediaError {
    /// Returns true if the user should be told about this error.
    ///
    /// Only denials are surfaced. Unsupported capabilities are presented as
    /// disabled controls and stale results are never shown.
    pub fn is_user_visible(&self) -> bool {
        matches!(self, Self::AccessDenied { .. })
    }
}
