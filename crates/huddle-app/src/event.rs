//! Application input events.
//!
//! This module defines [`AppEvent`], the set of inputs that drive the
//! [`crate::App`] state machine.
//!
//! Events originate from three sources:
//! - User interactions (pointer, touch, resize, call controls, chat).
//! - Simulated remote activity (participants joining, leaving, chatting).
//! - Completions of asynchronous work started by the runtime.

use huddle_core::{
    MediaError,
    gesture::{TouchPhase, TouchPoint},
    media::{AcquisitionTicket, MediaStream, StreamId},
    session::ParticipantId,
};

use crate::Interaction;

/// Events processed by the App state machine.
#[derive(Debug)]
pub enum AppEvent {
    /// Periodic tick. Fires due timers and audio samples.
    Tick,

    /// Pointer movement or click.
    Pointer(Interaction),

    /// Touch event on the video grid.
    Touch {
        /// Phase of the touch sequence.
        phase: TouchPhase,
        /// Points still on the surface.
        touches: Vec<TouchPoint>,
    },

    /// Window resized or rotated.
    Resize {
        /// Viewport width in pixels.
        width: u32,
        /// Viewport height in pixels.
        height: u32,
    },

    /// Mute button.
    ToggleMute,

    /// Camera button.
    ToggleVideo,

    /// Screen-share button.
    ToggleScreenShare,

    /// Chat button.
    ToggleChat,

    /// Open or close the chat panel explicitly.
    SetChatOpen(bool),

    /// Chat input submitted by the local participant.
    ChatSubmit {
        /// Raw input text.
        content: String,
    },

    /// Chat message from a remote participant.
    MessageReceived {
        /// Sender id.
        sender: ParticipantId,
        /// Message text.
        content: String,
    },

    /// A participant joined the call.
    ParticipantJoined {
        /// New participant id.
        id: ParticipantId,
        /// Display name.
        name: String,
    },

    /// A participant left the call.
    ParticipantLeft {
        /// Leaving participant id.
        id: ParticipantId,
    },

    /// A media acquisition finished.
    MediaAcquired {
        /// Ticket from the originating [`crate::AppAction::AcquireMedia`].
        ticket: AcquisitionTicket,
        /// Acquired stream or the reason it failed.
        result: Result<MediaStream, MediaError>,
    },

    /// The platform ended a stream out-of-band.
    StreamEnded {
        /// Id of the ended stream.
        stream_id: StreamId,
    },

    /// User dismissed the current notice.
    DismissNotice,

    /// Leave the call.
    EndCall,

    /// Return to the meeting after ending the call.
    Rejoin,

    /// Quit the application.
    Quit,
}
