//! Observable state snapshots for invariant checking.
//!
//! Snapshots capture the observable state of a session at a point in time.
//! Invariants operate on snapshots rather than live state to ensure
//! consistent, atomic checks.

use huddle_core::{
    media::{MediaKind, StreamId},
    session::{MessageId, ParticipantId, SessionStore},
};

use crate::TrackLedger;

/// Snapshot of one roster entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantSnapshot {
    /// Participant id.
    pub id: ParticipantId,
    /// Marked as the active speaker.
    pub is_active: bool,
    /// Camera flag.
    pub is_video_on: bool,
    /// Screen-share flag.
    pub is_screen_share_on: bool,
    /// Bound camera stream.
    pub camera_stream: Option<StreamId>,
    /// Bound screen stream.
    pub screen_stream: Option<StreamId>,
    /// True for the local participant.
    pub is_local: bool,
}

/// Snapshot of one chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageSnapshot {
    /// Message id.
    pub id: MessageId,
    /// Sent by the local participant.
    pub from_local: bool,
}

/// Snapshot of a session plus the media tracks backing it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    /// Roster in display order.
    pub participants: Vec<ParticipantSnapshot>,
    /// Chat log in insertion order.
    pub messages: Vec<MessageSnapshot>,
    /// Pinned participant.
    pub pinned: Option<ParticipantId>,
    /// Grid zoom.
    pub zoom_scale: f64,
    /// Read watermark.
    pub last_read_other_message_id: MessageId,
    /// Camera tracks still running on the device side.
    pub running_camera_tracks: usize,
    /// Screen tracks still running on the device side.
    pub running_screen_tracks: usize,
    /// Track counts came from a ledger. Without one they read zero.
    pub tracks_observed: bool,
}

impl SessionSnapshot {
    /// Capture the observable state of `store`. Track counts start at zero.
    pub fn capture(store: &SessionStore) -> Self {
        let participants = store
            .participants()
            .iter()
            .map(|p| ParticipantSnapshot {
                id: p.id.clone(),
                is_active: p.is_active,
                is_video_on: p.is_video_on,
                is_screen_share_on: p.is_screen_share_on,
                camera_stream: p.camera_stream,
                screen_stream: p.screen_stream,
                is_local: p.is_local(),
            })
            .collect();
        let messages = store
            .messages()
            .iter()
            .map(|m| MessageSnapshot { id: m.id, from_local: m.is_from_local() })
            .collect();

        Self {
            participants,
            messages,
            pinned: store.pinned().cloned(),
            zoom_scale: store.zoom_scale(),
            last_read_other_message_id: store.last_read_other_message_id(),
            running_camera_tracks: 0,
            running_screen_tracks: 0,
            tracks_observed: false,
        }
    }

    /// Record running track counts from a device ledger.
    #[must_use]
    pub fn with_ledger(mut self, ledger: &TrackLedger) -> Self {
        self.running_camera_tracks = ledger.running(MediaKind::Camera);
        self.running_screen_tracks = ledger.running(MediaKind::Screen);
        self.tracks_observed = true;
        self
    }

    /// The local participant's entry, if present.
    pub fn local(&self) -> Option<&ParticipantSnapshot> {
        self.participants.iter().find(|p| p.is_local)
    }
}
