//! Roster members and viewport orientation.

use std::fmt;

use crate::media::StreamId;

/// Id of the participant using this client.
pub const LOCAL_PARTICIPANT_ID: &str = "1";

/// Stable participant identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Create an id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id of the local participant.
    pub fn local() -> Self {
        Self(LOCAL_PARTICIPANT_ID.to_owned())
    }

    /// True for the participant using this client.
    pub fn is_local(&self) -> bool {
        self.0 == LOCAL_PARTICIPANT_ID
    }

    /// Id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// One member of the call roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// Stable identifier.
    pub id: ParticipantId,
    /// Display name.
    pub name: String,
    /// Currently detected as the speaker. At most one per roster.
    pub is_active: bool,
    /// Microphone muted.
    pub is_muted: bool,
    /// Camera on.
    pub is_video_on: bool,
    /// Screen share on.
    pub is_screen_share_on: bool,
    /// Camera stream bound to this participant's tile.
    pub camera_stream: Option<StreamId>,
    /// Screen-capture stream bound to this participant's share tile.
    pub screen_stream: Option<StreamId>,
}

impl Participant {
    /// Create a participant with every flag off.
    pub fn new(id: impl Into<ParticipantId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_active: false,
            is_muted: false,
            is_video_on: false,
            is_screen_share_on: false,
            camera_stream: None,
            screen_stream: None,
        }
    }

    /// True for the participant using this client.
    pub fn is_local(&self) -> bool {
        self.id.is_local()
    }
}

/// Viewport orientation, re-derived on every resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// Taller than wide.
    Portrait,
    /// Wider than tall, or square.
    #[default]
    Landscape,
}

impl Orientation {
    /// Derive orientation from viewport dimensions.
    pub fn from_viewport(width: u32, height: u32) -> Self {
        if height > width { Self::Portrait } else { Self::Landscape }
    }
}
