//! Chat messages.

use chrono::{DateTime, Utc};

use super::ParticipantId;

/// Message identifier, assigned by the store. Strictly increasing.
pub type MessageId = u64;

/// A chat message in the append-only session log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Store-assigned id.
    pub id: MessageId,
    /// Participant who sent the message.
    pub sender: ParticipantId,
    /// Sender's display name at the time of sending.
    pub sender_name: String,
    /// UTC send time.
    pub time: DateTime<Utc>,
    /// Message text, never blank.
    pub content: String,
}

impl Message {
    /// True if the local participant sent this message.
    pub fn is_from_local(&self) -> bool {
        self.sender.is_local()
    }
}
