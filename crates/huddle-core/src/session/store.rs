//! Session state store.
//!
//! This module defines [`SessionStore`], the single source of truth for a
//! session: roster, chat log and view flags. Components never keep their own
//! copy of this state; they call the named operations below and the renderer
//! reads the result.
//!
//! Every operation is atomic. A rejected operation returns an error and
//! leaves the store exactly as it was.

use chrono::{DateTime, Utc};

use super::{Message, MessageId, Orientation, Participant, ParticipantId, mock_roster, seed_messages};
use crate::{
    error::SessionError,
    media::{MediaKind, StreamId},
};

/// Smallest zoom scale the grid can display.
pub const MIN_ZOOM: f64 = 1.0;

/// Largest zoom scale the grid can display.
pub const MAX_ZOOM: f64 = 3.0;

/// User-visible notice, e.g. a denied camera permission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Text to show the user.
    pub message: String,
}

/// Session state store.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStore {
    /// Roster in display order.
    participants: Vec<Participant>,
    /// Append-only chat log in insertion order.
    messages: Vec<Message>,
    /// Participant shown full-frame. `None` shows the grid.
    pinned: Option<ParticipantId>,
    /// Grid zoom, always within `[MIN_ZOOM, MAX_ZOOM]`.
    zoom_scale: f64,
    chat_open: bool,
    controls_visible: bool,
    /// Highest remote message id the user has seen.
    last_read_other_message_id: MessageId,
    orientation: Orientation,
    screen_share_supported: bool,
    /// Bumped on every membership change.
    roster_version: u64,
    notice: Option<Notice>,
}

impl SessionStore {
    /// Create a store with the given roster and an empty chat log.
    ///
    /// Duplicate ids keep their first occurrence. If more than one entry is
    /// flagged active, only the first keeps the flag.
    pub fn new(roster: impl IntoIterator<Item = Participant>) -> Self {
        let mut participants: Vec<Participant> = Vec::new();
        let mut seen_active = false;
        for mut participant in roster {
            if participants.iter().any(|p| p.id == participant.id) {
                tracing::debug!(id = %participant.id, "dropping duplicate roster entry");
                continue;
            }
            if participant.is_active {
                participant.is_active = !seen_active;
                seen_active = true;
            }
            participants.push(participant);
        }

        Self {
            participants,
            messages: Vec::new(),
            pinned: None,
            zoom_scale: MIN_ZOOM,
            chat_open: false,
            controls_visible: true,
            last_read_other_message_id: 0,
            orientation: Orientation::default(),
            screen_share_supported: false,
            roster_version: 0,
            notice: None,
        }
    }

    /// Create a store with the mock roster and seeded chat history.
    ///
    /// Seed messages are marked read, so the unread count starts at zero.
    pub fn with_mock_session(now: DateTime<Utc>) -> Self {
        let mut store = Self::new(mock_roster());
        for (sender, content, time) in seed_messages(now) {
            if let Err(e) = store.append_message(&sender, content, time) {
                tracing::warn!(%sender, "failed to seed message: {e}");
            }
        }
        store.mark_read();
        store
    }

    /// Set the muted flag of a participant.
    pub fn set_muted(&mut self, id: &ParticipantId, muted: bool) -> Result<(), SessionError> {
        self.participant_mut(id)?.is_muted = muted;
        Ok(())
    }

    /// Set the camera flag of a participant.
    pub fn set_video_on(&mut self, id: &ParticipantId, on: bool) -> Result<(), SessionError> {
        self.participant_mut(id)?.is_video_on = on;
        Ok(())
    }

    /// Set the screen-share flag of a participant.
    pub fn set_screen_share_on(&mut self, id: &ParticipantId, on: bool) -> Result<(), SessionError> {
        self.participant_mut(id)?.is_screen_share_on = on;
        Ok(())
    }

    /// Bind (or unbind) a stream to a participant's camera or share tile.
    pub fn set_stream(
        &mut self,
        id: &ParticipantId,
        kind: MediaKind,
        stream: Option<StreamId>,
    ) -> Result<(), SessionError> {
        let participant = self.participant_mut(id)?;
        match kind {
            MediaKind::Camera => participant.camera_stream = stream,
            MediaKind::Screen => participant.screen_stream = stream,
        }
        Ok(())
    }

    /// Mark one participant as the speaker and clear everyone else.
    ///
    /// `None` clears the flag on the whole roster. Last writer wins.
    pub fn set_active_speaker(&mut self, id: Option<&ParticipantId>) -> Result<(), SessionError> {
        if let Some(id) = id {
            self.index_of(id)?;
        }
        for participant in &mut self.participants {
            participant.is_active = Some(&participant.id) == id;
        }
        Ok(())
    }

    /// Append a chat message and return its id.
    ///
    /// # Errors
    ///
    /// - [`SessionError::EmptyContent`] if `content` is blank after trimming
    /// - [`SessionError::UnknownParticipant`] if `sender` is not in the roster
    pub fn append_message(
        &mut self,
        sender: &ParticipantId,
        content: impl Into<String>,
        time: DateTime<Utc>,
    ) -> Result<MessageId, SessionError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(SessionError::EmptyContent);
        }
        let sender_name = self.participant(sender).map(|p| p.name.clone()).ok_or_else(|| {
            SessionError::UnknownParticipant { id: sender.clone() }
        })?;

        let id = self.messages.last().map_or(0, |m| m.id) + 1;
        self.messages.push(Message { id, sender: sender.clone(), sender_name, time, content });
        Ok(id)
    }

    /// Pin a participant full-frame, or return to the grid with `None`.
    pub fn set_pinned(&mut self, id: Option<ParticipantId>) -> Result<(), SessionError> {
        if let Some(id) = &id {
            self.index_of(id)?;
        }
        self.pinned = id;
        Ok(())
    }

    /// Set the grid zoom, clamped to `[MIN_ZOOM, MAX_ZOOM]`.
    ///
    /// NaN resets the zoom to `MIN_ZOOM`.
    pub fn set_zoom(&mut self, scale: f64) {
        self.zoom_scale = if scale.is_nan() { MIN_ZOOM } else { scale.clamp(MIN_ZOOM, MAX_ZOOM) };
    }

    /// Open or close the chat panel.
    pub fn set_chat_open(&mut self, open: bool) {
        self.chat_open = open;
    }

    /// Show or hide the floating call controls.
    pub fn set_controls_visible(&mut self, visible: bool) {
        self.controls_visible = visible;
    }

    /// Move the read watermark to the newest message from someone else.
    pub fn mark_read(&mut self) {
        self.last_read_other_message_id = self
            .messages
            .iter()
            .filter(|m| !m.is_from_local())
            .map(|m| m.id)
            .max()
            .unwrap_or(0);
    }

    /// Record the current viewport orientation.
    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
    }

    /// Record whether screen capture is available. Probed once at startup.
    pub fn set_screen_share_supported(&mut self, supported: bool) {
        self.screen_share_supported = supported;
    }

    /// Add a participant to the roster.
    ///
    /// Newcomers never start as the active speaker.
    pub fn add_participant(&mut self, mut participant: Participant) -> Result<(), SessionError> {
        if self.index_of(&participant.id).is_ok() {
            return Err(SessionError::DuplicateParticipant { id: participant.id });
        }
        participant.is_active = false;
        self.participants.push(participant);
        self.roster_version += 1;
        Ok(())
    }

    /// Remove a participant from the roster, unpinning them if needed.
    pub fn remove_participant(&mut self, id: &ParticipantId) -> Result<Participant, SessionError> {
        if id.is_local() {
            return Err(SessionError::LocalParticipant);
        }
        let index = self.index_of(id)?;
        let removed = self.participants.remove(index);
        if self.pinned.as_ref() == Some(id) {
            self.pinned = None;
        }
        self.roster_version += 1;
        Ok(removed)
    }

    /// Show a notice to the user, replacing any previous one.
    pub fn raise_notice(&mut self, message: impl Into<String>) {
        self.notice = Some(Notice { message: message.into() });
    }

    /// Clear the current notice.
    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Roster in display order.
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Look up a participant by id.
    pub fn participant(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.id == id)
    }

    /// The participant using this client, if present.
    pub fn local_participant(&self) -> Option<&Participant> {
        self.participants.iter().find(|p| p.is_local())
    }

    /// The currently detected speaker, if any.
    pub fn active_speaker(&self) -> Option<&Participant> {
        self.participants.iter().find(|p| p.is_active)
    }

    /// Participants the grid should show: the pinned one alone, or everyone.
    pub fn visible_participants(&self) -> impl Iterator<Item = &Participant> + '_ {
        self.participants
            .iter()
            .filter(|p| self.pinned.as_ref().is_none_or(|pinned| pinned == &p.id))
    }

    /// Chat log in insertion order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Messages from other participants newer than the read watermark.
    pub fn unread_count(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| !m.is_from_local() && m.id > self.last_read_other_message_id)
            .count()
    }

    /// Read watermark.
    pub fn last_read_other_message_id(&self) -> MessageId {
        self.last_read_other_message_id
    }

    /// Pinned participant. `None` means grid view.
    pub fn pinned(&self) -> Option<&ParticipantId> {
        self.pinned.as_ref()
    }

    /// Current grid zoom.
    pub fn zoom_scale(&self) -> f64 {
        self.zoom_scale
    }

    /// Chat panel open.
    pub fn is_chat_open(&self) -> bool {
        self.chat_open
    }

    /// Floating controls shown.
    pub fn controls_visible(&self) -> bool {
        self.controls_visible
    }

    /// Current viewport orientation.
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Screen capture available on this platform.
    pub fn is_screen_share_supported(&self) -> bool {
        self.screen_share_supported
    }

    /// Counter bumped on every join or leave.
    pub fn roster_version(&self) -> u64 {
        self.roster_version
    }

    /// Pending user-visible notice.
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    fn index_of(&self, id: &ParticipantId) -> Result<usize, SessionError> {
        self.participants
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| SessionError::UnknownParticipant { id: id.clone() })
    }

    fn participant_mut(&mut self, id: &ParticipantId) -> Result<&mut Participant, SessionError> {
        let index = self.index_of(id)?;
        Ok(&mut self.participants[index])
    }
}
