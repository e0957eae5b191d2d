//! Application state machine.
//!
//! This module defines the [`App`] state machine, which wires the session
//! components together completely decoupled from I/O.
//!
//! This is a pure state machine: it consumes [`crate::AppEvent`] inputs and
//! produces [`crate::AppAction`] instructions for the runtime to execute.
//! Time is read from the [`Environment`] at the start of each event and
//! passed down, so every component sees the same instant.
//!
//! # Responsibilities
//!
//! - Routes user input to the gesture interpreter, visibility timer and
//!   media manager.
//! - Keeps speaker pipelines in step with the roster.
//! - Marks chat read while the panel is open.
//! - Tears every component down when the call ends.

use huddle_core::{
    Environment, MediaError, SessionConfig, SessionError,
    controls::ControlVisibility,
    gesture::{GestureInterpreter, TouchPhase},
    media::{AcquisitionTicket, MediaManager, MediaStream},
    session::{Orientation, Participant, ParticipantId, SessionStore},
    speaker::{AudioMeter, SpeakerDetector},
};

use crate::{AppAction, AppEvent};

/// Whether the local participant is in the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPhase {
    /// Meeting view.
    InCall,
    /// Call-ended screen. Only [`AppEvent::Rejoin`] and [`AppEvent::Quit`]
    /// do anything here.
    Ended,
}

/// Application state machine.
///
/// Owns the session store and every component that mutates it.
pub struct App<E: Environment> {
    env: E,
    config: SessionConfig,
    store: SessionStore,
    phase: CallPhase,
    media: MediaManager,
    speaker: SpeakerDetector<E::Instant>,
    gestures: GestureInterpreter,
    controls: ControlVisibility<E::Instant>,
    meter: Box<dyn AudioMeter>,
    /// Probed once at startup and carried across rejoins.
    screen_share_supported: bool,
}

impl<E: Environment> App<E> {
    /// Create an app and start a session from the mock roster.
    pub fn new(
        env: E,
        config: SessionConfig,
        meter: Box<dyn AudioMeter>,
        screen_share_supported: bool,
    ) -> Self {
        let store = SessionStore::with_mock_session(env.wall_clock());
        let mut app = Self {
            speaker: SpeakerDetector::new(config.speaker.clone()),
            gestures: GestureInterpreter::new(config.gesture.clone()),
            controls: ControlVisibility::new(config.controls.clone()),
            media: MediaManager::new(),
            phase: CallPhase::InCall,
            env,
            config,
            store,
            meter,
            screen_share_supported,
        };
        app.start_session();
        app
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: AppEvent) -> Vec<AppAction> {
        let actions = match self.phase {
            CallPhase::InCall => self.handle_in_call(event),
            CallPhase::Ended => self.handle_ended(event),
        };

        if self.phase == CallPhase::InCall {
            if self.store.is_chat_open() {
                self.store.mark_read();
            }
            let now = self.env.now();
            self.speaker.sync_roster(&self.store, self.meter.as_mut(), now);
        }
        actions
    }

    fn handle_in_call(&mut self, event: AppEvent) -> Vec<AppAction> {
        let now = self.env.now();
        match event {
            AppEvent::Tick => {
                let active_before = self.active_speaker_id();
                let hidden = self.controls.poll(&mut self.store, now);
                self.speaker.poll(&mut self.store, now);
                if hidden || self.active_speaker_id() != active_before {
                    vec![AppAction::Render]
                } else {
                    vec![]
                }
            },
            AppEvent::Pointer(_) => {
                self.controls.interact(&mut self.store, now);
                vec![AppAction::Render]
            },
            AppEvent::Touch { phase, touches } => {
                if phase == TouchPhase::Start {
                    self.controls.interact(&mut self.store, now);
                }
                self.gestures.handle(phase, &touches, &mut self.store);
                vec![AppAction::Render]
            },
            AppEvent::Resize { width, height } => {
                self.store.set_orientation(Orientation::from_viewport(width, height));
                vec![AppAction::Render]
            },
            AppEvent::ToggleMute => {
                self.controls.interact(&mut self.store, now);
                let local = ParticipantId::local();
                let muted = self.store.participant(&local).is_some_and(|p| p.is_muted);
                render_if_applied(self.store.set_muted(&local, !muted))
            },
            AppEvent::ToggleVideo => {
                self.controls.interact(&mut self.store, now);
                match self.media.toggle_video(&mut self.store) {
                    Some(ticket) => vec![AppAction::AcquireMedia { ticket }, AppAction::Render],
                    None => vec![AppAction::Render],
                }
            },
            AppEvent::ToggleScreenShare => {
                self.controls.interact(&mut self.store, now);
                match self.media.toggle_screen_share(&mut self.store) {
                    Ok(Some(ticket)) => vec![AppAction::AcquireMedia { ticket }, AppAction::Render],
                    Ok(None) => vec![AppAction::Render],
                    Err(e) => {
                        tracing::debug!("screen share toggle ignored: {e}");
                        vec![]
                    },
                }
            },
            AppEvent::ToggleChat => {
                self.controls.interact(&mut self.store, now);
                let open = !self.store.is_chat_open();
                self.store.set_chat_open(open);
                vec![AppAction::Render]
            },
            AppEvent::SetChatOpen(open) => {
                self.controls.interact(&mut self.store, now);
                self.store.set_chat_open(open);
                vec![AppAction::Render]
            },
            AppEvent::ChatSubmit { content } => {
                let time = self.env.wall_clock();
                let sent = self.store.append_message(&ParticipantId::local(), content, time);
                render_if_applied(sent.map(|_| ()))
            },
            AppEvent::MessageReceived { sender, content } => {
                let time = self.env.wall_clock();
                let received = self.store.append_message(&sender, content, time);
                render_if_applied(received.map(|_| ()))
            },
            AppEvent::ParticipantJoined { id, name } => {
                let joined = self.store.add_participant(Participant::new(id, name));
                render_if_applied(joined)
            },
            AppEvent::ParticipantLeft { id } => {
                let left = self.store.remove_participant(&id);
                render_if_applied(left.map(|_| ()))
            },
            AppEvent::MediaAcquired { ticket, result } => {
                self.complete_acquisition(ticket, result)
            },
            AppEvent::StreamEnded { stream_id } => {
                if self.media.stream_ended(stream_id, &mut self.store) {
                    vec![AppAction::Render]
                } else {
                    vec![]
                }
            },
            AppEvent::DismissNotice => {
                self.store.dismiss_notice();
                vec![AppAction::Render]
            },
            AppEvent::EndCall => {
                self.end_session();
                vec![AppAction::Render]
            },
            AppEvent::Rejoin => {
                tracing::debug!("already in call, ignoring rejoin");
                vec![]
            },
            AppEvent::Quit => {
                self.end_session();
                vec![AppAction::Quit]
            },
        }
    }

    fn handle_ended(&mut self, event: AppEvent) -> Vec<AppAction> {
        match event {
            AppEvent::Rejoin => {
                self.store = SessionStore::with_mock_session(self.env.wall_clock());
                self.gestures = GestureInterpreter::new(self.config.gesture.clone());
                self.phase = CallPhase::InCall;
                self.start_session();
                vec![AppAction::Render]
            },
            AppEvent::Quit => vec![AppAction::Quit],
            AppEvent::MediaAcquired { ticket, result } => {
                // Generation was bumped at teardown, so this only stops the stream.
                self.complete_acquisition(ticket, result);
                vec![]
            },
            AppEvent::Tick => vec![],
            other => {
                tracing::debug!(event = ?other, "call ended, ignoring event");
                vec![]
            },
        }
    }

    fn complete_acquisition(
        &mut self,
        ticket: AcquisitionTicket,
        result: Result<MediaStream, MediaError>,
    ) -> Vec<AppAction> {
        match self.media.complete(ticket, result, &mut self.store) {
            Ok(_) => vec![AppAction::Render],
            Err(MediaError::StaleResult { ticket }) => {
                tracing::debug!(kind = %ticket.kind, seq = ticket.seq, "discarded stale acquisition");
                vec![]
            },
            Err(_) => vec![AppAction::Render],
        }
    }

    fn start_session(&mut self) {
        self.store.set_screen_share_supported(self.screen_share_supported);
        let now = self.env.now();
        self.controls.interact(&mut self.store, now);
        self.speaker.sync_roster(&self.store, self.meter.as_mut(), now);
        tracing::info!(
            participants = self.store.participants().len(),
            screen_share_supported = self.screen_share_supported,
            "session started"
        );
    }

    fn end_session(&mut self) {
        if self.phase == CallPhase::Ended {
            return;
        }
        self.controls.cancel();
        self.speaker.teardown();
        self.media.teardown(&mut self.store);
        self.gestures = GestureInterpreter::new(self.config.gesture.clone());
        self.phase = CallPhase::Ended;
        tracing::info!("session ended");
    }

    fn active_speaker_id(&self) -> Option<ParticipantId> {
        self.store.active_speaker().map(|p| p.id.clone())
    }

    /// Tear down the session if still in the call.
    ///
    /// Used by the runtime on shutdown so a driver error still releases
    /// media and closes audio pipelines.
    pub fn shutdown(&mut self) {
        self.end_session();
    }

    /// Earliest instant at which a [`AppEvent::Tick`] has work to do.
    pub fn next_deadline(&self) -> Option<E::Instant> {
        match (self.controls.next_deadline(), self.speaker.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Current session snapshot.
    pub fn session(&self) -> &SessionStore {
        &self.store
    }

    /// Current call phase.
    pub fn phase(&self) -> CallPhase {
        self.phase
    }

    /// Media resources owned by the session.
    pub fn media(&self) -> &MediaManager {
        &self.media
    }

    /// Number of open speaker pipelines.
    pub fn speaker_pipelines(&self) -> usize {
        self.speaker.pipeline_count()
    }

    /// Active configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The environment this app reads time from.
    pub fn env(&self) -> &E {
        &self.env
    }
}

/// Rejected store operations leave the store untouched, so there is nothing
/// to render.
fn render_if_applied(result: Result<(), SessionError>) -> Vec<AppAction> {
    match result {
        Ok(()) => vec![AppAction::Render],
        Err(e) => {
            tracing::debug!("ignored session operation: {e}");
            vec![]
        },
    }
}

impl<E: Environment> std::fmt::Debug for App<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("phase", &self.phase)
            .field("store", &self.store)
            .field("media", &self.media)
            .field("speaker_pipelines", &self.speaker.pipeline_count())
            .finish_non_exhaustive()
    }
}
