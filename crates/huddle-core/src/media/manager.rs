//! Media resource manager.
//!
//! Bridges "toggle camera" and "toggle screen share" to asynchronous
//! acquisition with strict ownership:
//!
//! - The camera flag only turns on once a stream has actually been acquired.
//! - The screen-share flag turns on immediately and reverts if acquisition
//!   fails or the platform ends the share.
//! - Each kind has a single slot, so at most one stream per kind is owned.
//! - A result is applied only if it carries the slot's pending ticket from
//!   the current session. Anything else is stale: its stream is stopped on
//!   arrival and the store is left alone.

use std::mem;

use super::{MediaKind, MediaStream, StreamId};
use crate::{
    error::MediaError,
    session::{ParticipantId, SessionStore},
};

/// Notice shown when camera access fails.
pub const CAMERA_DENIED_NOTICE: &str = "Could not access camera. Please check your permissions.";

/// Notice shown when screen capture fails.
pub const SCREEN_DENIED_NOTICE: &str = "Could not start screen sharing.";

/// Identifies one acquisition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AcquisitionTicket {
    /// Requested resource
    pub kind: MediaKind,
    /// Session generation the request belongs to
    pub session: u64,
    /// Per-manager request counter
    pub seq: u64,
}

#[derive(Debug, Default)]
enum Slot {
    #[default]
    Idle,
    Pending(AcquisitionTicket),
    Live(MediaStream),
}

/// Owner of every live media stream in a session.
#[derive(Debug)]
pub struct MediaManager {
    /// Liveness generation, bumped on teardown.
    session: u64,
    next_seq: u64,
    camera: Slot,
    screen: Slot,
}

impl Default for MediaManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaManager {
    /// Create a manager owning nothing.
    pub fn new() -> Self {
        Self { session: 1, next_seq: 0, camera: Slot::Idle, screen: Slot::Idle }
    }

    /// Toggle the local camera.
    ///
    /// Turning off releases the stream synchronously. Turning on returns a
    /// ticket for the runtime to acquire; the flag stays off until
    /// [`Self::complete`] succeeds. While a request is pending further
    /// toggles are ignored.
    pub fn toggle_video(&mut self, store: &mut SessionStore) -> Option<AcquisitionTicket> {
        let Some(local) = store.local_participant() else {
            tracing::warn!("no local participant, ignoring camera toggle");
            return None;
        };

        if local.is_video_on {
            self.release(MediaKind::Camera);
            set_local_media(store, MediaKind::Camera, false, None);
            tracing::info!("camera off");
            return None;
        }
        if let Slot::Pending(ticket) = self.camera {
            tracing::debug!(seq = ticket.seq, "camera request already pending");
            return None;
        }

        self.release(MediaKind::Camera);
        let ticket = self.issue(MediaKind::Camera);
        self.camera = Slot::Pending(ticket);
        Some(ticket)
    }

    /// Toggle local screen sharing.
    ///
    /// # Errors
    ///
    /// [`MediaError::UnsupportedCapability`] if the platform cannot capture
    /// the screen. Nothing changes in that case.
    pub fn toggle_screen_share(
        &mut self,
        store: &mut SessionStore,
    ) -> Result<Option<AcquisitionTicket>, MediaError> {
        if !store.is_screen_share_supported() {
            return Err(MediaError::UnsupportedCapability { kind: MediaKind::Screen });
        }
        let Some(local) = store.local_participant() else {
            tracing::warn!("no local participant, ignoring screen share toggle");
            return Ok(None);
        };

        if local.is_screen_share_on {
            self.release(MediaKind::Screen);
            set_local_media(store, MediaKind::Screen, false, None);
            tracing::info!("screen share off");
            return Ok(None);
        }

        self.release(MediaKind::Screen);
        let ticket = self.issue(MediaKind::Screen);
        self.screen = Slot::Pending(ticket);
        set_local_media(store, MediaKind::Screen, true, None);
        Ok(Some(ticket))
    }

    /// Apply the result of an acquisition.
    ///
    /// On success the stream is bound to the local participant and its id is
    /// returned. On failure the flag is turned off and, for denials, a notice
    /// is raised.
    ///
    /// # Errors
    ///
    /// - [`MediaError::StaleResult`] if the ticket is no longer pending. Any
    ///   stream carried by the result has already been stopped.
    /// - The acquisition error itself, after the store has been reverted.
    pub fn complete(
        &mut self,
        ticket: AcquisitionTicket,
        result: Result<MediaStream, MediaError>,
        store: &mut SessionStore,
    ) -> Result<StreamId, MediaError> {
        let current = self.session;
        let slot = self.slot_mut(ticket.kind);
        let is_pending = matches!(slot, Slot::Pending(pending) if *pending == ticket);
        if ticket.session != current || !is_pending {
            if let Ok(stream) = result {
                let stopped = stream.stop();
                tracing::debug!(kind = %ticket.kind, stopped, "stopped stale stream");
            }
            return Err(MediaError::StaleResult { ticket });
        }

        match result {
            Ok(stream) => {
                let id = stream.id();
                *slot = Slot::Live(stream);
                set_local_media(store, ticket.kind, true, Some(id));
                tracing::info!(kind = %ticket.kind, stream = id, "media acquired");
                Ok(id)
            },
            Err(e) => {
                *slot = Slot::Idle;
                set_local_media(store, ticket.kind, false, None);
                if e.is_user_visible() {
                    store.raise_notice(match ticket.kind {
                        MediaKind::Camera => CAMERA_DENIED_NOTICE,
                        MediaKind::Screen => SCREEN_DENIED_NOTICE,
                    });
                }
                tracing::warn!(kind = %ticket.kind, "media acquisition failed: {e}");
                Err(e)
            },
        }
    }

    /// A stream was ended by the platform.
    ///
    /// Releases it and turns the matching flag off. Returns `false` if the
    /// stream is not owned (already released or never acquired).
    pub fn stream_ended(&mut self, stream_id: StreamId, store: &mut SessionStore) -> bool {
        let Some(kind) = [MediaKind::Camera, MediaKind::Screen]
            .into_iter()
            .find(|&kind| self.live_stream(kind) == Some(stream_id))
        else {
            tracing::debug!(stream = stream_id, "ended signal for unowned stream");
            return false;
        };

        self.release(kind);
        set_local_media(store, kind, false, None);
        tracing::info!(%kind, stream = stream_id, "media ended externally");
        true
    }

    /// Release everything and invalidate all pending requests.
    ///
    /// The local participant's media flags and stream bindings are cleared
    /// along with the slots.
    pub fn teardown(&mut self, store: &mut SessionStore) {
        self.session += 1;
        for kind in [MediaKind::Camera, MediaKind::Screen] {
            self.release(kind);
            set_local_media(store, kind, false, None);
        }
    }

    /// Id of the live stream of `kind`, if any.
    pub fn live_stream(&self, kind: MediaKind) -> Option<StreamId> {
        match self.slot(kind) {
            Slot::Live(stream) => Some(stream.id()),
            Slot::Idle | Slot::Pending(_) => None,
        }
    }

    /// True while an acquisition of `kind` is in flight.
    pub fn is_pending(&self, kind: MediaKind) -> bool {
        matches!(self.slot(kind), Slot::Pending(_))
    }

    /// Total tracks still running across all owned streams.
    pub fn running_tracks(&self) -> usize {
        [&self.camera, &self.screen]
            .into_iter()
            .map(|slot| match slot {
                Slot::Live(stream) => stream.track_count(),
                Slot::Idle | Slot::Pending(_) => 0,
            })
            .sum()
    }

    fn issue(&mut self, kind: MediaKind) -> AcquisitionTicket {
        self.next_seq += 1;
        AcquisitionTicket { kind, session: self.session, seq: self.next_seq }
    }

    fn release(&mut self, kind: MediaKind) {
        match mem::take(self.slot_mut(kind)) {
            Slot::Live(stream) => {
                let id = stream.id();
                let stopped = stream.stop();
                tracing::debug!(%kind, stream = id, stopped, "released stream");
            },
            Slot::Pending(ticket) => {
                tracing::debug!(%kind, seq = ticket.seq, "abandoned pending request");
            },
            Slot::Idle => {},
        }
    }

    fn slot(&self, kind: MediaKind) -> &Slot {
        match kind {
            MediaKind::Camera => &self.camera,
            MediaKind::Screen => &self.screen,
        }
    }

    fn slot_mut(&mut self, kind: MediaKind) -> &mut Slot {
        match kind {
            MediaKind::Camera => &mut self.camera,
            MediaKind::Screen => &mut self.screen,
        }
    }
}

/// Update the local participant's flag and stream binding for `kind`.
fn set_local_media(store: &mut SessionStore, kind: MediaKind, on: bool, stream: Option<StreamId>) {
    let local = ParticipantId::local();
    let result = match kind {
        MediaKind::Camera => store.set_video_on(&local, on),
        MediaKind::Screen => store.set_screen_share_on(&local, on),
    }
    .and_then(|()| store.set_stream(&local, kind, stream));

    if let Err(e) = result {
        tracing::warn!(%kind, "cannot update local media state: {e}");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;
    use crate::{media::MediaTrack, session::mock_roster};

    #[derive(Default, Clone)]
    struct Ledger {
        started: Arc<AtomicUsize>,
        stopped: Arc<AtomicUsize>,
    }

    impl Ledger {
        fn running(&self) -> usize {
            self.started.load(Ordering::SeqCst) - self.stopped.load(Ordering::SeqCst)
        }

        fn stream(&self, id: StreamId, kind: MediaKind) -> MediaStream {
            self.started.fetch_add(1, Ordering::SeqCst);
            MediaStream::new(id, kind, vec![Box::new(Track(Arc::clone(&self.stopped)))])
        }
    }

    struct Track(Arc<AtomicUsize>);

    impl MediaTrack for Track {
        fn label(&self) -> &str {
            "test"
        }

        fn stop(self: Box<Self>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn store(screen_supported: bool) -> SessionStore {
        let mut store = SessionStore::new(mock_roster());
        store.set_screen_share_supported(screen_supported);
        store
    }

    fn local(store: &SessionStore) -> &crate::session::Participant {
        store.local_participant().unwrap()
    }

    fn denied(kind: MediaKind) -> MediaError {
        MediaError::AccessDenied { kind, reason: "denied by user".into() }
    }

    #[test]
    fn camera_turns_on_only_after_acquisition() {
        let mut store = store(true);
        let mut media = MediaManager::new();
        let ledger = Ledger::default();

        let ticket = media.toggle_video(&mut store).unwrap();
        assert!(!local(&store).is_video_on);
        assert!(media.is_pending(MediaKind::Camera));

        let id = media.complete(ticket, Ok(ledger.stream(7, MediaKind::Camera)), &mut store);
        assert_eq!(id, Ok(7));
        assert!(local(&store).is_video_on);
        assert_eq!(local(&store).camera_stream, Some(7));
        assert_eq!(ledger.running(), 1);
    }

    #[test]
    fn toggling_video_twice_releases_every_track() {
        let mut store = store(true);
        let mut media = MediaManager::new();
        let ledger = Ledger::default();

        let ticket = media.toggle_video(&mut store).unwrap();
        media.complete(ticket, Ok(ledger.stream(1, MediaKind::Camera)), &mut store).unwrap();
        assert!(media.toggle_video(&mut store).is_none());

        assert!(!local(&store).is_video_on);
        assert_eq!(local(&store).camera_stream, None);
        assert_eq!(ledger.running(), 0);
        assert_eq!(media.running_tracks(), 0);
    }

    #[test]
    fn camera_denial_keeps_flag_off_and_notifies() {
        let mut store = store(true);
        let mut media = MediaManager::new();

        let ticket = media.toggle_video(&mut store).unwrap();
        let result = media.complete(ticket, Err(denied(MediaKind::Camera)), &mut store);

        assert!(matches!(result, Err(MediaError::AccessDenied { .. })));
        assert!(!local(&store).is_video_on);
        assert_eq!(store.notice().map(|n| n.message.as_str()), Some(CAMERA_DENIED_NOTICE));
        assert!(!media.is_pending(MediaKind::Camera));
    }

    #[test]
    fn second_camera_toggle_while_pending_is_ignored() {
        let mut store = store(true);
        let mut media = MediaManager::new();

        assert!(media.toggle_video(&mut store).is_some());
        assert!(media.toggle_video(&mut store).is_none());
        assert!(media.is_pending(MediaKind::Camera));
    }

    #[test]
    fn unsupported_screen_share_is_a_no_op() {
        let mut store = store(false);
        let mut media = MediaManager::new();
        let before = store.clone();

        let result = media.toggle_screen_share(&mut store);
        assert_eq!(result, Err(MediaError::UnsupportedCapability { kind: MediaKind::Screen }));
        assert_eq!(store, before);
    }

    #[test]
    fn screen_share_flag_flips_before_acquisition() {
        let mut store = store(true);
        let mut media = MediaManager::new();
        let ledger = Ledger::default();

        let ticket = media.toggle_screen_share(&mut store).unwrap().unwrap();
        assert!(local(&store).is_screen_share_on);
        assert_eq!(local(&store).screen_stream, None);

        media.complete(ticket, Ok(ledger.stream(3, MediaKind::Screen)), &mut store).unwrap();
        assert_eq!(local(&store).screen_stream, Some(3));

        assert_eq!(media.toggle_screen_share(&mut store), Ok(None));
        assert!(!local(&store).is_screen_share_on);
        assert_eq!(ledger.running(), 0);
    }

    #[test]
    fn screen_share_failure_reverts_flag() {
        let mut store = store(true);
        let mut media = MediaManager::new();

        let ticket = media.toggle_screen_share(&mut store).unwrap().unwrap();
        let _ = media.complete(ticket, Err(denied(MediaKind::Screen)), &mut store);

        assert!(!local(&store).is_screen_share_on);
        assert_eq!(store.notice().map(|n| n.message.as_str()), Some(SCREEN_DENIED_NOTICE));
    }

    #[test]
    fn share_ended_externally_releases_stream() {
        let mut store = store(true);
        let mut media = MediaManager::new();
        let ledger = Ledger::default();

        let ticket = media.toggle_screen_share(&mut store).unwrap().unwrap();
        media.complete(ticket, Ok(ledger.stream(9, MediaKind::Screen)), &mut store).unwrap();

        assert!(media.stream_ended(9, &mut store));
        assert!(!local(&store).is_screen_share_on);
        assert_eq!(ledger.running(), 0);

        // A second signal for the same stream is ignored
        assert!(!media.stream_ended(9, &mut store));
    }

    #[test]
    fn result_after_user_cancelled_share_is_stale() {
        let mut store = store(true);
        let mut media = MediaManager::new();
        let ledger = Ledger::default();

        let ticket = media.toggle_screen_share(&mut store).unwrap().unwrap();
        media.toggle_screen_share(&mut store).unwrap();

        let result = media.complete(ticket, Ok(ledger.stream(4, MediaKind::Screen)), &mut store);
        assert_eq!(result, Err(MediaError::StaleResult { ticket }));
        assert!(!local(&store).is_screen_share_on);
        assert_eq!(ledger.running(), 0);
    }

    #[test]
    fn result_after_teardown_is_stale() {
        let mut store = store(true);
        let mut media = MediaManager::new();
        let ledger = Ledger::default();

        let ticket = media.toggle_video(&mut store).unwrap();
        media.teardown(&mut store);

        let result = media.complete(ticket, Ok(ledger.stream(5, MediaKind::Camera)), &mut store);
        assert!(matches!(result, Err(MediaError::StaleResult { .. })));
        assert!(!local(&store).is_video_on);
        assert_eq!(ledger.running(), 0);
    }

    #[test]
    fn teardown_releases_live_streams() {
        let mut store = store(true);
        let mut media = MediaManager::new();
        let ledger = Ledger::default();

        let camera = media.toggle_video(&mut store).unwrap();
        media.complete(camera, Ok(ledger.stream(1, MediaKind::Camera)), &mut store).unwrap();
        let screen = media.toggle_screen_share(&mut store).unwrap().unwrap();
        media.complete(screen, Ok(ledger.stream(2, MediaKind::Screen)), &mut store).unwrap();
        assert_eq!(media.running_tracks(), 2);

        media.teardown(&mut store);
        assert_eq!(ledger.running(), 0);
        assert_eq!(media.running_tracks(), 0);

        let local = local(&store);
        assert!(!local.is_video_on);
        assert!(!local.is_screen_share_on);
        assert_eq!(local.camera_stream, None);
        assert_eq!(local.screen_stream, None);
    }

    #[test]
    fn teardown_clears_share_flag_of_pending_request() {
        let mut store = store(true);
        let mut media = MediaManager::new();

        let ticket = media.toggle_screen_share(&mut store).unwrap().unwrap();
        assert!(local(&store).is_screen_share_on);

        media.teardown(&mut store);
        assert!(!local(&store).is_screen_share_on);
        assert!(!media.is_pending(MediaKind::Screen));

        let ledger = Ledger::default();
        let result = media.complete(ticket, Ok(ledger.stream(6, MediaKind::Screen)), &mut store);
        assert_eq!(result, Err(MediaError::StaleResult { ticket }));
        assert!(!local(&store).is_screen_share_on);
        assert_eq!(ledger.running(), 0);
    }
}
