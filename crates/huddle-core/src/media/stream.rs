//! Owned media streams.
//!
//! A [`MediaStream`] owns its tracks. Stopping the stream consumes it and
//! dropping it stops whatever is still running, so every track is stopped
//! exactly once no matter which path releases it.

use std::fmt;

use futures::future::BoxFuture;

/// Identifier of an acquired stream, unique per device provider.
pub type StreamId = u64;

/// Kind of media resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// Local camera
    Camera,
    /// Screen capture
    Screen,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Camera => f.write_str("camera"),
            Self::Screen => f.write_str("screen capture"),
        }
    }
}

/// A single running media track.
pub trait MediaTrack: Send {
    /// Human readable label for logs.
    fn label(&self) -> &str;

    /// Stop the track and release the device.
    ///
    /// Consumes the track, so it cannot be stopped twice.
    fn stop(self: Box<Self>);
}

/// How a stream's ended signal resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackEnd {
    /// The platform ended the stream out-of-band (e.g. "Stop sharing")
    External,
    /// The stream was released by its owner
    Released,
}

/// Resolves once a stream ends, for whatever reason.
pub type EndedSignal = BoxFuture<'static, TrackEnd>;

/// An acquired media stream and the tracks it owns.
pub struct MediaStream {
    id: StreamId,
    kind: MediaKind,
    tracks: Vec<Box<dyn MediaTrack>>,
    ended: Option<EndedSignal>,
}

impl MediaStream {
    /// Create a stream owning `tracks`.
    pub fn new(id: StreamId, kind: MediaKind, tracks: Vec<Box<dyn MediaTrack>>) -> Self {
        Self { id, kind, tracks, ended: None }
    }

    /// Attach a signal that resolves when the stream ends.
    #[must_use]
    pub fn with_ended_signal(mut self, signal: EndedSignal) -> Self {
        self.ended = Some(signal);
        self
    }

    /// Detach the ended signal so the caller can observe it.
    pub fn take_ended_signal(&mut self) -> Option<EndedSignal> {
        self.ended.take()
    }

    /// Stream id.
    pub fn id(&self) -> StreamId {
        self.id
    }

    /// Resource kind.
    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /// Number of tracks still running.
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Stop every track. Returns how many were stopped.
    pub fn stop(mut self) -> usize {
        self.stop_tracks()
    }

    fn stop_tracks(&mut self) -> usize {
        let count = self.tracks.len();
        for track in self.tracks.drain(..) {
            tracing::trace!(stream = self.id, track = track.label(), "stopping track");
            track.stop();
        }
        count
    }
}

impl Drop for MediaStream {
    fn drop(&mut self) {
        self.stop_tracks();
    }
}

impl fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaStream")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("tracks", &self.tracks.len())
            .field("ended_signal", &self.ended.is_some())
            .finish()
    }
}
