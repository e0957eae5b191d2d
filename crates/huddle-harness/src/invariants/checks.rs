//! The six session rules in [`super::InvariantRegistry::standard`].
//!
//! Each check reports the first offending value it finds.

use huddle_core::session::{MAX_ZOOM, MIN_ZOOM};

use super::{Invariant, InvariantKind, InvariantResult, SessionSnapshot, Violation};

/// At most one participant is the active speaker.
pub struct SingleActiveSpeaker;

impl Invariant for SingleActiveSpeaker {
    fn kind(&self) -> InvariantKind {
        InvariantKind::SingleActiveSpeaker
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        let active: Vec<_> =
            state.participants.iter().filter(|p| p.is_active).map(|p| p.id.as_str()).collect();
        if active.len() > 1 {
            return Err(Violation {
                invariant: self.kind(),
                message: format!("{} active speakers: {active:?}", active.len()),
            });
        }
        Ok(())
    }
}

/// A pinned participant must be in the roster.
///
/// Removing the pinned participant has to clear the pin, otherwise the
/// renderer would show a tile for someone who left.
pub struct PinnedInRoster;

impl Invariant for PinnedInRoster {
    fn kind(&self) -> InvariantKind {
        InvariantKind::PinnedInRoster
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        if let Some(pinned) = &state.pinned
            && !state.participants.iter().any(|p| &p.id == pinned)
        {
            return Err(Violation {
                invariant: self.kind(),
                message: format!("pinned participant {pinned} not in roster"),
            });
        }
        Ok(())
    }
}

/// Zoom stays within the display clamp.
pub struct ZoomInRange;

impl Invariant for ZoomInRange {
    fn kind(&self) -> InvariantKind {
        InvariantKind::ZoomInRange
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        if !(MIN_ZOOM..=MAX_ZOOM).contains(&state.zoom_scale) {
            return Err(Violation {
                invariant: self.kind(),
                message: format!("zoom {} outside [{MIN_ZOOM}, {MAX_ZOOM}]", state.zoom_scale),
            });
        }
        Ok(())
    }
}

/// Message ids strictly increase in log order.
pub struct MessageIdsIncreasing;

impl Invariant for MessageIdsIncreasing {
    fn kind(&self) -> InvariantKind {
        InvariantKind::MessageIdsIncreasing
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        for window in state.messages.windows(2) {
            if window[1].id <= window[0].id {
                return Err(Violation {
                    invariant: self.kind(),
                    message: format!("message id {} follows {}", window[1].id, window[0].id),
                });
            }
        }
        Ok(())
    }
}

/// The read watermark never points past the newest remote message.
pub struct WatermarkNotAhead;

impl Invariant for WatermarkNotAhead {
    fn kind(&self) -> InvariantKind {
        InvariantKind::WatermarkNotAhead
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        let newest_remote =
            state.messages.iter().filter(|m| !m.from_local).map(|m| m.id).max().unwrap_or(0);
        if state.last_read_other_message_id > newest_remote {
            return Err(Violation {
                invariant: self.kind(),
                message: format!(
                    "watermark {} ahead of newest remote message {newest_remote}",
                    state.last_read_other_message_id
                ),
            });
        }
        Ok(())
    }
}

/// No media track keeps running while its flag is off.
pub struct NoOrphanTracks;

impl Invariant for NoOrphanTracks {
    fn kind(&self) -> InvariantKind {
        InvariantKind::NoOrphanTracks
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        let (video_on, share_on) =
            state.local().map_or((false, false), |p| (p.is_video_on, p.is_screen_share_on));

        if !video_on && state.running_camera_tracks > 0 {
            return Err(Violation {
                invariant: self.kind(),
                message: format!("{} camera tracks running with video off", state.running_camera_tracks),
            });
        }
        if !share_on && state.running_screen_tracks > 0 {
            return Err(Violation {
                invariant: self.kind(),
                message: format!(
                    "{} screen tracks running with sharing off",
                    state.running_screen_tracks
                ),
            });
        }
        Ok(())
    }
}

/// Media the local participant claims on is backed by a live stream.
///
/// Video on needs a bound camera stream. A bound stream needs its flag on
/// and, when device tracks are observed, a running track of its kind.
/// Sharing may be on without a binding while capture is still pending.
pub struct NoDanglingMedia;

impl Invariant for NoDanglingMedia {
    fn kind(&self) -> InvariantKind {
        InvariantKind::NoDanglingMedia
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        let Some(local) = state.local() else {
            return Ok(());
        };
        let dangling = |message: String| Err(Violation { invariant: self.kind(), message });

        if local.is_video_on && local.camera_stream.is_none() {
            return dangling("video on without a camera stream".to_string());
        }

        let bindings = [
            ("camera", local.is_video_on, local.camera_stream, state.running_camera_tracks),
            ("screen", local.is_screen_share_on, local.screen_stream, state.running_screen_tracks),
        ];
        for (kind, on, stream, running) in bindings {
            let Some(id) = stream else {
                continue;
            };
            if !on {
                return dangling(format!("{kind} stream {id} still bound with its flag off"));
            }
            if state.tracks_observed && running == 0 {
                return dangling(format!("{kind} stream {id} bound but no {kind} track running"));
            }
        }
        Ok(())
    }
}
