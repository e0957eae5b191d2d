//! Media resource lifecycle.
//!
//! Camera and screen-capture streams are acquired asynchronously through the
//! [`MediaDevices`] capability and owned exclusively by the [`MediaManager`].
//! The manager itself never awaits: it hands out [`AcquisitionTicket`]s and
//! later accepts results tagged with them, discarding anything stale.

mod devices;
mod manager;
mod stream;

pub use devices::{Acquisition, MediaDevices};
pub use manager::{AcquisitionTicket, CAMERA_DENIED_NOTICE, MediaManager, SCREEN_DENIED_NOTICE};
pub use stream::{EndedSignal, MediaKind, MediaStream, MediaTrack, StreamId, TrackEnd};
