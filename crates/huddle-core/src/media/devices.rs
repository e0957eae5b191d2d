//! Media capability boundary.

use futures::future::BoxFuture;

use super::{MediaKind, MediaStream};
use crate::error::MediaError;

/// Pending acquisition of a stream.
pub type Acquisition = BoxFuture<'static, Result<MediaStream, MediaError>>;

/// Platform capability for acquiring camera and screen-capture streams.
///
/// Requests return `'static` futures so the runtime can keep several in
/// flight and drop them on shutdown.
pub trait MediaDevices: Send + Sync {
    /// One-shot probe for screen-capture support.
    fn supports_screen_capture(&self) -> bool;

    /// Ask for camera access.
    fn request_camera(&self) -> Acquisition;

    /// Ask the user to pick a screen or window to capture.
    fn request_screen_capture(&self) -> Acquisition;

    /// Request a stream of the given kind.
    fn request(&self, kind: MediaKind) -> Acquisition {
        match kind {
            MediaKind::Camera => self.request_camera(),
            MediaKind::Screen => self.request_screen_capture(),
        }
    }
}
