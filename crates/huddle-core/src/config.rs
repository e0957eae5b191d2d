//! Session configuration.
//!
//! Each component owns its own config type with defaults matching the
//! behaviour users expect from the call UI. [`SessionConfig`] bundles them
//! for the application layer.

use crate::{controls::ControlsConfig, gesture::GestureConfig, speaker::SpeakerConfig};

/// Configuration for every timed or thresholded component of a session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionConfig {
    /// Active-speaker sampling cadence and threshold
    pub speaker: SpeakerConfig,
    /// Pinch zoom bounds and pin/unpin thresholds
    pub gesture: GestureConfig,
    /// Floating control auto-hide delay
    pub controls: ControlsConfig,
}
