//! Pinch gesture interpreter.
//!
//! Converts two-finger touch sequences on the video grid into a zoom scale
//! and a pin/unpin decision.
//!
//! # State Machine
//!
//! ```text
//!            two touches          move (>= 2 touches)
//! ┌──────┐ ──────────────> ┌──────────┐ ─────────┐
//! │ Idle │                 │ Pinching │ <────────┘
//! └──────┘ <────────────── └──────────┘
//!            end / cancel / fewer than two touches
//! ```
//!
//! A pinch only ever looks at the first two touch points. A third finger
//! does not renegotiate the reference distance.

use crate::session::{MIN_ZOOM, SessionStore};

/// Scale above which the active speaker is pinned.
pub const DEFAULT_PIN_SCALE: f64 = 1.2;

/// Scale below which the grid is unpinned.
pub const DEFAULT_UNPIN_SCALE: f64 = 0.8;

/// Pinch thresholds.
///
/// The published zoom is clamped by [`SessionStore::set_zoom`] to
/// [`MIN_ZOOM`]..=[`MAX_ZOOM`](crate::session::MAX_ZOOM); these thresholds apply to the raw scale.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureConfig {
    /// Raw scale above which the active speaker gets pinned
    pub pin_scale: f64,
    /// Raw scale below which the pin is cleared
    pub unpin_scale: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            pin_scale: DEFAULT_PIN_SCALE,
            unpin_scale: DEFAULT_UNPIN_SCALE,
        }
    }
}

/// A touch point in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    /// Horizontal position
    pub x: f64,
    /// Vertical position
    pub y: f64,
}

impl TouchPoint {
    /// Create a touch point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Phase of a touch event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    /// Finger(s) went down
    Start,
    /// Finger(s) moved
    Move,
    /// Finger(s) lifted
    End,
    /// Platform cancelled the sequence
    Cancel,
}

/// Ephemeral state of an ongoing pinch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchState {
    /// Distance between the two fingers when the pinch began
    pub initial_distance: f64,
    /// Latest raw (unclamped) scale
    pub scale: f64,
}

/// Gesture interpreter for the video grid surface.
#[derive(Debug, Clone, Default)]
pub struct GestureInterpreter {
    config: GestureConfig,
    pinch: Option<PinchState>,
}

impl GestureInterpreter {
    /// Create an idle interpreter.
    pub fn new(config: GestureConfig) -> Self {
        Self { config, pinch: None }
    }

    /// Ongoing pinch. `None` while idle.
    pub fn pinch(&self) -> Option<&PinchState> {
        self.pinch.as_ref()
    }

    /// Feed one touch event. `touches` holds the points still on the surface.
    pub fn handle(&mut self, phase: TouchPhase, touches: &[TouchPoint], store: &mut SessionStore) {
        match phase {
            TouchPhase::Start => self.touch_start(touches),
            TouchPhase::Move => self.touch_move(touches, store),
            TouchPhase::End | TouchPhase::Cancel => self.release(store),
        }
    }

    /// Begin a pinch when exactly two points are down.
    fn touch_start(&mut self, touches: &[TouchPoint]) {
        let [a, b] = touches else {
            return;
        };
        let initial_distance = a.distance(b);
        if !initial_distance.is_normal() {
            tracing::debug!(initial_distance, "ignoring pinch with degenerate distance");
            return;
        }
        self.pinch = Some(PinchState { initial_distance, scale: 1.0 });
    }

    fn touch_move(&mut self, touches: &[TouchPoint], store: &mut SessionStore) {
        if self.pinch.is_none() {
            return;
        }
        let [a, b, ..] = touches else {
            self.release(store);
            return;
        };
        let Some(pinch) = self.pinch.as_mut() else {
            return;
        };

        let scale = a.distance(b) / pinch.initial_distance;
        pinch.scale = scale;
        store.set_zoom(scale);

        let speaker = store.active_speaker().map(|p| p.id.clone());
        let result = match speaker {
            Some(id) if scale > self.config.pin_scale => store.set_pinned(Some(id)),
            _ if scale < self.config.unpin_scale => store.set_pinned(None),
            _ => Ok(()),
        };
        if let Err(e) = result {
            tracing::debug!("pinch pin update rejected: {e}");
        }
    }

    /// Return to idle. Always resets the zoom and unpins.
    fn release(&mut self, store: &mut SessionStore) {
        self.pinch = None;
        store.set_zoom(MIN_ZOOM);
        if let Err(e) = store.set_pinned(None) {
            tracing::debug!("unpin on release rejected: {e}");
        }
    }
}
