//! Floating control auto-hide.
//!
//! Any qualifying interaction shows the controls and (re)arms a single-shot
//! deadline. If the deadline passes with no further interaction the controls
//! hide. Each interaction replaces the previous deadline (debounce, not
//! throttle).
//!
//! The timer is a deadline, not a callback: the caller polls it with the
//! current time. [`ControlVisibility::cancel`] disarms it so that nothing
//! fires after teardown.

use std::time::Duration;

use crate::{env::Moment, session::SessionStore};

/// Time without interaction before the controls hide.
pub const DEFAULT_HIDE_AFTER: Duration = Duration::from_millis(3000);

/// Auto-hide configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlsConfig {
    /// Idle time before hiding
    pub hide_after: Duration,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self { hide_after: DEFAULT_HIDE_AFTER }
    }
}

/// Debounced visibility timer for the floating call controls.
#[derive(Debug, Clone)]
pub struct ControlVisibility<I> {
    config: ControlsConfig,
    /// Pending hide deadline. `None` when disarmed.
    deadline: Option<I>,
}

impl<I: Moment> ControlVisibility<I> {
    /// Create a disarmed timer.
    pub fn new(config: ControlsConfig) -> Self {
        Self { config, deadline: None }
    }

    /// Register an interaction: show the controls and restart the countdown.
    pub fn interact(&mut self, store: &mut SessionStore, now: I) {
        store.set_controls_visible(true);
        self.deadline = Some(now + self.config.hide_after);
    }

    /// Hide the controls if the deadline has passed.
    ///
    /// Returns `true` if this call hid them.
    pub fn poll(&mut self, store: &mut SessionStore, now: I) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                store.set_controls_visible(false);
                true
            },
            _ => false,
        }
    }

    /// Disarm the timer without touching the store.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// When the controls will hide, if armed.
    pub fn next_deadline(&self) -> Option<I> {
        self.deadline
    }
}
