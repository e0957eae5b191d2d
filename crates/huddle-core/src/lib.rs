//! Session core for Huddle
//!
//! Pure, I/O-free state machines behind a simulated video meeting: the
//! session store, active-speaker detection, pinch gestures, floating-control
//! auto-hide and the media resource lifecycle. Time is always passed in by
//! the caller and every capability (camera, screen capture, audio levels)
//! sits behind a trait, so the same code runs under a real clock and under
//! deterministic simulation.
//!
//! # Components
//!
//! - [`session::SessionStore`]: single source of truth read by the renderer
//! - [`speaker::SpeakerDetector`]: per-participant audio level sampling
//! - [`gesture::GestureInterpreter`]: two-finger pinch to zoom and pin
//! - [`controls::ControlVisibility`]: debounced auto-hide of call controls
//! - [`media::MediaManager`]: camera and screen-capture ownership

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod controls;
pub mod env;
pub mod error;
pub mod gesture;
pub mod media;
pub mod session;
pub mod speaker;

pub use config::SessionConfig;
pub use env::{Environment, Moment};
pub use error::{MediaError, SessionError};
