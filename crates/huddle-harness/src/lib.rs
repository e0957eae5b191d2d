//! Deterministic simulation harness for Huddle.
//!
//! Scripted implementations of every capability the session stack consumes:
//! a virtual clock, camera and screen capture, audio level sampling and a
//! driver, so the production [`huddle_app::Runtime`] runs unchanged and
//! reproducibly in tests.
//!
//! # Invariants
//!
//! [`SimDriver::with_invariants`] checks every render against an
//! [`InvariantRegistry`], so any script doubles as a property check. The
//! property tests run the same registry after each generated step.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod sim_audio;
pub mod sim_driver;
pub mod sim_env;
pub mod sim_media;

pub use invariants::{
    Invariant, InvariantKind, InvariantRegistry, InvariantResult, SessionSnapshot, Violation,
};
pub use sim_audio::SimAudioMeter;
pub use sim_driver::{RenderLog, RenderedFrame, SimDriver, SimDriverError};
pub use sim_env::{SimEnv, SimInstant};
pub use sim_media::{SimMediaDevices, TrackLedger};
