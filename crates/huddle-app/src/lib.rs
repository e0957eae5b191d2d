//! Application layer for Huddle
//!
//! Orchestrates the session core into a single event-driven state machine
//! and a generic runtime, so the same code runs against a console session and
//! against deterministic simulation.
//!
//! # Components
//!
//! - [`App`]: session state machine (events in, actions out)
//! - [`Driver`]: trait for platform-specific input and rendering
//! - [`Runtime`]: generic orchestration loop owning in-flight acquisitions

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod app;
mod driver;
mod event;
mod input;
mod runtime;

pub use action::AppAction;
pub use app::{App, CallPhase};
pub use driver::Driver;
pub use event::AppEvent;
pub use input::Interaction;
pub use runtime::Runtime;
