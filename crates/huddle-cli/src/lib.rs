//! Headless console frontend for Huddle.
//!
//! Runs the production [`huddle_app::Runtime`] against line commands on
//! stdin, mocked camera and screen capture, and randomly generated audio
//! levels. Renders are structured log lines.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod command;
pub mod console;
pub mod devices;
pub mod error;
pub mod system_env;

pub use command::{Command, CommandError};
pub use console::ConsoleDriver;
pub use devices::{MockAudioMeter, MockMediaDevices};
pub use error::RuntimeError;
pub use system_env::SystemEnv;
