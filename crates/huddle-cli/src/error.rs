//! Binary-level errors.

use std::io;

use thiserror::Error;

/// Errors that stop the console session.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Reading stdin failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
