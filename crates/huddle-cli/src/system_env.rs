//! Real clocks for the console session.
//!
//! Deadlines come from [`std::time::Instant`], chat timestamps from the
//! wall clock and sleeps from tokio. This is the only place either clock is
//! read; simulations substitute `SimEnv`.

use std::time::Duration;

use chrono::{DateTime, Utc};
use huddle_core::Environment;

/// Clocks and timers of the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Host environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    type Instant = std::time::Instant;

    #[allow(clippy::disallowed_methods)]
    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    #[allow(clippy::disallowed_methods)]
    fn wall_clock(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}
