//! Virtual-time environment.
//!
//! [`SimEnv`] implements [`Environment`] over a clock that only moves when a
//! test advances it (directly or by sleeping). Clones share the clock.

use std::{
    future::Future,
    ops::{Add, Sub},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use chrono::{DateTime, TimeDelta, Utc};
use huddle_core::Environment;

/// Wall-clock time at simulation start (2023-11-14T22:13:20Z).
const EPOCH_SECS: i64 = 1_700_000_000;

/// Instant on the virtual clock.
///
/// Subtraction saturates at zero, like `std::time::Instant`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SimInstant(Duration);

impl SimInstant {
    /// Simulation start.
    pub const START: Self = Self(Duration::ZERO);

    /// Time elapsed since simulation start.
    pub fn since_start(self) -> Duration {
        self.0
    }
}

impl Sub for SimInstant {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        self.0.saturating_sub(rhs.0)
    }
}

impl Add<Duration> for SimInstant {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self {
        Self(self.0 + rhs)
    }
}

/// Deterministic environment with a shared virtual clock.
#[derive(Debug, Clone)]
pub struct SimEnv {
    elapsed_nanos: Arc<AtomicU64>,
    epoch: DateTime<Utc>,
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl SimEnv {
    /// Create an environment at [`SimInstant::START`].
    pub fn new() -> Self {
        let epoch = DateTime::from_timestamp(EPOCH_SECS, 0).unwrap_or_default();
        Self { elapsed_nanos: Arc::new(AtomicU64::new(0)), epoch }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        self.elapsed_nanos.fetch_add(by.as_nanos() as u64, Ordering::SeqCst);
    }

    /// Time elapsed since start.
    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.elapsed_nanos.load(Ordering::SeqCst))
    }
}

impl Environment for SimEnv {
    type Instant = SimInstant;

    fn now(&self) -> SimInstant {
        SimInstant(self.elapsed())
    }

    fn wall_clock(&self) -> DateTime<Utc> {
        let elapsed = TimeDelta::from_std(self.elapsed()).unwrap_or(TimeDelta::MAX);
        self.epoch + elapsed
    }

    /// Advances the clock and completes immediately.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        self.advance(duration);
        std::future::ready(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_moves_only_when_advanced() {
        let env = SimEnv::new();
        let start = env.now();
        assert_eq!(env.now(), start);

        env.advance(Duration::from_millis(250));

        assert_eq!(env.now() - start, Duration::from_millis(250));
        assert_eq!(env.wall_clock() - env.epoch, TimeDelta::milliseconds(250));
    }

    #[test]
    fn clones_share_the_clock() {
        let env = SimEnv::new();
        let other = env.clone();

        other.advance(Duration::from_secs(1));

        assert_eq!(env.elapsed(), Duration::from_secs(1));
    }

    #[test]
    fn sleep_advances_virtual_time() {
        let env = SimEnv::new();

        futures::executor::block_on(env.sleep(Duration::from_millis(200)));

        assert_eq!(env.now().since_start(), Duration::from_millis(200));
    }

    #[test]
    fn earlier_minus_later_saturates() {
        let later = SimInstant::START + Duration::from_secs(1);

        assert_eq!(SimInstant::START - later, Duration::ZERO);
    }
}
