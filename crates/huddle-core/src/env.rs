//! Environment abstraction for deterministic testing.
//!
//! Decouples session logic from the system clock. Production uses the real
//! monotonic clock and wall clock; simulation uses a virtual clock that only
//! advances when the test says so.

use std::{
    future::Future,
    ops::{Add, Sub},
    time::Duration,
};

use chrono::{DateTime, Utc};

/// Monotonic instant usable for deadlines.
///
/// Blanket-implemented for every type with the required arithmetic, which
/// covers `std::time::Instant` and the harness's virtual instant.
pub trait Moment:
    Copy + Ord + Send + Sync + Sub<Output = Duration> + Add<Duration, Output = Self>
{
}

impl<T> Moment for T where
    T: Copy + Ord + Send + Sync + Sub<Output = Duration> + Add<Duration, Output = T>
{
}

/// Abstract environment providing time and async sleeping.
///
/// Implementations MUST guarantee that `now()` never goes backwards.
pub trait Environment: Clone + Send + Sync + 'static {
    /// The instant type used by this environment.
    ///
    /// Production environments use `std::time::Instant`, simulation uses a
    /// virtual instant.
    type Instant: Moment;

    /// Current monotonic time.
    fn now(&self) -> Self::Instant;

    /// Current wall-clock time, used to timestamp chat messages.
    fn wall_clock(&self) -> DateTime<Utc>;

    /// Sleeps for the specified duration.
    ///
    /// Only driver code sleeps. State machines take `now` as a parameter and
    /// report their next deadline instead.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}
