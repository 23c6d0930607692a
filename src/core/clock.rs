//! Time source abstraction.
//!
//! Deadlines are computed from an injectable [`Clock`] rather than a
//! hard-wired call to `Instant::now()`, so deadline arithmetic can be tested
//! deterministically. See `pacer::testing::ManualClock` for a controllable
//! implementation.

use std::time::Instant;

/// A monotonic source of "now".
pub trait Clock: Send + Sync {
    /// Return the current instant.
    fn now(&self) -> Instant;
}

/// The default clock, backed by `std::time::Instant`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
