use std::fmt;
use std::time::Instant;

use chrono::{DateTime, Local};

/// Source of the two clocks the synchronized time is derived from.
///
/// The monotonic reading anchors an NTP sample, the wall clock is the
/// fallback used until the first sample arrives.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current monotonic instant
    fn instant(&self) -> Instant;

    /// Returns the local wall-clock time
    fn local_now(&self) -> DateTime<Local>;
}

/// Clock backed by `std::time::Instant` and the operating system wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn instant(&self) -> Instant {
        Instant::now()
    }

    fn local_now(&self) -> DateTime<Local> {
        Local::now()
    }
}
