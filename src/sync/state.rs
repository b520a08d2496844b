use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use chrono::{DateTime, Local};

use crate::time::Clock;

/// An NTP timestamp paired with the monotonic reading taken when it arrived
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    /// Server time in local representation
    pub time: DateTime<Local>,
    /// Monotonic clock reading at reception
    pub monotonic: Instant,
}

impl Anchor {
    /// Advances the anchor time by the monotonic time elapsed since capture
    pub fn extrapolate(&self, now: Instant) -> DateTime<Local> {
        let elapsed = now.saturating_duration_since(self.monotonic);
        chrono::Duration::from_std(elapsed)
            .ok()
            .and_then(|elapsed| self.time.checked_add_signed(elapsed))
            .unwrap_or(self.time)
    }
}

/// Snapshot published by the service.
///
/// Readers always see a whole snapshot, so the anchor time and its monotonic
/// reading can never be observed out of step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncState {
    anchor: Option<Anchor>,
}

impl SyncState {
    /// State before any successful request
    pub fn unsynchronized() -> Self {
        SyncState { anchor: None }
    }

    /// State after a successful request
    pub fn synchronized(anchor: Anchor) -> Self {
        SyncState {
            anchor: Some(anchor),
        }
    }

    /// Whether an NTP sample has been applied
    pub fn is_synchronized(&self) -> bool {
        self.anchor.is_some()
    }

    /// The last applied sample
    pub fn anchor(&self) -> Option<Anchor> {
        self.anchor
    }

    /// Current time estimate, the local clock until synchronized
    pub fn now(&self, clock: &dyn Clock) -> DateTime<Local> {
        match &self.anchor {
            Some(anchor) => anchor.extrapolate(clock.instant()),
            None => clock.local_now(),
        }
    }
}

/// Counters describing the synchronization activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncStats {
    /// Requests started
    pub attempts: u64,
    /// Requests that ended in a retryable error
    pub failures: u64,
    /// Ticks skipped because the network was unreachable
    pub skipped: u64,
    /// Sockets currently open
    pub active_sockets: usize,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    attempts: AtomicU64,
    failures: AtomicU64,
    skipped: AtomicU64,
}

impl Counters {
    pub(crate) fn record_attempt(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_skip(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, active_sockets: usize) -> SyncStats {
        SyncStats {
            attempts: self.attempts.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            active_sockets,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::{ntp_to_local, ManualClock};
    use std::time::Duration;

    #[test]
    fn test_unsynchronized_falls_back_to_local_clock() {
        let clock = ManualClock::new();
        let state = SyncState::unsynchronized();

        assert!(!state.is_synchronized());
        assert_eq!(state.anchor(), None);
        assert_eq!(state.now(&clock), clock.local_now());
    }

    #[test]
    fn test_synchronized_extrapolates() {
        let clock = ManualClock::new();
        let anchor = Anchor {
            time: ntp_to_local(3_794_992_800, 0).unwrap(),
            monotonic: clock.instant(),
        };
        let state = SyncState::synchronized(anchor);

        assert!(state.is_synchronized());
        assert_eq!(state.now(&clock), anchor.time);

        clock.advance(Duration::from_millis(2750));
        assert_eq!((state.now(&clock) - anchor.time).num_milliseconds(), 2750);
    }

    #[test]
    fn test_extrapolate_never_goes_backwards() {
        let now = Instant::now();
        let anchor = Anchor {
            time: ntp_to_local(3_794_992_800, 0).unwrap(),
            monotonic: now + Duration::from_secs(5),
        };
        assert_eq!(anchor.extrapolate(now), anchor.time);
    }

    #[test]
    fn test_counters_snapshot() {
        let counters = Counters::default();
        counters.record_attempt();
        counters.record_attempt();
        counters.record_failure();
        counters.record_skip();

        let stats = counters.snapshot(1);
        assert_eq!(
            stats,
            SyncStats {
                attempts: 2,
                failures: 1,
                skipped: 1,
                active_sockets: 1,
            }
        );
    }
}
