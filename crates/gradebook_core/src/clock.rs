//! Injectable time source for archive timestamps.
//!
//! # Invariants
//! - All timestamps are Unix epoch milliseconds.
//! - [`ManualClock`] is deterministic and never reads wall time.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of epoch-millisecond timestamps.
pub trait Clock {
    fn now_ms(&self) -> i64;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> i64 {
        (**self).now_ms()
    }
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        // Pre-1970 system time is clamped to the epoch.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or(0)
    }
}

/// Settable clock for tests and replay.
///
/// With a non-zero `step_ms`, every reading advances the clock afterwards,
/// so consecutive readings are strictly increasing.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicI64,
    step_ms: i64,
}

impl ManualClock {
    pub fn new(now_ms: i64) -> Self {
        Self {
            now_ms: AtomicI64::new(now_ms),
            step_ms: 0,
        }
    }

    pub fn with_step(now_ms: i64, step_ms: i64) -> Self {
        Self {
            now_ms: AtomicI64::new(now_ms),
            step_ms,
        }
    }

    pub fn set(&self, now_ms: i64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ms: i64) {
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.fetch_add(self.step_ms, Ordering::SeqCst)
    }
}

/// Monotonic stamp source for one cascade.
///
/// Readings never go backwards within one cascade even if the underlying
/// clock does. Snapshots are taken bottom-up, so a parent is never stamped
/// earlier than its children.
pub(crate) struct CascadeClock<'a, C: Clock> {
    clock: &'a C,
    last_ms: i64,
}

impl<'a, C: Clock> CascadeClock<'a, C> {
    pub(crate) fn new(clock: &'a C) -> Self {
        Self {
            clock,
            last_ms: i64::MIN,
        }
    }

    pub(crate) fn next_ms(&mut self) -> i64 {
        let now = self.clock.now_ms().max(self.last_ms);
        self.last_ms = now;
        now
    }
}

#[cfg(test)]
mod tests {
    use super::{CascadeClock, Clock, ManualClock, SystemClock};

    #[test]
    fn manual_clock_with_step_advances_after_each_reading() {
        let clock = ManualClock::with_step(1_000, 5);
        assert_eq!(clock.now_ms(), 1_000);
        assert_eq!(clock.now_ms(), 1_005);
        clock.set(50);
        assert_eq!(clock.now_ms(), 50);
    }

    #[test]
    fn cascade_clock_never_goes_backwards() {
        let clock = ManualClock::new(2_000);
        let mut cascade = CascadeClock::new(&clock);
        assert_eq!(cascade.next_ms(), 2_000);

        clock.set(1_500);
        assert_eq!(cascade.next_ms(), 2_000);

        clock.advance(1_000);
        assert_eq!(cascade.next_ms(), 2_500);
    }

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.now_ms() > 1_577_836_800_000);
    }
}
