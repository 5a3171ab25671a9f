//! Time capabilities consumed by the scheduler and the sampler.
//!
//! Both the trigger decision and the capture window only ever look at a
//! monotonic millisecond counter, and the only way the loop waits is through
//! a cooperative pause. Keeping those two behind traits lets tests drive the
//! whole cycle on virtual time.

use std::time::{Duration, Instant};

mod stub;

pub use stub::ManualClock;

/// Monotonic millisecond clock.
///
/// Readings are non-decreasing and measured from an arbitrary epoch.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Cooperative pacing delay between samples and between idle polls.
///
/// This is not a precision timer; implementations may overshoot.
pub trait Pacer {
    fn pause(&self, ms: u64);
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

impl<T: Pacer + ?Sized> Pacer for &T {
    fn pause(&self, ms: u64) {
        (**self).pause(ms)
    }
}

/// Default clock backed by `Instant`, anchored at construction.
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// Pacer that blocks the calling thread.
#[derive(Default)]
pub struct ThreadPacer {
    _unit: (),
}

impl Pacer for ThreadPacer {
    fn pause(&self, ms: u64) {
        std::thread::sleep(Duration::from_millis(ms));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let first = clock.now_ms();
        ThreadPacer::default().pause(2);
        let second = clock.now_ms();
        assert!(second >= first + 1, "{} -> {}", first, second);
    }

    #[test]
    fn test_clock_through_reference() {
        let clock = ManualClock::starting_at(40);
        let by_ref: &dyn Clock = &clock;
        assert_eq!(by_ref.now_ms(), 40);
        (&clock).pause(10);
        assert_eq!(clock.now_ms(), 50);
    }
}
