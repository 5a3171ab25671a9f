use std::sync::atomic::{AtomicU64, Ordering};

use super::{Clock, Pacer};

/// Deterministic virtual clock for tests and offline simulation.
///
/// Time only moves when someone moves it: `pause` advances it by exactly the
/// requested amount, and `advance`/`set` let tests (or fake sensors that
/// model read latency) move it explicitly. Pausing on this clock never
/// sleeps, so a full cycle runs instantly.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    pub fn starting_at(ms: u64) -> Self {
        Self {
            now_ms: AtomicU64::new(ms),
        }
    }

    /// Move time forward by `ms`.
    pub fn advance(&self, ms: u64) {
        self.now_ms.fetch_add(ms, Ordering::SeqCst);
    }

    /// Jump to an absolute time. Callers are responsible for keeping it
    /// non-decreasing.
    pub fn set(&self, ms: u64) {
        self.now_ms.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

impl Pacer for ManualClock {
    fn pause(&self, ms: u64) {
        self.advance(ms);
    }
}
