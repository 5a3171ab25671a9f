//! Scheduler - decides when the next cycle runs and on which channel
//!
//! The scheduler only ever sees a millisecond timestamp. Each call to
//! [`Scheduler::tick`] is one trigger decision:
//! - no queueing of missed triggers and no catch-up bursts
//! - on trigger the reference time is reset to `now`, so any lateness is
//!   absorbed into the next interval instead of being paid back
//! - channels alternate strictly, starting with channel 1
//!
//! A clock that stops advancing means the scheduler never triggers again.
//! That is accepted behaviour, not an error.

use crate::sensor::ChannelId;

/// Which channels the scheduler rotates through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
    /// One channel, always channel 1
    Single,
    /// Channels 1 and 2, alternating
    Dual,
}

/// Mutable scheduling state, owned by the control loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerState {
    last_trigger_ms: u64,
    next_is_b: bool,
}

impl SchedulerState {
    /// State anchored at the loop's start time
    pub fn new(started_at_ms: u64) -> Self {
        Self {
            last_trigger_ms: started_at_ms,
            next_is_b: false,
        }
    }

    /// Start time of the most recent cycle (or the loop start before any)
    pub fn last_trigger_ms(&self) -> u64 {
        self.last_trigger_ms
    }

    /// Channel the next trigger will select on a dual layout
    pub fn next_channel(&self) -> ChannelId {
        if self.next_is_b {
            ChannelId::B
        } else {
            ChannelId::A
        }
    }
}

/// Interval-based trigger with round-robin channel selection
#[derive(Debug, Clone)]
pub struct Scheduler {
    interval_ms: u64,
    layout: ChannelLayout,
}

impl Scheduler {
    pub fn new(interval_ms: u64, layout: ChannelLayout) -> Self {
        Self {
            interval_ms,
            layout,
        }
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    /// Time since the last trigger, as the next `tick` would see it
    #[inline]
    pub fn elapsed_ms(&self, state: &SchedulerState, now_ms: u64) -> u64 {
        now_ms.saturating_sub(state.last_trigger_ms)
    }

    /// One trigger decision.
    ///
    /// Returns the channel to measure when at least one interval has passed
    /// since the last trigger, and `None` (leaving `state` untouched)
    /// otherwise.
    pub fn tick(&self, state: &mut SchedulerState, now_ms: u64) -> Option<ChannelId> {
        if self.elapsed_ms(state, now_ms) < self.interval_ms {
            return None;
        }

        state.last_trigger_ms = now_ms;

        let channel = match self.layout {
            ChannelLayout::Single => ChannelId::A,
            ChannelLayout::Dual => {
                let channel = state.next_channel();
                state.next_is_b = !state.next_is_b;
                channel
            }
        };

        Some(channel)
    }
}
