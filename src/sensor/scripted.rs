//! Replay sources for deterministic tests and fixtures.
//!
//! Each source plays back a fixed list of readings and then keeps returning
//! the last one. Optionally every read advances a shared [`ManualClock`],
//! which models drivers that take real time to answer (an ultrasonic echo
//! can take tens of milliseconds).

use std::sync::Arc;

use super::{DistanceSource, LoudnessSource};
use crate::timing::ManualClock;

struct Playback<T: Copy> {
    values: Vec<T>,
    position: usize,
    fallback: T,
    read_cost: Option<(Arc<ManualClock>, u64)>,
}

impl<T: Copy> Playback<T> {
    fn new(values: Vec<T>, fallback: T) -> Self {
        Self {
            values,
            position: 0,
            fallback,
            read_cost: None,
        }
    }

    fn next(&mut self) -> T {
        if let Some((clock, ms)) = &self.read_cost {
            clock.advance(*ms);
        }
        let value = match self.values.get(self.position) {
            Some(value) => *value,
            None => self.values.last().copied().unwrap_or(self.fallback),
        };
        self.position += 1;
        value
    }
}

/// Replays distance readings in order.
pub struct ScriptedDistance {
    playback: Playback<i32>,
}

impl ScriptedDistance {
    pub fn from_readings(readings: Vec<i32>) -> Self {
        Self {
            playback: Playback::new(readings, 0),
        }
    }

    pub fn constant(cm: i32) -> Self {
        Self::from_readings(vec![cm])
    }

    /// Every reading advances `clock` by `ms` before returning.
    pub fn with_read_cost(mut self, clock: Arc<ManualClock>, ms: u64) -> Self {
        self.playback.read_cost = Some((clock, ms));
        self
    }

    /// Number of readings taken so far.
    pub fn reads(&self) -> usize {
        self.playback.position
    }
}

impl DistanceSource for ScriptedDistance {
    fn measure(&mut self) -> i32 {
        self.playback.next()
    }
}

/// Replays loudness levels in order, one per sample.
pub struct ScriptedLoudness {
    playback: Playback<u16>,
}

impl ScriptedLoudness {
    pub fn from_levels(levels: Vec<u16>) -> Self {
        Self {
            playback: Playback::new(levels, 0),
        }
    }

    pub fn constant(level: u16) -> Self {
        Self::from_levels(vec![level])
    }

    /// Every reading advances `clock` by `ms` before returning.
    pub fn with_read_cost(mut self, clock: Arc<ManualClock>, ms: u64) -> Self {
        self.playback.read_cost = Some((clock, ms));
        self
    }

    pub fn reads(&self) -> usize {
        self.playback.position
    }
}

impl LoudnessSource for ScriptedLoudness {
    fn read(&mut self) -> u16 {
        self.playback.next()
    }
}
