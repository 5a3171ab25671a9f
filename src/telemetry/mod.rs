//! Cycle telemetry for the control loop.
//!
//! Counters plus a bounded history of recent events. Everything runs on the
//! loop's own thread, so the collector is plain owned state.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::sensor::ChannelId;

pub mod events;

pub use events::CycleEvent;

/// Snapshot of collector state for CLI reporting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TelemetrySnapshot {
    pub cycles: u64,
    /// Completed cycles for channel 1 and channel 2
    pub cycles_per_channel: [u64; 2],
    pub total_samples: u64,
    pub min_samples: Option<u64>,
    pub max_samples: Option<u64>,
    pub last_samples: Option<u64>,
    /// Worst trigger lateness beyond the nominal interval
    pub max_lateness_ms: u64,
    pub capped_captures: u64,
    pub emit_failures: u64,
    pub recent: Vec<CycleEvent>,
    pub dropped_events: u64,
}

/// Collector retaining counters and a bounded event history.
#[derive(Debug)]
pub struct CycleTelemetry {
    history: VecDeque<CycleEvent>,
    history_capacity: usize,
    dropped_history: u64,
    cycles: u64,
    cycles_per_channel: [u64; 2],
    total_samples: u64,
    min_samples: Option<u64>,
    max_samples: Option<u64>,
    last_samples: Option<u64>,
    max_lateness_ms: u64,
    capped_captures: u64,
    emit_failures: u64,
}

impl CycleTelemetry {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(history_capacity),
            history_capacity,
            dropped_history: 0,
            cycles: 0,
            cycles_per_channel: [0; 2],
            total_samples: 0,
            min_samples: None,
            max_samples: None,
            last_samples: None,
            max_lateness_ms: 0,
            capped_captures: 0,
            emit_failures: 0,
        }
    }

    fn publish(&mut self, event: CycleEvent) {
        if self.history_capacity == 0 {
            self.dropped_history += 1;
            return;
        }
        if self.history.len() == self.history_capacity {
            self.history.pop_front();
            self.dropped_history += 1;
        }
        self.history.push_back(event);
    }

    /// Record a finished cycle.
    ///
    /// `lateness_ms` is how long after the nominal interval the trigger
    /// fired; anything above zero is drift the scheduler absorbed.
    pub fn record_cycle(
        &mut self,
        channel: ChannelId,
        samples: u64,
        peak_time_s: f64,
        lateness_ms: u64,
    ) {
        self.cycles += 1;
        if let Some(slot) = self
            .cycles_per_channel
            .get_mut(usize::from(channel.get().saturating_sub(1)))
        {
            *slot += 1;
        }
        self.total_samples += samples;
        self.min_samples = Some(self.min_samples.map_or(samples, |min| min.min(samples)));
        self.max_samples = Some(self.max_samples.map_or(samples, |max| max.max(samples)));
        self.last_samples = Some(samples);
        self.max_lateness_ms = self.max_lateness_ms.max(lateness_ms);

        if lateness_ms > 0 {
            tracing::trace!(
                "[Telemetry] Channel {} triggered {} ms past its interval",
                channel,
                lateness_ms
            );
        }

        self.publish(CycleEvent::Completed {
            channel,
            samples,
            peak_time_s,
            lateness_ms,
        });
    }

    pub fn record_capped(&mut self, channel: ChannelId, samples: u64) {
        self.capped_captures += 1;
        self.publish(CycleEvent::CaptureCapped { channel, samples });
    }

    pub fn record_emit_failure(&mut self, channel: ChannelId, code: i32) {
        self.emit_failures += 1;
        self.publish(CycleEvent::EmitFailed { channel, code });
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            cycles: self.cycles,
            cycles_per_channel: self.cycles_per_channel,
            total_samples: self.total_samples,
            min_samples: self.min_samples,
            max_samples: self.max_samples,
            last_samples: self.last_samples,
            max_lateness_ms: self.max_lateness_ms,
            capped_captures: self.capped_captures,
            emit_failures: self.emit_failures,
            recent: self.history.iter().cloned().collect(),
            dropped_events: self.dropped_history,
        }
    }
}

impl Default for CycleTelemetry {
    fn default() -> Self {
        Self::new(64)
    }
}
