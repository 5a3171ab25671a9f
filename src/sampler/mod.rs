//! Sampler - one measurement cycle on one channel
//!
//! A cycle is `DistanceRead -> EnvelopeCapture -> Emit`:
//! 1. read the distance once, passing whatever the sensor returns through
//! 2. anchor a fixed capture window at the time the distance read returned
//! 3. sample loudness until the window elapses, pausing between samples
//! 4. reduce the envelope to the earliest offset of its maximum
//!
//! A cycle always runs its full window; nothing cancels it. The pause is
//! cooperative, so the number of samples per window depends on the platform
//! and is not guaranteed to be exactly `window / pacing`.

mod peak;

pub use peak::{reduce_envelope, PeakTracker};

use crate::config::SamplerConfig;
use crate::record::PeakRecord;
use crate::sensor::Channel;
use crate::timing::{Clock, Pacer};

/// Outcome of one cycle: the record plus capture statistics
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub record: PeakRecord,
    /// Loudness samples taken in the window
    pub samples: u64,
    /// Clock reading when the capture window opened
    pub window_start_ms: u64,
    /// Time from window start until the loop observed the window closed
    pub capture_ms: u64,
    /// The window was cut short by the sample ceiling
    pub capped: bool,
}

/// Executes measurement cycles with fixed window and pacing
#[derive(Debug, Clone)]
pub struct Sampler {
    window_ms: u64,
    pacing_ms: u64,
    max_samples: u64,
    tag_channel: bool,
}

impl Sampler {
    pub fn new(config: &SamplerConfig) -> Self {
        Self {
            window_ms: config.window_ms,
            pacing_ms: config.pacing_ms,
            max_samples: config.max_samples_per_window(),
            tag_channel: config.variant.tags_channel(),
        }
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    pub fn pacing_ms(&self) -> u64 {
        self.pacing_ms
    }

    /// Run one full cycle on `channel`.
    ///
    /// Never fails: sensor sentinels end up in the record unchanged.
    pub fn run_cycle<C, P>(&self, channel: &mut Channel, clock: &C, pacer: &P) -> CycleReport
    where
        C: Clock + ?Sized,
        P: Pacer + ?Sized,
    {
        let distance_cm = channel.read_distance();

        let window_start_ms = clock.now_ms();
        let mut tracker = PeakTracker::new();
        let mut capped = false;

        let capture_ms = loop {
            let elapsed_ms = clock.now_ms().saturating_sub(window_start_ms);
            if elapsed_ms >= self.window_ms {
                break elapsed_ms;
            }
            if tracker.samples() >= self.max_samples {
                capped = true;
                tracing::warn!(
                    "[Sampler] Channel {} capture stopped after {} samples at {} ms; clock not advancing?",
                    channel.id(),
                    tracker.samples(),
                    elapsed_ms
                );
                break elapsed_ms;
            }

            let level = channel.read_loudness();
            tracker.observe(elapsed_ms, level);

            pacer.pause(self.pacing_ms);
        };

        let record = PeakRecord {
            channel: self.tag_channel.then(|| channel.id()),
            distance_cm,
            peak_time_s: tracker.peak_time_s(),
        };

        tracing::debug!(
            "[Sampler] Channel {} cycle: distance={:?} peak={:.3}s level={:?} samples={} capture={}ms",
            channel.id(),
            distance_cm,
            record.peak_time_s,
            tracker.best_level(),
            tracker.samples(),
            capture_ms
        );

        CycleReport {
            record,
            samples: tracker.samples(),
            window_start_ms,
            capture_ms,
            capped,
        }
    }
}
