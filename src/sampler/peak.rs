// Peak reduction - earliest time of maximum loudness
//
// A capture window is reduced to a single scalar: the offset of the loudest
// sample. Only the running maximum is kept; individual samples are never
// stored. Ties go to the earliest sample because the update uses a strict
// comparison.

/// Running maximum over one capture window
#[derive(Debug, Clone, Default)]
pub struct PeakTracker {
    best: Option<(u64, u16)>,
    samples: u64,
}

impl PeakTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one envelope sample taken `offset_ms` after window start.
    ///
    /// Any first sample becomes the peak (readings are never below zero);
    /// after that a sample only wins if it is strictly louder.
    #[inline]
    pub fn observe(&mut self, offset_ms: u64, level: u16) {
        self.samples += 1;
        match self.best {
            Some((_, best_level)) if level <= best_level => {}
            _ => self.best = Some((offset_ms, level)),
        }
    }

    /// Peak offset in seconds, `0.0` if nothing was observed
    pub fn peak_time_s(&self) -> f64 {
        self.best
            .map(|(offset_ms, _)| offset_ms as f64 / 1000.0)
            .unwrap_or(0.0)
    }

    /// Peak offset in milliseconds
    pub fn peak_offset_ms(&self) -> Option<u64> {
        self.best.map(|(offset_ms, _)| offset_ms)
    }

    /// Loudest level seen so far
    pub fn best_level(&self) -> Option<u16> {
        self.best.map(|(_, level)| level)
    }

    /// Number of samples observed
    pub fn samples(&self) -> u64 {
        self.samples
    }
}

/// Reduce a recorded envelope to its peak time in seconds.
///
/// Samples must be in non-decreasing offset order. Returns `0.0` for an
/// empty envelope.
pub fn reduce_envelope(samples: &[(u64, u16)]) -> f64 {
    let mut tracker = PeakTracker::new();
    for &(offset_ms, level) in samples {
        tracker.observe(offset_ms, level);
    }
    tracker.peak_time_s()
}
