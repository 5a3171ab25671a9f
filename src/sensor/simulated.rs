//! Seeded stand-ins for the rig's hardware.
//!
//! These let the control loop run end to end on a desktop. Output is
//! deterministic for a given seed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{DistanceSource, LoudnessSource, ANALOG_MAX};

/// Shortest distance the rangefinder reports, in centimetres
const MIN_RANGE_CM: i32 = 2;

/// Longest distance the rangefinder reports, in centimetres
const MAX_RANGE_CM: i32 = 400;

/// Reading returned when the echo never arrives
pub const TIMEOUT_SENTINEL_CM: i32 = 0;

/// Ultrasonic rangefinder returning uniform distances in 2..=400 cm,
/// occasionally timing out.
pub struct SimulatedRangefinder {
    rng: StdRng,
    timeout_probability: f64,
}

impl SimulatedRangefinder {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            timeout_probability: 0.02,
        }
    }

    /// Override how often a reading comes back as [`TIMEOUT_SENTINEL_CM`].
    pub fn with_timeout_probability(mut self, probability: f64) -> Self {
        self.timeout_probability = probability.clamp(0.0, 1.0);
        self
    }
}

impl DistanceSource for SimulatedRangefinder {
    fn measure(&mut self) -> i32 {
        if self.rng.gen_bool(self.timeout_probability) {
            return TIMEOUT_SENTINEL_CM;
        }
        self.rng.gen_range(MIN_RANGE_CM..=MAX_RANGE_CM)
    }
}

/// Microphone envelope: a noisy floor with randomly timed bursts that decay
/// geometrically, clamped to the 10-bit analog scale.
pub struct SimulatedMicrophone {
    rng: StdRng,
    noise_floor: u16,
    noise_amplitude: u16,
    burst_probability: f64,
    decay: f32,
    envelope: f32,
}

impl SimulatedMicrophone {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            noise_floor: 40,
            noise_amplitude: 15,
            burst_probability: 0.01,
            decay: 0.97,
            envelope: 0.0,
        }
    }

    /// Per-sample probability of a new burst.
    pub fn with_burst_probability(mut self, probability: f64) -> Self {
        self.burst_probability = probability.clamp(0.0, 1.0);
        self
    }
}

impl LoudnessSource for SimulatedMicrophone {
    fn read(&mut self) -> u16 {
        if self.rng.gen_bool(self.burst_probability) {
            let peak = self.rng.gen_range(300.0..(ANALOG_MAX as f32));
            self.envelope = self.envelope.max(peak);
        } else {
            self.envelope *= self.decay;
        }

        let noise = self.rng.gen_range(0..=self.noise_amplitude);
        let level = self.noise_floor as f32 + noise as f32 + self.envelope;
        level.round().clamp(0.0, ANALOG_MAX as f32) as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rangefinder_stays_in_range() {
        let mut sensor = SimulatedRangefinder::new(7);
        for _ in 0..1000 {
            let cm = sensor.measure();
            assert!(
                cm == TIMEOUT_SENTINEL_CM || (MIN_RANGE_CM..=MAX_RANGE_CM).contains(&cm),
                "distance {} out of range",
                cm
            );
        }
    }

    #[test]
    fn test_rangefinder_always_times_out_when_forced() {
        let mut sensor = SimulatedRangefinder::new(7).with_timeout_probability(1.0);
        assert!((0..20).all(|_| sensor.measure() == TIMEOUT_SENTINEL_CM));
    }

    #[test]
    fn test_microphone_is_deterministic_per_seed() {
        let mut first = SimulatedMicrophone::new(42);
        let mut second = SimulatedMicrophone::new(42);
        let a: Vec<u16> = (0..500).map(|_| first.read()).collect();
        let b: Vec<u16> = (0..500).map(|_| second.read()).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_microphone_stays_on_analog_scale() {
        let mut mic = SimulatedMicrophone::new(3).with_burst_probability(0.5);
        for _ in 0..2000 {
            assert!(mic.read() <= ANALOG_MAX);
        }
    }

    #[test]
    fn test_microphone_bursts_rise_above_floor() {
        let mut mic = SimulatedMicrophone::new(11).with_burst_probability(1.0);
        let level = mic.read();
        assert!(level >= 300, "burst should dominate the floor, got {}", level);
    }

    #[test]
    fn test_microphone_without_bursts_sits_on_floor() {
        let mut mic = SimulatedMicrophone::new(11).with_burst_probability(0.0);
        for _ in 0..200 {
            let level = mic.read();
            assert!((40..=55).contains(&level), "unexpected level {}", level);
        }
    }
}
