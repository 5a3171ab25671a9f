//! Fixed sampling parameters and rig presets
//!
//! The rig has no runtime configuration: every timing parameter is a
//! constant, and the only choice is which wiring variant the firmware was
//! built for. `SamplerConfig` bundles the constants for one variant so the
//! loop, the CLI and the tests agree on them.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Length of the loudness capture window in milliseconds
pub const CAPTURE_WINDOW_MS: u64 = 1000;

/// Cooperative delay between two loudness samples (~200 samples per window)
pub const PACING_DELAY_MS: u64 = 5;

/// Trigger interval of the dual-channel rig
pub const DUAL_CHANNEL_INTERVAL_MS: u64 = 3500;

/// Trigger interval of the single-channel rig
pub const SINGLE_CHANNEL_INTERVAL_MS: u64 = 3000;

/// Trigger interval of the loudness-only rig
pub const LOUDNESS_ONLY_INTERVAL_MS: u64 = 2000;

/// Pause between two polls that did not trigger a cycle
pub const IDLE_POLL_MS: u64 = 1;

/// How many times the nominal sample count a window may take before the
/// capture is cut short (only reachable when the clock stalls)
pub const SAMPLE_CAP_FACTOR: u64 = 4;

/// Wiring variant of the rig, which also fixes the record shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// Two rangefinder + microphone pairs, alternating: `id,cm,seconds`
    DualChannel,
    /// One rangefinder + microphone pair: `cm,seconds`
    SingleChannel,
    /// One microphone: `seconds`
    LoudnessOnly,
}

impl Variant {
    /// Number of channels the variant is wired with
    pub fn channel_count(self) -> usize {
        match self {
            Variant::DualChannel => 2,
            Variant::SingleChannel | Variant::LoudnessOnly => 1,
        }
    }

    /// Whether each cycle starts with a distance reading
    pub fn reads_distance(self) -> bool {
        !matches!(self, Variant::LoudnessOnly)
    }

    /// Whether records carry the channel id
    pub fn tags_channel(self) -> bool {
        matches!(self, Variant::DualChannel)
    }

    /// Number of comma-separated fields in one record line
    pub fn field_count(self) -> usize {
        1 + usize::from(self.reads_distance()) + usize::from(self.tags_channel())
    }

    /// Trigger interval the rig was built with
    pub fn interval_ms(self) -> u64 {
        match self {
            Variant::DualChannel => DUAL_CHANNEL_INTERVAL_MS,
            Variant::SingleChannel => SINGLE_CHANNEL_INTERVAL_MS,
            Variant::LoudnessOnly => LOUDNESS_ONLY_INTERVAL_MS,
        }
    }
}

/// Timing parameters for one rig
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerConfig {
    pub variant: Variant,
    /// Minimum time between two cycle starts
    pub interval_ms: u64,
    /// Capture window length
    pub window_ms: u64,
    /// Delay between loudness samples
    pub pacing_ms: u64,
    /// Delay between polls that did not trigger
    pub idle_poll_ms: u64,
}

impl SamplerConfig {
    /// Preset for a wiring variant
    pub fn for_variant(variant: Variant) -> Self {
        Self {
            variant,
            interval_ms: variant.interval_ms(),
            window_ms: CAPTURE_WINDOW_MS,
            pacing_ms: PACING_DELAY_MS,
            idle_poll_ms: IDLE_POLL_MS,
        }
    }

    /// Check the timing parameters are usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_ms == 0 {
            return Err(ConfigError::IntervalZero);
        }
        if self.window_ms == 0 {
            return Err(ConfigError::WindowZero);
        }
        if self.pacing_ms == 0 || self.pacing_ms >= self.window_ms {
            return Err(ConfigError::PacingInvalid {
                pacing_ms: self.pacing_ms,
                window_ms: self.window_ms,
            });
        }
        Ok(())
    }

    /// Samples a window should take if pacing were exact
    pub fn nominal_samples_per_window(&self) -> u64 {
        self.window_ms.div_ceil(self.pacing_ms.max(1))
    }

    /// Hard ceiling on samples per window
    pub fn max_samples_per_window(&self) -> u64 {
        (self.nominal_samples_per_window() + 1) * SAMPLE_CAP_FACTOR
    }

    /// Shortest possible time between two cycle starts: the capture blocks
    /// the loop, so a window longer than the interval stretches the period.
    pub fn effective_period_ms(&self) -> u64 {
        self.interval_ms.max(self.window_ms)
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self::for_variant(Variant::DualChannel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SamplerConfig::default();
        assert_eq!(config.variant, Variant::DualChannel);
        assert_eq!(config.interval_ms, 3500);
        assert_eq!(config.window_ms, 1000);
        assert_eq!(config.pacing_ms, 5);
        assert_eq!(config.nominal_samples_per_window(), 200);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_variant_shapes() {
        assert_eq!(Variant::DualChannel.field_count(), 3);
        assert_eq!(Variant::SingleChannel.field_count(), 2);
        assert_eq!(Variant::LoudnessOnly.field_count(), 1);
        assert_eq!(Variant::DualChannel.channel_count(), 2);
        assert_eq!(Variant::LoudnessOnly.channel_count(), 1);
        assert!(!Variant::LoudnessOnly.reads_distance());
    }

    #[test]
    fn test_presets_stay_within_rig_range() {
        for variant in [
            Variant::DualChannel,
            Variant::SingleChannel,
            Variant::LoudnessOnly,
        ] {
            let config = SamplerConfig::for_variant(variant);
            assert!((2000..=3500).contains(&config.interval_ms));
            assert!(config.validate().is_ok());
        }
    }

    #[test]
    fn test_validate_rejects_degenerate_timing() {
        let mut config = SamplerConfig::default();
        config.interval_ms = 0;
        assert_eq!(config.validate(), Err(ConfigError::IntervalZero));

        let mut config = SamplerConfig::default();
        config.window_ms = 0;
        assert_eq!(config.validate(), Err(ConfigError::WindowZero));

        let mut config = SamplerConfig::default();
        config.pacing_ms = 1000;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::PacingInvalid { .. })
        ));
    }

    #[test]
    fn test_effective_period_is_bounded_by_window() {
        let mut config = SamplerConfig::for_variant(Variant::LoudnessOnly);
        assert_eq!(config.effective_period_ms(), 2000);
        config.interval_ms = 500;
        assert_eq!(config.effective_period_ms(), 1000);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = SamplerConfig::for_variant(Variant::SingleChannel);
        let json = serde_json::to_string_pretty(&config).unwrap();
        assert!(json.contains("\"single-channel\""));
        let parsed: SamplerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
