// Configuration error types and constants

use crate::error::ErrorCode;
use crate::sensor::ChannelId;
use log::error;
use std::fmt;

/// Configuration error code constants
///
/// Error code range: 3001-3008
pub struct ConfigErrorCodes {}

impl ConfigErrorCodes {
    /// Trigger interval is zero
    pub const INTERVAL_ZERO: i32 = 3001;

    /// Capture window is zero
    pub const WINDOW_ZERO: i32 = 3002;

    /// Pacing delay is zero or does not fit inside the capture window
    pub const PACING_INVALID: i32 = 3003;

    /// Number of channels does not match the variant
    pub const CHANNEL_COUNT_MISMATCH: i32 = 3004;

    /// Channel id is outside the supported range
    pub const CHANNEL_ID_INVALID: i32 = 3005;

    /// Two channels share an id
    pub const DUPLICATE_CHANNEL: i32 = 3006;

    /// Variant needs a distance sensor but the channel has none
    pub const MISSING_DISTANCE_SENSOR: i32 = 3007;

    /// Loudness-only variant was given a distance sensor
    pub const UNEXPECTED_DISTANCE_SENSOR: i32 = 3008;
}

/// Log a configuration error with structured context
///
/// The logging is non-blocking and will not panic on failure.
pub fn log_config_error(err: &ConfigError, context: &str) {
    error!(
        "Config error in {}: code={}, component=SamplerLoop, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors raised while assembling the sampling loop
///
/// Error code range: 3001-3008
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Trigger interval must be greater than zero
    IntervalZero,

    /// Capture window must be greater than zero
    WindowZero,

    /// Pacing delay must be in `1..window_ms`
    PacingInvalid { pacing_ms: u64, window_ms: u64 },

    /// Variant expects a fixed number of channels
    ChannelCountMismatch { expected: usize, got: usize },

    /// Channel id outside `1..=expected`
    ChannelIdInvalid { id: ChannelId },

    /// Channel id used more than once
    DuplicateChannel { id: ChannelId },

    /// Channel has no distance sensor but the variant reports distance
    MissingDistanceSensor { id: ChannelId },

    /// Channel has a distance sensor the variant never reads
    UnexpectedDistanceSensor { id: ChannelId },
}

impl ErrorCode for ConfigError {
    fn code(&self) -> i32 {
        match self {
            ConfigError::IntervalZero => ConfigErrorCodes::INTERVAL_ZERO,
            ConfigError::WindowZero => ConfigErrorCodes::WINDOW_ZERO,
            ConfigError::PacingInvalid { .. } => ConfigErrorCodes::PACING_INVALID,
            ConfigError::ChannelCountMismatch { .. } => ConfigErrorCodes::CHANNEL_COUNT_MISMATCH,
            ConfigError::ChannelIdInvalid { .. } => ConfigErrorCodes::CHANNEL_ID_INVALID,
            ConfigError::DuplicateChannel { .. } => ConfigErrorCodes::DUPLICATE_CHANNEL,
            ConfigError::MissingDistanceSensor { .. } => ConfigErrorCodes::MISSING_DISTANCE_SENSOR,
            ConfigError::UnexpectedDistanceSensor { .. } => {
                ConfigErrorCodes::UNEXPECTED_DISTANCE_SENSOR
            }
        }
    }

    fn message(&self) -> String {
        match self {
            ConfigError::IntervalZero => "Trigger interval must be greater than 0 ms".to_string(),
            ConfigError::WindowZero => "Capture window must be greater than 0 ms".to_string(),
            ConfigError::PacingInvalid {
                pacing_ms,
                window_ms,
            } => {
                format!(
                    "Pacing delay must be between 1 and {} ms (got {})",
                    window_ms.saturating_sub(1),
                    pacing_ms
                )
            }
            ConfigError::ChannelCountMismatch { expected, got } => {
                format!("Expected {} channel(s), got {}", expected, got)
            }
            ConfigError::ChannelIdInvalid { id } => {
                format!("Channel id {} is out of range", id)
            }
            ConfigError::DuplicateChannel { id } => {
                format!("Channel id {} is used more than once", id)
            }
            ConfigError::MissingDistanceSensor { id } => {
                format!("Channel {} has no distance sensor", id)
            }
            ConfigError::UnexpectedDistanceSensor { id } => {
                format!(
                    "Channel {} has a distance sensor but the variant is loudness-only",
                    id
                )
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ConfigError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for ConfigError {}
