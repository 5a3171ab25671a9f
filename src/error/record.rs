// Record error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Record error code constants
///
/// Error code range: 4001-4006
pub struct RecordErrorCodes {}

impl RecordErrorCodes {
    /// Line has the wrong number of comma-separated fields
    pub const FIELD_COUNT: i32 = 4001;

    /// A field is not a number of the expected kind
    pub const INVALID_NUMBER: i32 = 4002;

    /// Channel id is not 1 or 2
    pub const INVALID_CHANNEL: i32 = 4003;

    /// Peak time is negative or not finite
    pub const INVALID_PEAK_TIME: i32 = 4004;

    /// Writing a record to the serial sink failed
    pub const EMIT_FAILED: i32 = 4005;

    /// Line is not valid UTF-8 (serial noise, board reset mid-line)
    pub const INVALID_ENCODING: i32 = 4006;
}

/// Log a record error with structured context
///
/// The logging is non-blocking and will not panic on failure.
pub fn log_record_error(err: &RecordError, context: &str) {
    error!(
        "Record error in {}: code={}, component=Record, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors raised when records cross the serial boundary
///
/// Error code range: 4001-4006
#[derive(Debug, Clone, PartialEq)]
pub enum RecordError {
    /// Wrong number of fields for the variant
    FieldCount { expected: usize, got: usize },

    /// Field could not be parsed
    InvalidNumber { field: &'static str, value: String },

    /// Channel id outside 1..=2
    InvalidChannel { value: u8 },

    /// Peak time is negative, NaN or infinite
    InvalidPeakTime { value: f64 },

    /// Sink rejected the write
    EmitFailed { reason: String },

    /// Line bytes are not valid UTF-8
    InvalidEncoding { len: usize },
}

impl ErrorCode for RecordError {
    fn code(&self) -> i32 {
        match self {
            RecordError::FieldCount { .. } => RecordErrorCodes::FIELD_COUNT,
            RecordError::InvalidNumber { .. } => RecordErrorCodes::INVALID_NUMBER,
            RecordError::InvalidChannel { .. } => RecordErrorCodes::INVALID_CHANNEL,
            RecordError::InvalidPeakTime { .. } => RecordErrorCodes::INVALID_PEAK_TIME,
            RecordError::EmitFailed { .. } => RecordErrorCodes::EMIT_FAILED,
            RecordError::InvalidEncoding { .. } => RecordErrorCodes::INVALID_ENCODING,
        }
    }

    fn message(&self) -> String {
        match self {
            RecordError::FieldCount { expected, got } => {
                format!("Expected {} field(s), got {}", expected, got)
            }
            RecordError::InvalidNumber { field, value } => {
                format!("Field '{}' is not a valid number: {:?}", field, value)
            }
            RecordError::InvalidChannel { value } => {
                format!("Channel id must be 1 or 2 (got {})", value)
            }
            RecordError::InvalidPeakTime { value } => {
                format!("Peak time must be a non-negative number (got {})", value)
            }
            RecordError::EmitFailed { reason } => {
                format!("Failed to emit record: {}", reason)
            }
            RecordError::InvalidEncoding { len } => {
                format!("Line of {} byte(s) is not valid UTF-8", len)
            }
        }
    }
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RecordError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for RecordError {}

impl From<std::io::Error> for RecordError {
    fn from(err: std::io::Error) -> Self {
        RecordError::EmitFailed {
            reason: err.to_string(),
        }
    }
}
