// Error types for the reverberation sampler
//
// The measurement cycle itself never fails: sensors degrade to sentinel values
// and the loop keeps running. Errors only exist at the edges, when the loop is
// assembled from a configuration and when records cross the serial boundary.

mod config;
mod record;

pub use config::{log_config_error, ConfigError, ConfigErrorCodes};
pub use record::{log_record_error, RecordError, RecordErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, so host-side tooling can match on stable
/// numbers instead of message text.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
