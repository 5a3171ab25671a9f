//! Event types recorded by the cycle telemetry collector.

use serde::{Deserialize, Serialize};

use crate::sensor::ChannelId;

/// One notable thing that happened in the control loop
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum CycleEvent {
    /// A cycle ran to completion
    Completed {
        channel: ChannelId,
        samples: u64,
        peak_time_s: f64,
        /// How far past the nominal interval the trigger fired
        lateness_ms: u64,
    },
    /// The capture hit the sample ceiling before the window closed
    CaptureCapped { channel: ChannelId, samples: u64 },
    /// The record could not be written to the sink
    EmitFailed { channel: ChannelId, code: i32 },
}
