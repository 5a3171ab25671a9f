// Reverb Sampler Core - periodic distance + reverberation sampling
// Interval scheduling, bounded envelope capture and peak-time reduction

// Module declarations
pub mod config;
pub mod controller;
pub mod emitter;
pub mod error;
pub mod record;
pub mod sampler;
pub mod scheduler;
pub mod sensor;
pub mod telemetry;
pub mod timing;

// Re-exports for convenience
pub use config::{SamplerConfig, Variant};
pub use controller::SamplerLoop;
pub use record::{format_peak_time, parse_line, PeakRecord, RecordReader};
pub use sampler::{CycleReport, Sampler};
pub use scheduler::{ChannelLayout, Scheduler, SchedulerState};
pub use sensor::{Channel, ChannelId, DistanceSource, LoudnessSource};
pub use timing::{Clock, ManualClock, Pacer, SystemClock, ThreadPacer};
