//! Peak records and the line protocol they travel in.
//!
//! One record per completed cycle, one ASCII line per record:
//!
//! ```text
//! dual-channel    1,134,0.823
//! single-channel  134,0.823
//! loudness-only   0.823
//! ```
//!
//! Distance is the sensor's raw integer (sentinels included). Peak time is
//! always printed with exactly three decimals. The host side reads the same
//! lines back with [`parse_line`] / [`RecordReader`], tolerating header and
//! noise lines the way a serial logger has to.

use std::fmt;
use std::io::BufRead;

use serde::{Deserialize, Serialize};

use crate::config::Variant;
use crate::error::{ErrorCode, RecordError};
use crate::sensor::ChannelId;

/// Header line the loudness-only rig may print once at startup
pub const LOUDNESS_ONLY_HEADER: &str = "Reverberation(s)";

/// Line prefixes (lowercase) that mark a header rather than data
const HEADER_PREFIXES: [&str; 4] = ["ultrasonic", "distance", "rt", "reverberation"];

/// Result of one measurement cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakRecord {
    /// Present only on the dual-channel rig
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub channel: Option<ChannelId>,
    /// Raw rangefinder reading; absent on the loudness-only rig
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub distance_cm: Option<i32>,
    /// Offset of the loudest sample from window start, in seconds
    pub peak_time_s: f64,
}

impl PeakRecord {
    /// Protocol line for this record, without the trailing newline
    pub fn to_line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PeakRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(channel) = self.channel {
            write!(f, "{},", channel)?;
        }
        if let Some(distance) = self.distance_cm {
            write!(f, "{},", distance)?;
        }
        write!(f, "{}", format_peak_time(self.peak_time_s))
    }
}

/// Render a peak time with exactly three decimals (`0.5` -> `"0.500"`)
pub fn format_peak_time(seconds: f64) -> String {
    format!("{:.3}", seconds)
}

/// Whether a line is a header (or header-like noise) rather than data
pub fn is_header_line(line: &str) -> bool {
    let lower = line.trim().to_ascii_lowercase();
    HEADER_PREFIXES
        .iter()
        .any(|prefix| lower.starts_with(prefix))
}

/// Parse one protocol line for `variant`.
///
/// Returns `Ok(None)` for blank and header lines, `Ok(Some(_))` for a
/// well-formed record and an error for anything else. Distances logged
/// with decimals (`57.25`) are truncated toward zero.
pub fn parse_line(line: &str, variant: Variant) -> Result<Option<PeakRecord>, RecordError> {
    let line = line.trim();
    if line.is_empty() || is_header_line(line) {
        return Ok(None);
    }

    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    let expected = variant.field_count();
    if parts.len() != expected {
        return Err(RecordError::FieldCount {
            expected,
            got: parts.len(),
        });
    }

    let mut fields = parts.into_iter();

    let channel = if variant.tags_channel() {
        let raw = fields.next().unwrap_or_default();
        let value: u8 = raw.parse().map_err(|_| RecordError::InvalidNumber {
            field: "channel",
            value: raw.to_string(),
        })?;
        Some(ChannelId::new(value).ok_or(RecordError::InvalidChannel { value })?)
    } else {
        None
    };

    let distance_cm = if variant.reads_distance() {
        Some(parse_distance(fields.next().unwrap_or_default())?)
    } else {
        None
    };

    let raw = fields.next().unwrap_or_default();
    let peak_time_s: f64 = raw.parse().map_err(|_| RecordError::InvalidNumber {
        field: "peak_time_s",
        value: raw.to_string(),
    })?;
    if !peak_time_s.is_finite() || peak_time_s < 0.0 {
        return Err(RecordError::InvalidPeakTime { value: peak_time_s });
    }

    Ok(Some(PeakRecord {
        channel,
        distance_cm,
        peak_time_s,
    }))
}

fn parse_distance(raw: &str) -> Result<i32, RecordError> {
    let invalid = || RecordError::InvalidNumber {
        field: "distance_cm",
        value: raw.to_string(),
    };

    if let Ok(cm) = raw.parse::<i32>() {
        return Ok(cm);
    }
    let cm: f64 = raw.parse().map_err(|_| invalid())?;
    if !cm.is_finite() || cm < f64::from(i32::MIN) || cm > f64::from(i32::MAX) {
        return Err(invalid());
    }
    Ok(cm.trunc() as i32)
}

/// Iterator over the valid records of a line stream.
///
/// Headers and blank lines are skipped silently. Malformed lines, including
/// lines that are not valid UTF-8, are logged and counted but never stop the
/// stream. Only a read error ends it.
pub struct RecordReader<R> {
    input: R,
    variant: Variant,
    line: Vec<u8>,
    line_number: usize,
    rejected: usize,
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(input: R, variant: Variant) -> Self {
        Self {
            input,
            variant,
            line: Vec::new(),
            line_number: 0,
            rejected: 0,
        }
    }

    /// Lines that looked like data but failed to parse
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Lines consumed so far
    pub fn lines_read(&self) -> usize {
        self.line_number
    }

    fn parse_current(&self) -> Result<Option<PeakRecord>, RecordError> {
        let text = std::str::from_utf8(&self.line).map_err(|_| RecordError::InvalidEncoding {
            len: self.line.len(),
        })?;
        parse_line(text, self.variant)
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = PeakRecord;

    fn next(&mut self) -> Option<PeakRecord> {
        loop {
            self.line.clear();
            match self.input.read_until(b'\n', &mut self.line) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(err) => {
                    log::warn!(
                        "[RecordReader] Stopping after line {}: {}",
                        self.line_number,
                        err
                    );
                    return None;
                }
            }
            self.line_number += 1;

            match self.parse_current() {
                Ok(Some(record)) => return Some(record),
                Ok(None) => continue,
                Err(err) => {
                    self.rejected += 1;
                    log::warn!(
                        "[RecordReader] Skipping line {} (code {}): {}",
                        self.line_number,
                        err.code(),
                        err.message()
                    );
                }
            }
        }
    }
}
