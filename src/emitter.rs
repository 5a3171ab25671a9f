//! Serial emitter - writes one protocol line per record.
//!
//! Writes are synchronous and flushed per line so a record is on the wire
//! before the next cycle starts sampling.

use std::io::Write;

use crate::error::RecordError;
use crate::record::{PeakRecord, LOUDNESS_ONLY_HEADER};

/// Line-oriented record writer over any byte sink (serial port, stdout, buffer)
pub struct LineEmitter<W: Write> {
    sink: W,
    lines_written: u64,
}

impl<W: Write> LineEmitter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            lines_written: 0,
        }
    }

    /// Write the loudness-only header line
    pub fn write_header(&mut self) -> Result<(), RecordError> {
        self.write_line(LOUDNESS_ONLY_HEADER)
    }

    /// Write one record as a protocol line
    pub fn emit(&mut self, record: &PeakRecord) -> Result<(), RecordError> {
        self.write_line(&record.to_line())
    }

    fn write_line(&mut self, line: &str) -> Result<(), RecordError> {
        writeln!(self.sink, "{}", line)?;
        self.sink.flush()?;
        self.lines_written += 1;
        Ok(())
    }

    /// Lines successfully written, header included
    pub fn lines_written(&self) -> u64 {
        self.lines_written
    }

    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}
