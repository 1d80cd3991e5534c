//! Step Logger
//!
//! Append-only JSONL log of step records.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use voter_events::{RunSummary, StepRecord};

use super::OutputError;
use crate::observer::StepObserver;

/// Observer writing one JSON line per step record
pub struct StepLogger {
    writer: Option<BufWriter<File>>,
    record_count: u64,
    failed: bool,
}

impl StepLogger {
    /// Create a new logger writing to the specified path
    pub fn new(path: impl AsRef<Path>) -> Result<Self, OutputError> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        Ok(Self {
            writer: Some(BufWriter::new(file)),
            record_count: 0,
            failed: false,
        })
    }

    /// Create a logger that discards records (for testing)
    pub fn null() -> Self {
        Self {
            writer: None,
            record_count: 0,
            failed: false,
        }
    }

    /// Number of records logged so far
    pub fn record_count(&self) -> u64 {
        self.record_count
    }

    /// Log a record to the file
    pub fn log(&mut self, record: &StepRecord) -> Result<(), OutputError> {
        self.record_count += 1;
        if let Some(ref mut writer) = self.writer {
            let json = serde_json::to_string(record)?;
            writeln!(writer, "{}", json)?;
        }
        Ok(())
    }

    /// Flush the buffer to disk
    pub fn flush(&mut self) -> Result<(), OutputError> {
        if let Some(ref mut writer) = self.writer {
            writer.flush()?;
        }
        Ok(())
    }
}

impl StepObserver for StepLogger {
    fn on_step(&mut self, record: &StepRecord) {
        if let Err(e) = self.log(record) {
            // Warn once, then keep counting so the run is unaffected
            if !self.failed {
                tracing::warn!("Failed to log step {}: {}", record.step, e);
                self.failed = true;
            }
        }
    }

    fn on_finish(&mut self, _summary: &RunSummary) {
        if let Err(e) = self.flush() {
            tracing::warn!("Failed to flush step log: {}", e);
        }
    }
}

impl Drop for StepLogger {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!("Failed to flush step logger: {}", e);
        }
    }
}
