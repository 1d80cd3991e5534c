//! Run Statistics
//!
//! Accumulates step records into a `RunSummary` and writes it out.

use std::fs;
use std::path::Path;

use voter_events::{RunSummary, StepRecord};

use super::{ensure_output_dir, OutputError, SUMMARY_FILE};
use crate::observer::StepObserver;

/// Tracks the aggregate statistics of a run as records arrive
#[derive(Debug, Clone)]
pub struct SummaryCollector {
    seed: u64,
    lattice_size: usize,
    initial: Option<f64>,
    last: Option<StepRecord>,
    min: f64,
    max: f64,
    consensus_step: Option<u64>,
}

impl SummaryCollector {
    pub fn new(seed: u64, lattice_size: usize) -> Self {
        Self {
            seed,
            lattice_size,
            initial: None,
            last: None,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            consensus_step: None,
        }
    }

    /// Fold a record into the running statistics
    pub fn record(&mut self, record: &StepRecord) {
        if self.initial.is_none() {
            self.initial = Some(record.mean_opinion);
        }
        self.min = self.min.min(record.mean_opinion);
        self.max = self.max.max(record.mean_opinion);
        if self.consensus_step.is_none() && record.is_consensus() {
            self.consensus_step = Some(record.step);
        }
        self.last = Some(record.clone());
    }

    /// Generate the summary for the records seen so far
    pub fn summary(&self, cancelled: bool) -> RunSummary {
        let initial = self.initial.unwrap_or(0.0);
        let (total_steps, final_mean) = self
            .last
            .as_ref()
            .map(|r| (r.step, r.mean_opinion))
            .unwrap_or((0, initial));

        RunSummary {
            seed: self.seed,
            lattice_size: self.lattice_size,
            total_steps,
            initial_mean_opinion: initial,
            final_mean_opinion: final_mean,
            min_mean_opinion: if self.min.is_finite() { self.min } else { initial },
            max_mean_opinion: if self.max.is_finite() { self.max } else { initial },
            consensus_step: self.consensus_step,
            cancelled,
        }
    }
}

impl StepObserver for SummaryCollector {
    fn on_step(&mut self, record: &StepRecord) {
        self.record(record);
    }
}

/// Write the summary as pretty JSON into `dir`
pub fn write_summary(dir: impl AsRef<Path>, summary: &RunSummary) -> Result<(), OutputError> {
    let dir = dir.as_ref();
    ensure_output_dir(dir)?;
    let json = serde_json::to_string_pretty(summary)?;
    fs::write(dir.join(SUMMARY_FILE), json)?;
    Ok(())
}
