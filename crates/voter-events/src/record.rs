//! Step Records
//!
//! One record is produced after every Monte Carlo step.

use serde::{Deserialize, Serialize};

use crate::snapshot::LatticeSnapshot;

/// Statistics captured after a single Monte Carlo step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Number of completed Monte Carlo steps (0 is the initial lattice)
    pub step: u64,
    /// Mean opinion, `sum / N²`, in [-1, 1]
    pub mean_opinion: f64,
    /// Sites currently holding +1
    pub positive_count: usize,
    /// N² for the lattice the record was taken from
    pub total_sites: usize,
    /// Full lattice contents, only attached on snapshot steps
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<LatticeSnapshot>,
}

impl StepRecord {
    /// Sites currently holding -1.
    pub fn negative_count(&self) -> usize {
        self.total_sites - self.positive_count
    }

    /// Fraction of sites holding +1.
    pub fn positive_fraction(&self) -> f64 {
        if self.total_sites == 0 {
            return 0.0;
        }
        self.positive_count as f64 / self.total_sites as f64
    }

    /// True when every site shares the same opinion.
    pub fn is_consensus(&self) -> bool {
        self.total_sites > 0
            && (self.positive_count == 0 || self.positive_count == self.total_sites)
    }

    /// Attach a lattice snapshot to this record.
    pub fn with_snapshot(mut self, snapshot: LatticeSnapshot) -> Self {
        self.snapshot = Some(snapshot);
        self
    }
}
