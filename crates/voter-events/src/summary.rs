//! Run Summary
//!
//! Aggregate statistics written once a run finishes.

use serde::{Deserialize, Serialize};

/// Summary of a complete simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub seed: u64,
    pub lattice_size: usize,
    /// Monte Carlo steps actually performed
    pub total_steps: u64,
    pub initial_mean_opinion: f64,
    pub final_mean_opinion: f64,
    pub min_mean_opinion: f64,
    pub max_mean_opinion: f64,
    /// First step at which every site held the same opinion
    #[serde(default)]
    pub consensus_step: Option<u64>,
    /// True if the run stopped on a cancel request before its step limit
    #[serde(default)]
    pub cancelled: bool,
}
