//! Output
//!
//! Step time series and run summaries written to disk.

pub mod logger;
pub mod stats;

pub use logger::StepLogger;
pub use stats::{write_summary, SummaryCollector};

use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name of the per-step JSONL series inside the output directory
pub const STEPS_FILE: &str = "steps.jsonl";
/// File name of the run summary inside the output directory
pub const SUMMARY_FILE: &str = "summary.json";

/// Errors raised while writing output files.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Create the output directory if it does not exist.
pub fn ensure_output_dir(dir: impl AsRef<Path>) -> Result<(), OutputError> {
    let dir = dir.as_ref();
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}
