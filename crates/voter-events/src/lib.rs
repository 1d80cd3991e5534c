//! Shared record types for the q-voter simulation.
//!
//! This crate contains pure data structures with no simulation logic.
//! Observers, output writers and external front-ends depend on it without
//! pulling in the stepping engine.

pub mod record;
pub mod snapshot;
pub mod summary;

pub use record::StepRecord;
pub use snapshot::{LatticeSnapshot, SnapshotError};
pub use summary::RunSummary;
