//! Run Control
//!
//! Pause, resume and cancel requests for a running simulation. The flags are
//! shared, so a clone handed to another thread controls the same run. They
//! are only consulted between Monte Carlo steps; a step in progress always
//! completes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Current control state as seen by the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlState {
    Running,
    Paused,
    Cancelled,
}

/// Cloneable handle for pausing, resuming and cancelling a run.
#[derive(Debug, Clone, Default)]
pub struct SimulationController {
    paused: Arc<AtomicBool>,
    cancelled: Arc<AtomicBool>,
}

impl SimulationController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop stepping until `resume` is called.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
        tracing::info!("simulation paused");
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
        tracing::info!("simulation resumed");
    }

    /// Stop the run for good. A cancelled run cannot be resumed.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        tracing::info!("simulation cancelled");
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Cancellation wins over pause.
    pub fn state(&self) -> ControlState {
        if self.is_cancelled() {
            ControlState::Cancelled
        } else if self.is_paused() {
            ControlState::Paused
        } else {
            ControlState::Running
        }
    }
}
