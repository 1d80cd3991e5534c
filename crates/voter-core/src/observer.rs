//! Step Observers
//!
//! Subscribers that receive a record after every Monte Carlo step. Rendering,
//! plotting and logging hang off this trait instead of the stepping code.

use std::sync::mpsc::Sender;

use voter_events::{RunSummary, StepRecord};

/// Receives post-step records from a runner.
pub trait StepObserver {
    /// Called once for the initial lattice (step 0) and once per step after.
    fn on_step(&mut self, record: &StepRecord);

    /// Called once when the run ends.
    fn on_finish(&mut self, _summary: &RunSummary) {}
}

/// Observer backed by a closure.
pub struct FnObserver<F>(pub F);

impl<F: FnMut(&StepRecord)> StepObserver for FnObserver<F> {
    fn on_step(&mut self, record: &StepRecord) {
        (self.0)(record)
    }
}

/// Forwards records over a channel, e.g. to a render thread.
///
/// A dropped receiver is not an error; the run keeps going without it.
pub struct ChannelObserver {
    sender: Sender<StepRecord>,
    disconnected: bool,
}

impl ChannelObserver {
    pub fn new(sender: Sender<StepRecord>) -> Self {
        Self {
            sender,
            disconnected: false,
        }
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }
}

impl StepObserver for ChannelObserver {
    fn on_step(&mut self, record: &StepRecord) {
        if self.disconnected {
            return;
        }
        if self.sender.send(record.clone()).is_err() {
            tracing::debug!("step receiver dropped at step {}", record.step);
            self.disconnected = true;
        }
    }
}

/// Mean opinion over time, the series plotted next to the lattice.
#[derive(Debug, Clone, Default)]
pub struct MeanOpinionSeries {
    pub steps: Vec<u64>,
    pub values: Vec<f64>,
}

impl MeanOpinionSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> Option<f64> {
        self.values.last().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl StepObserver for MeanOpinionSeries {
    fn on_step(&mut self, record: &StepRecord) {
        self.steps.push(record.step);
        self.values.push(record.mean_opinion);
    }
}
