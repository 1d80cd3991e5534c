//! Step System
//!
//! Runs one Monte Carlo step against the lattice resource.

use bevy_ecs::prelude::*;

use crate::config::ModelConfig;
use crate::lattice::Lattice;
use crate::stepper::{step_with_tally, StepTally};
use crate::SimRng;

/// Resource: progress of the current run
#[derive(Resource, Debug, Clone)]
pub struct SimulationState {
    /// Completed Monte Carlo steps
    pub current_step: u64,
    pub max_steps: u64,
    /// Attach a snapshot to every n-th record (0 disables)
    pub snapshot_interval: u64,
}

impl SimulationState {
    pub fn new(max_steps: u64, snapshot_interval: u64) -> Self {
        Self {
            current_step: 0,
            max_steps,
            snapshot_interval,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.current_step >= self.max_steps
    }

    /// Whether the record for `current_step` should carry a snapshot.
    pub fn should_snapshot(&self) -> bool {
        self.snapshot_interval > 0 && self.current_step % self.snapshot_interval == 0
    }
}

/// Resource: outcome counts of the most recent step
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct LastStepTally(pub StepTally);

/// System: one Monte Carlo step
pub fn run_monte_carlo_step(
    mut lattice: ResMut<Lattice>,
    config: Res<ModelConfig>,
    mut rng: ResMut<SimRng>,
    mut state: ResMut<SimulationState>,
    mut last_tally: ResMut<LastStepTally>,
) {
    let tally = step_with_tally(&mut lattice, &config, &mut rng.0);
    state.current_step += 1;
    last_tally.0 = tally;

    tracing::trace!(
        step = state.current_step,
        changed = tally.changed,
        skipped = tally.skipped,
        "step complete"
    );
}
