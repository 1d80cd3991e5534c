//! Statistics System
//!
//! Builds a `StepRecord` from the lattice after each step.

use bevy_ecs::prelude::*;
use voter_events::StepRecord;

use crate::lattice::Lattice;
use crate::systems::step::SimulationState;

/// Resource: records produced since the last drain
#[derive(Resource, Debug, Default)]
pub struct StepRecords {
    records: Vec<StepRecord>,
}

impl StepRecords {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: StepRecord) {
        self.records.push(record);
    }

    pub fn drain(&mut self) -> Vec<StepRecord> {
        std::mem::take(&mut self.records)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Record for the lattice as it stands at `state.current_step`.
pub fn build_record(lattice: &Lattice, state: &SimulationState) -> StepRecord {
    let record = StepRecord {
        step: state.current_step,
        mean_opinion: lattice.mean_opinion(),
        positive_count: lattice.positive_count(),
        total_sites: lattice.site_count(),
        snapshot: None,
    };
    if state.should_snapshot() {
        record.with_snapshot(lattice.snapshot())
    } else {
        record
    }
}

/// System: record statistics for the step just taken
pub fn record_step_statistics(
    lattice: Res<Lattice>,
    state: Res<SimulationState>,
    mut records: ResMut<StepRecords>,
) {
    let record = build_record(&lattice, &state);
    tracing::debug!(
        step = record.step,
        mean_opinion = record.mean_opinion,
        "recorded step"
    );
    records.push(record);
}
