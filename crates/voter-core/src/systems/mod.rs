//! ECS Systems
//!
//! The stepping engine wired into a `bevy_ecs` schedule. Resources hold the
//! lattice, its configuration and the random source; systems advance one
//! Monte Carlo step per schedule run and record its statistics.

pub mod stats;
pub mod step;

pub use stats::{build_record, record_step_statistics, StepRecords};
pub use step::{run_monte_carlo_step, LastStepTally, SimulationState};
