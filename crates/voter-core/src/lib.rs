//! q-voter Opinion Dynamics Simulation Library
//!
//! Binary opinions on an N×N lattice with open boundaries evolve under the
//! q-voter model: a site copies a unanimous group of q sampled neighbors, and
//! with probability p instead acts as a nonconformist (independent flip or
//! anticonformity).
//!
//! # Modules
//!
//! - [`lattice`]: the opinion grid and its initial construction
//! - [`neighbors`]: neighbor lookup at open boundaries
//! - [`dynamics`]: conformity and anticonformity rules
//! - [`stepper`]: the Monte Carlo step
//! - [`runner`]: ECS-backed run loop with control and observers

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;

pub mod config;
pub mod control;
pub mod dynamics;
pub mod lattice;
pub mod neighbors;
pub mod observer;
pub mod output;
pub mod runner;
pub mod stepper;
pub mod systems;

pub use config::{
    default_config_toml, ConfigError, ModelConfig, NonconformityMode, RunConfig, SamplingPolicy,
    SimulationConfig,
};
pub use control::{ControlState, SimulationController};
pub use dynamics::{anticonformism, conformism};
pub use lattice::{summary_statistic, Lattice, LatticeError, Opinion, NEGATIVE, POSITIVE};
pub use neighbors::{neighbors, Neighborhood};
pub use observer::{ChannelObserver, FnObserver, MeanOpinionSeries, StepObserver};
pub use runner::{SimulationRunner, TickOutcome};
pub use stepper::{step, MonteCarloStepper, StepTally};

/// Seeded random number generator resource
#[derive(Resource)]
pub struct SimRng(pub SmallRng);

/// Build the initial lattice for `config`.
pub fn initialize<R: rand::Rng + ?Sized>(config: &ModelConfig, rng: &mut R) -> Lattice {
    Lattice::initialize(config, rng)
}
