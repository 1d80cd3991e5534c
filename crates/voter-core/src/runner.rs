//! Simulation Runner
//!
//! Owns the ECS world for one run and drives it one Monte Carlo step per
//! `tick`, consulting a `SimulationController` between steps and handing
//! every record to the registered observers.

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::time::Duration;
use voter_events::{RunSummary, StepRecord};

use crate::config::{ConfigError, SimulationConfig};
use crate::control::{ControlState, SimulationController};
use crate::lattice::Lattice;
use crate::observer::StepObserver;
use crate::output::SummaryCollector;
use crate::systems::{
    build_record, record_step_statistics, run_monte_carlo_step, LastStepTally, SimulationState,
    StepRecords,
};
use crate::SimRng;

/// Result of asking the runner for one more step.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// A step was performed; carries its record
    Stepped(StepRecord),
    /// Controller is paused, nothing was done
    Paused,
    /// Controller was cancelled, the run is over
    Cancelled,
    /// The configured number of steps has been reached
    Finished,
}

/// Drives a single simulation run.
pub struct SimulationRunner {
    world: World,
    schedule: Schedule,
    controller: SimulationController,
    observers: Vec<Box<dyn StepObserver>>,
    summary: SummaryCollector,
    started: bool,
}

impl SimulationRunner {
    /// Validate `config`, seed the random source and build the initial lattice.
    pub fn new(config: &SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut rng = SmallRng::seed_from_u64(config.run.seed);
        let lattice = Lattice::initialize(&config.model, &mut rng);
        tracing::info!(
            size = config.model.lattice_size,
            q = config.model.influence_size,
            p = config.model.nonconformity_probability,
            seed = config.run.seed,
            "created simulation"
        );

        Ok(Self::from_parts(config, lattice, rng))
    }

    /// Run from an explicit starting lattice. The lattice size overrides
    /// `config.model.lattice_size`; no validation is performed.
    pub fn with_lattice(config: &SimulationConfig, lattice: Lattice) -> Self {
        let rng = SmallRng::seed_from_u64(config.run.seed);
        Self::from_parts(config, lattice, rng)
    }

    fn from_parts(config: &SimulationConfig, lattice: Lattice, rng: SmallRng) -> Self {
        let mut model = config.model.clone();
        model.lattice_size = lattice.size();

        let mut world = World::new();
        world.insert_resource(SimulationState::new(
            config.run.steps,
            config.run.snapshot_interval,
        ));
        world.insert_resource(SimRng(rng));
        world.insert_resource(model);
        world.insert_resource(StepRecords::new());
        world.insert_resource(LastStepTally::default());
        let size = lattice.size();
        world.insert_resource(lattice);

        let mut schedule = Schedule::default();
        schedule.add_systems((run_monte_carlo_step, record_step_statistics).chain());

        Self {
            world,
            schedule,
            controller: SimulationController::new(),
            observers: Vec::new(),
            summary: SummaryCollector::new(config.run.seed, size),
            started: false,
        }
    }

    /// Use an existing controller, e.g. one shared with a UI thread.
    pub fn with_controller(mut self, controller: SimulationController) -> Self {
        self.controller = controller;
        self
    }

    pub fn add_observer(&mut self, observer: Box<dyn StepObserver>) {
        self.observers.push(observer);
    }

    pub fn controller(&self) -> &SimulationController {
        &self.controller
    }

    pub fn lattice(&self) -> &Lattice {
        self.world.resource::<Lattice>()
    }

    pub fn current_step(&self) -> u64 {
        self.world.resource::<SimulationState>().current_step
    }

    /// Outcome counts of the most recent step.
    pub fn last_tally(&self) -> crate::stepper::StepTally {
        self.world.resource::<LastStepTally>().0
    }

    /// Emit the record for the initial lattice. Called by the first `tick`
    /// if not called explicitly.
    pub fn start(&mut self) -> Option<StepRecord> {
        if self.started {
            return None;
        }
        self.started = true;
        let record = build_record(
            self.world.resource::<Lattice>(),
            self.world.resource::<SimulationState>(),
        );
        self.publish(&record);
        Some(record)
    }

    /// Advance by one Monte Carlo step unless paused, cancelled or finished.
    pub fn tick(&mut self) -> TickOutcome {
        self.start();

        match self.controller.state() {
            ControlState::Cancelled => return TickOutcome::Cancelled,
            ControlState::Paused => return TickOutcome::Paused,
            ControlState::Running => {}
        }
        if self.world.resource::<SimulationState>().is_finished() {
            return TickOutcome::Finished;
        }

        self.schedule.run(&mut self.world);

        let records = self.world.resource_mut::<StepRecords>().drain();
        for record in &records {
            self.publish(record);
        }
        match records.into_iter().last() {
            Some(record) => TickOutcome::Stepped(record),
            None => TickOutcome::Finished,
        }
    }

    /// Tick until finished or cancelled, sleeping `poll_interval` while paused.
    pub fn run(&mut self, poll_interval: Duration) -> RunSummary {
        let cancelled = loop {
            match self.tick() {
                TickOutcome::Stepped(record) => {
                    if record.step % 100 == 0 {
                        tracing::info!(
                            "Step {} / {} (mean opinion {:.3})",
                            record.step,
                            self.world.resource::<SimulationState>().max_steps,
                            record.mean_opinion
                        );
                    }
                }
                TickOutcome::Paused => std::thread::sleep(poll_interval),
                TickOutcome::Cancelled => break true,
                TickOutcome::Finished => break false,
            }
        };
        self.finish(cancelled)
    }

    /// Build the summary and notify observers that the run is over.
    pub fn finish(&mut self, cancelled: bool) -> RunSummary {
        let summary = self.summary.summary(cancelled);
        for observer in &mut self.observers {
            observer.on_finish(&summary);
        }
        tracing::info!(
            steps = summary.total_steps,
            final_mean_opinion = summary.final_mean_opinion,
            cancelled,
            "simulation finished"
        );
        summary
    }

    fn publish(&mut self, record: &StepRecord) {
        self.summary.record(record);
        for observer in &mut self.observers {
            observer.on_step(record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::FnObserver;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn config(steps: u64) -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.model.lattice_size = 6;
        config.run.steps = steps;
        config.run.seed = 99;
        config
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut bad = config(1);
        bad.model.flip_probability = 2.0;
        assert!(SimulationRunner::new(&bad).is_err());
    }

    #[test]
    fn test_runs_to_step_limit() {
        let mut runner = SimulationRunner::new(&config(5)).unwrap();
        let summary = runner.run(Duration::from_millis(1));
        assert_eq!(runner.current_step(), 5);
        assert_eq!(summary.total_steps, 5);
        assert!(!summary.cancelled);
        assert_eq!(runner.tick(), TickOutcome::Finished);
    }

    #[test]
    fn test_observers_see_initial_and_every_step() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        let mut runner = SimulationRunner::new(&config(3)).unwrap();
        runner.add_observer(Box::new(FnObserver(move |r: &StepRecord| {
            sink.borrow_mut().push(r.step)
        })));
        runner.run(Duration::from_millis(1));

        assert_eq!(*seen.borrow(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_pause_and_cancel() {
        let controller = SimulationController::new();
        let mut runner = SimulationRunner::new(&config(10))
            .unwrap()
            .with_controller(controller.clone());

        assert!(matches!(runner.tick(), TickOutcome::Stepped(_)));

        controller.pause();
        let lattice = runner.lattice().clone();
        assert_eq!(runner.tick(), TickOutcome::Paused);
        assert_eq!(runner.current_step(), 1);
        assert_eq!(runner.lattice(), &lattice);

        controller.resume();
        assert!(matches!(runner.tick(), TickOutcome::Stepped(r) if r.step == 2));

        controller.cancel();
        assert_eq!(runner.tick(), TickOutcome::Cancelled);
        let summary = runner.run(Duration::from_millis(1));
        assert!(summary.cancelled);
        assert_eq!(summary.total_steps, 2);
    }

    #[test]
    fn test_snapshots_attached_on_interval() {
        let mut cfg = config(4);
        cfg.run.snapshot_interval = 2;
        let mut runner = SimulationRunner::new(&cfg).unwrap();

        let initial = runner.start().unwrap();
        assert!(initial.snapshot.is_some());
        let with_snapshot: Vec<bool> = (0..4)
            .map(|_| match runner.tick() {
                TickOutcome::Stepped(r) => r.snapshot.is_some(),
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(with_snapshot, vec![false, true, false, true]);
    }

    #[test]
    fn test_with_lattice_uses_given_state() {
        let mut cfg = config(1);
        cfg.model.nonconformity_probability = 1.0;
        cfg.model.flip_probability = 0.0;
        let lattice = Lattice::from_cells(2, vec![1, -1, -1, 1]).unwrap();

        let mut runner = SimulationRunner::with_lattice(&cfg, lattice.clone());
        runner.run(Duration::from_millis(1));
        assert_eq!(runner.lattice(), &lattice);
        assert_eq!(runner.last_tally().attempts(), 4);
    }
}
