//! Monte Carlo Stepper
//!
//! One Monte Carlo step (MCS) is N² elementary update attempts. Each attempt
//! picks a site uniformly at random (with repeats across the step) and reads
//! the lattice as left by the previous attempt, so updates are asynchronous.
//!
//! Draw order per attempt is fixed: row, column, branch draw `P`, then either
//! the neighbor sample or the independence draw `u`. Changing it changes the
//! process for a given seed.

use rand::rngs::SmallRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};

use crate::config::{ModelConfig, NonconformityMode, SamplingPolicy};
use crate::dynamics::{anticonformism, conformism};
use crate::lattice::{Lattice, Opinion};
use crate::neighbors::neighbors;

/// What a single elementary attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    /// Conformity branch applied (the opinion may or may not have changed)
    Conformity,
    /// Anticonformity branch applied
    Anticonformity,
    /// Independence branch flipped the site
    IndependentFlip,
    /// Independence branch drew `u >= f`
    IndependentStay,
    /// Too few neighbors for the sampling policy, nothing written
    Skipped,
}

/// Counts of attempt outcomes over one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepTally {
    pub conformity: usize,
    pub anticonformity: usize,
    pub independent_flips: usize,
    pub independent_stays: usize,
    pub skipped: usize,
    /// Attempts that changed the chosen site's opinion
    pub changed: usize,
}

impl StepTally {
    fn record(&mut self, kind: UpdateKind, changed: bool) {
        match kind {
            UpdateKind::Conformity => self.conformity += 1,
            UpdateKind::Anticonformity => self.anticonformity += 1,
            UpdateKind::IndependentFlip => self.independent_flips += 1,
            UpdateKind::IndependentStay => self.independent_stays += 1,
            UpdateKind::Skipped => self.skipped += 1,
        }
        if changed {
            self.changed += 1;
        }
    }

    /// Total attempts recorded.
    pub fn attempts(&self) -> usize {
        self.conformity
            + self.anticonformity
            + self.independent_flips
            + self.independent_stays
            + self.skipped
    }
}

/// Perform one Monte Carlo step on `lattice` and return it.
///
/// Parameters are not validated here; see [`ModelConfig::validate`].
pub fn step<'a, R: Rng + ?Sized>(
    lattice: &'a mut Lattice,
    config: &ModelConfig,
    rng: &mut R,
) -> &'a mut Lattice {
    step_with_tally(lattice, config, rng);
    lattice
}

/// Like [`step`], but reports what each attempt did.
pub fn step_with_tally<R: Rng + ?Sized>(
    lattice: &mut Lattice,
    config: &ModelConfig,
    rng: &mut R,
) -> StepTally {
    let mut tally = StepTally::default();
    let mut sample = Vec::with_capacity(config.influence_size);
    for _ in 0..lattice.site_count() {
        let attempt = update_site(lattice, config, rng, &mut sample);
        tally.record(attempt.kind, attempt.changed());
    }
    tally
}

/// Result of one elementary update attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    pub row: usize,
    pub col: usize,
    pub before: Opinion,
    pub after: Opinion,
    pub kind: UpdateKind,
}

impl Attempt {
    pub fn changed(&self) -> bool {
        self.before != self.after
    }
}

/// One elementary update attempt on a uniformly chosen site.
pub fn elementary_update<R: Rng + ?Sized>(
    lattice: &mut Lattice,
    config: &ModelConfig,
    rng: &mut R,
) -> Attempt {
    update_site(lattice, config, rng, &mut Vec::with_capacity(config.influence_size))
}

/// `sample` is scratch space for the influence group, reused across attempts.
fn update_site<R: Rng + ?Sized>(
    lattice: &mut Lattice,
    config: &ModelConfig,
    rng: &mut R,
    sample: &mut Vec<Opinion>,
) -> Attempt {
    let n = lattice.size();
    let row = rng.gen_range(0..n);
    let col = rng.gen_range(0..n);
    let agent = lattice.get(row, col);

    let draw: f64 = rng.gen();
    let kind = if draw > config.nonconformity_probability {
        influence_update(
            lattice,
            config,
            rng,
            sample,
            (row, col, agent),
            conformism,
            UpdateKind::Conformity,
        )
    } else {
        match config.mode {
            NonconformityMode::Anticonformity => influence_update(
                lattice,
                config,
                rng,
                sample,
                (row, col, agent),
                anticonformism,
                UpdateKind::Anticonformity,
            ),
            NonconformityMode::Independence => {
                let u: f64 = rng.gen();
                if u < config.flip_probability {
                    lattice.set(row, col, -agent);
                    UpdateKind::IndependentFlip
                } else {
                    UpdateKind::IndependentStay
                }
            }
        }
    };
    Attempt {
        row,
        col,
        before: agent,
        after: lattice.get(row, col),
        kind,
    }
}

type Rule = fn(&[Opinion], usize, Opinion) -> Opinion;

/// Sample the influence group per the sampling policy into `sample` and
/// apply `rule` to the site `(row, col)` holding `agent`.
fn influence_update<R: Rng + ?Sized>(
    lattice: &mut Lattice,
    config: &ModelConfig,
    rng: &mut R,
    sample: &mut Vec<Opinion>,
    (row, col, agent): (usize, usize, Opinion),
    rule: Rule,
    applied: UpdateKind,
) -> UpdateKind {
    let found = neighbors(lattice, row, col);
    let pool = found.as_slice();
    let q = config.influence_size;

    sample.clear();
    match config.sampling {
        SamplingPolicy::WithReplacement => {
            // A 1x1 lattice has nothing to sample from
            if pool.is_empty() {
                return UpdateKind::Skipped;
            }
            sample.extend((0..q).map(|_| pool[rng.gen_range(0..pool.len())]));
        }
        SamplingPolicy::WithoutReplacement => {
            if pool.len() < q {
                return UpdateKind::Skipped;
            }
            sample.extend(index::sample(rng, pool.len(), q).into_iter().map(|i| pool[i]));
        }
    }

    lattice.set(row, col, rule(sample.as_slice(), q, agent));
    applied
}

/// Stepper owning its random source.
pub struct MonteCarloStepper<R = SmallRng> {
    rng: R,
    steps_taken: u64,
}

impl MonteCarloStepper<SmallRng> {
    /// Stepper driven by a `SmallRng` seeded from `seed`.
    pub fn from_seed(seed: u64) -> Self {
        Self::new(SmallRng::seed_from_u64(seed))
    }
}

impl<R: Rng> MonteCarloStepper<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            steps_taken: 0,
        }
    }

    /// Build the initial lattice using this stepper's random source.
    pub fn initialize(&mut self, config: &ModelConfig) -> Lattice {
        Lattice::initialize(config, &mut self.rng)
    }

    /// Perform one Monte Carlo step.
    pub fn step<'a>(&mut self, lattice: &'a mut Lattice, config: &ModelConfig) -> &'a mut Lattice {
        let tally = step_with_tally(lattice, config, &mut self.rng);
        self.steps_taken += 1;
        tracing::trace!(step = self.steps_taken, ?tally, "monte carlo step");
        lattice
    }

    pub fn steps_taken(&self) -> u64 {
        self.steps_taken
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::{NEGATIVE, POSITIVE};
    use rand::rngs::mock::StepRng;

    fn model(size: usize) -> ModelConfig {
        ModelConfig {
            lattice_size: size,
            ..ModelConfig::default()
        }
    }

    #[test]
    fn test_step_performs_n_squared_attempts() {
        let config = model(6);
        let mut rng = SmallRng::seed_from_u64(3);
        let mut lattice = Lattice::initialize(&config, &mut rng);
        let tally = step_with_tally(&mut lattice, &config, &mut rng);
        assert_eq!(tally.attempts(), 36);
    }

    #[test]
    fn test_frozen_independence() {
        let config = ModelConfig {
            lattice_size: 8,
            nonconformity_probability: 1.0,
            flip_probability: 0.0,
            mode: NonconformityMode::Independence,
            ..ModelConfig::default()
        };
        let mut rng = SmallRng::seed_from_u64(11);
        let mut lattice = Lattice::initialize(&config, &mut rng);
        let before = lattice.clone();
        for _ in 0..20 {
            let tally = step_with_tally(&mut lattice, &config, &mut rng);
            assert_eq!(tally.independent_stays, 64);
        }
        assert_eq!(lattice, before);
    }

    #[test]
    fn test_forced_flip_parity() {
        let config = ModelConfig {
            lattice_size: 5,
            nonconformity_probability: 1.0,
            flip_probability: 1.0,
            mode: NonconformityMode::Independence,
            ..ModelConfig::default()
        };
        let mut rng = SmallRng::seed_from_u64(21);
        let mut lattice = Lattice::initialize(&config, &mut rng);
        let before = lattice.clone();

        let mut visits = vec![0usize; 25];
        for _ in 0..lattice.site_count() {
            let attempt = elementary_update(&mut lattice, &config, &mut rng);
            assert_eq!(attempt.kind, UpdateKind::IndependentFlip);
            assert!(attempt.changed());
            visits[attempt.row * 5 + attempt.col] += 1;
        }

        for (i, &count) in visits.iter().enumerate() {
            let expected = if count % 2 == 0 {
                before.cells()[i]
            } else {
                -before.cells()[i]
            };
            assert_eq!(lattice.cells()[i], expected, "site {} visited {} times", i, count);
        }
    }

    #[test]
    fn test_conformity_on_consensus_is_fixed_point() {
        for sampling in [SamplingPolicy::WithReplacement, SamplingPolicy::WithoutReplacement] {
            let config = ModelConfig {
                lattice_size: 6,
                influence_size: 2,
                nonconformity_probability: 0.0,
                sampling,
                ..ModelConfig::default()
            };
            let mut rng = SmallRng::seed_from_u64(4);
            let mut lattice = Lattice::uniform(6, NEGATIVE);
            step(&mut lattice, &config, &mut rng);
            assert_eq!(lattice, Lattice::uniform(6, NEGATIVE));
        }
    }

    #[test]
    fn test_anticonformity_breaks_consensus() {
        let config = ModelConfig {
            lattice_size: 6,
            influence_size: 2,
            nonconformity_probability: 1.0,
            mode: NonconformityMode::Anticonformity,
            ..ModelConfig::default()
        };
        let mut rng = SmallRng::seed_from_u64(8);
        let mut lattice = Lattice::uniform(6, POSITIVE);
        let tally = step_with_tally(&mut lattice, &config, &mut rng);
        assert_eq!(tally.anticonformity, 36);
        assert!(tally.changed > 0);
        assert!(lattice.positive_count() < 36);
    }

    #[test]
    fn test_without_replacement_skips_when_q_exceeds_neighbors() {
        let config = ModelConfig {
            lattice_size: 4,
            influence_size: 4,
            nonconformity_probability: 0.0,
            sampling: SamplingPolicy::WithoutReplacement,
            ..ModelConfig::default()
        };
        let mut rng = SmallRng::seed_from_u64(2);
        let mut lattice = Lattice::uniform(4, NEGATIVE);
        // Interior sites of a 4x4 are the only ones with 4 neighbors
        for _ in 0..200 {
            let attempt = elementary_update(&mut lattice, &config, &mut rng);
            let interior = (1..3).contains(&attempt.row) && (1..3).contains(&attempt.col);
            if interior {
                assert_eq!(attempt.kind, UpdateKind::Conformity);
            } else {
                assert_eq!(attempt.kind, UpdateKind::Skipped);
            }
        }
    }

    #[test]
    fn test_single_site_lattice_never_panics() {
        let config = ModelConfig {
            lattice_size: 1,
            nonconformity_probability: 0.0,
            ..ModelConfig::default()
        };
        let mut rng = SmallRng::seed_from_u64(0);
        let mut lattice = Lattice::uniform(1, POSITIVE);
        let tally = step_with_tally(&mut lattice, &config, &mut rng);
        assert_eq!(tally.skipped, 1);
        assert_eq!(lattice.get(0, 0), POSITIVE);
    }

    #[test]
    fn test_draw_equal_to_p_takes_nonconformity_branch() {
        // Every draw is exactly 0.0, so the branch draw equals p
        let config = ModelConfig {
            lattice_size: 3,
            nonconformity_probability: 0.0,
            flip_probability: 1.0,
            mode: NonconformityMode::Independence,
            ..ModelConfig::default()
        };
        let mut rng = StepRng::new(0, 0);
        let mut lattice = Lattice::uniform(3, POSITIVE);

        let attempt = elementary_update(&mut lattice, &config, &mut rng);
        assert_eq!(attempt.kind, UpdateKind::IndependentFlip);
        assert_eq!((attempt.row, attempt.col), (0, 0));
        assert_eq!(lattice.get(0, 0), NEGATIVE);
    }

    #[test]
    fn test_without_replacement_draws_distinct_neighbors() {
        // Corner (0, 0) has neighbors (1, 0) = +1 and (0, 1) = -1. Two distinct
        // draws always form a mixed group, so the corner never changes.
        #[rustfmt::skip]
        let cells = vec![
            -1, -1,  1,
             1,  1, -1,
            -1,  1,  1,
        ];
        let initial = Lattice::from_cells(3, cells).unwrap();
        let config = ModelConfig {
            lattice_size: 3,
            influence_size: 2,
            nonconformity_probability: 0.0,
            sampling: SamplingPolicy::WithoutReplacement,
            ..ModelConfig::default()
        };

        let mut corner_attempts = 0;
        for seed in 0..200 {
            let mut rng = SmallRng::seed_from_u64(seed);
            for _ in 0..50 {
                let mut lattice = initial.clone();
                let attempt = elementary_update(&mut lattice, &config, &mut rng);
                if (attempt.row, attempt.col) == (0, 0) {
                    corner_attempts += 1;
                    assert_eq!(attempt.kind, UpdateKind::Conformity);
                    assert_eq!(attempt.after, attempt.before);
                }
            }
        }
        assert!(corner_attempts > 0);
    }

    #[test]
    fn test_step_matches_repeated_elementary_updates() {
        let config = ModelConfig {
            lattice_size: 5,
            influence_size: 3,
            nonconformity_probability: 0.2,
            mode: NonconformityMode::Anticonformity,
            ..ModelConfig::default()
        };
        let initial = Lattice::initialize(&config, &mut SmallRng::seed_from_u64(1));

        let mut stepped = initial.clone();
        step(&mut stepped, &config, &mut SmallRng::seed_from_u64(2));

        let mut manual = initial;
        let mut rng = SmallRng::seed_from_u64(2);
        for _ in 0..25 {
            elementary_update(&mut manual, &config, &mut rng);
        }
        assert_eq!(stepped, manual);
    }

    #[test]
    fn test_stepper_counts_steps() {
        let config = model(4);
        let mut stepper = MonteCarloStepper::from_seed(17);
        let mut lattice = stepper.initialize(&config);
        stepper.step(&mut lattice, &config);
        stepper.step(&mut lattice, &config);
        assert_eq!(stepper.steps_taken(), 2);
    }
}
