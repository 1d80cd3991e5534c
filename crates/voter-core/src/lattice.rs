//! Lattice
//!
//! N×N grid of binary opinions stored row-major.

use bevy_ecs::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;
use std::fmt;
use thiserror::Error;
use voter_events::LatticeSnapshot;

use crate::config::ModelConfig;

/// A site's opinion, always `POSITIVE` or `NEGATIVE` inside a lattice.
pub type Opinion = i8;

pub const POSITIVE: Opinion = 1;
pub const NEGATIVE: Opinion = -1;

/// Errors raised when building a lattice from raw cells.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LatticeError {
    #[error("expected {expected} cells for the lattice, got {actual}")]
    WrongLength { expected: usize, actual: usize },
    #[error("cell {index} holds {value}, opinions must be -1 or +1")]
    InvalidOpinion { index: usize, value: Opinion },
}

/// Square grid of opinions indexed by `(row, col)`.
#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub struct Lattice {
    size: usize,
    cells: Vec<Opinion>,
}

impl Lattice {
    /// Build the initial lattice for `config`.
    ///
    /// Exactly `round(initial_concentration * N²)` sites start at +1. The
    /// positions come from a full shuffle of a vector holding all the +1
    /// entries followed by the -1 entries, so the count is exact for every
    /// seed.
    pub fn initialize<R: Rng + ?Sized>(config: &ModelConfig, rng: &mut R) -> Self {
        let size = config.lattice_size;
        let total = size * size;
        let positive = ((config.initial_concentration * total as f64).round() as usize).min(total);

        let mut cells = vec![POSITIVE; positive];
        cells.resize(total, NEGATIVE);
        cells.shuffle(rng);

        tracing::debug!(size, positive, "initialized lattice");
        Self { size, cells }
    }

    /// Build a lattice from explicit row-major cells.
    pub fn from_cells(size: usize, cells: Vec<Opinion>) -> Result<Self, LatticeError> {
        let expected = size * size;
        if cells.len() != expected {
            return Err(LatticeError::WrongLength {
                expected,
                actual: cells.len(),
            });
        }
        if let Some((index, &value)) = cells
            .iter()
            .enumerate()
            .find(|&(_, &v)| v != POSITIVE && v != NEGATIVE)
        {
            return Err(LatticeError::InvalidOpinion { index, value });
        }
        Ok(Self { size, cells })
    }

    /// Lattice where every site holds `opinion`. Panics unless `opinion` is ±1.
    pub fn uniform(size: usize, opinion: Opinion) -> Self {
        assert!(
            opinion == POSITIVE || opinion == NEGATIVE,
            "opinion must be -1 or +1, got {}",
            opinion
        );
        Self {
            size,
            cells: vec![opinion; size * size],
        }
    }

    /// Side length N.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of sites, N².
    pub fn site_count(&self) -> usize {
        self.cells.len()
    }

    /// Opinion at `(row, col)`. Panics outside the grid.
    pub fn get(&self, row: usize, col: usize) -> Opinion {
        self.cells[self.index(row, col)]
    }

    /// Overwrite the opinion at `(row, col)`. Panics outside the grid.
    pub fn set(&mut self, row: usize, col: usize, opinion: Opinion) {
        let index = self.index(row, col);
        self.cells[index] = opinion;
    }

    /// Row-major view of all opinions.
    pub fn cells(&self) -> &[Opinion] {
        &self.cells
    }

    pub fn positive_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c == POSITIVE).count()
    }

    /// Sum of all opinions.
    pub fn opinion_sum(&self) -> i64 {
        self.cells.iter().map(|&c| i64::from(c)).sum()
    }

    /// Mean opinion, `sum / N²`.
    pub fn mean_opinion(&self) -> f64 {
        if self.cells.is_empty() {
            return 0.0;
        }
        self.opinion_sum() as f64 / self.cells.len() as f64
    }

    /// Detached copy for observers.
    pub fn snapshot(&self) -> LatticeSnapshot {
        LatticeSnapshot {
            size: self.size,
            cells: self.cells.clone(),
        }
    }

    fn index(&self, row: usize, col: usize) -> usize {
        assert!(
            row < self.size && col < self.size,
            "site ({}, {}) outside {}x{} lattice",
            row,
            col,
            self.size,
            self.size
        );
        row * self.size + col
    }
}

/// Mean opinion of `lattice`, the statistic plotted over time.
pub fn summary_statistic(lattice: &Lattice) -> f64 {
    lattice.mean_opinion()
}

impl fmt::Display for Lattice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(self.size.max(1)) {
            for &cell in row {
                write!(f, "{}", if cell == POSITIVE { '+' } else { '-' })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
