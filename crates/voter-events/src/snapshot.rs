//! Lattice Snapshots
//!
//! A detached copy of the lattice handed to observers for rendering.
//! Snapshots are read-only views; nothing loads them back into a simulation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Row-major copy of an N×N opinion grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatticeSnapshot {
    /// Side length N
    pub size: usize,
    /// N² opinions in row-major order, each -1 or +1
    pub cells: Vec<i8>,
}

/// Errors raised when building a snapshot from raw parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    /// `cells.len()` did not equal `size * size`
    WrongLength { expected: usize, actual: usize },
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::WrongLength { expected, actual } => {
                write!(f, "expected {} cells, got {}", expected, actual)
            }
        }
    }
}

impl std::error::Error for SnapshotError {}

impl LatticeSnapshot {
    /// Build a snapshot, checking the cell count.
    pub fn new(size: usize, cells: Vec<i8>) -> Result<Self, SnapshotError> {
        let expected = size * size;
        if cells.len() != expected {
            return Err(SnapshotError::WrongLength {
                expected,
                actual: cells.len(),
            });
        }
        Ok(Self { size, cells })
    }

    /// Opinion at `(row, col)`, or `None` outside the grid.
    pub fn get(&self, row: usize, col: usize) -> Option<i8> {
        if row >= self.size || col >= self.size {
            return None;
        }
        self.cells.get(row * self.size + col).copied()
    }

    /// Iterate over rows.
    pub fn rows(&self) -> impl Iterator<Item = &[i8]> {
        // chunks(0) panics, an empty grid simply has no rows
        self.cells.chunks(self.size.max(1))
    }
}

impl fmt::Display for LatticeSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            for &cell in row {
                let glyph = if cell > 0 { '+' } else { '-' };
                write!(f, "{}", glyph)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
