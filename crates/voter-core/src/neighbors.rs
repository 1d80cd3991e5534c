//! Neighbor Lookup
//!
//! Finds the opinions of a site's axis-aligned neighbors on a grid with open
//! (non-periodic) boundaries.

use crate::lattice::{Lattice, Opinion};

/// Placeholder opinion for a neighbor outside the grid. Dropped by value.
pub const NO_NEIGHBOR: Opinion = 0;

/// Opinions of the existing neighbors of one site, at most four.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighborhood {
    values: [Opinion; 4],
    len: usize,
}

impl Neighborhood {
    pub fn as_slice(&self) -> &[Opinion] {
        &self.values[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Opinions of the neighbors of `(row, col)`.
///
/// Candidates are visited in the order (row-1, col), (row+1, col),
/// (row, col-1), (row, col+1). A candidate outside `[0, N)` contributes
/// `NO_NEIGHBOR`, and every `NO_NEIGHBOR` value is then filtered out, so a
/// corner yields 2 opinions, an edge 3 and an interior site 4.
pub fn neighbors(lattice: &Lattice, row: usize, col: usize) -> Neighborhood {
    let n = lattice.size();
    let at = |r: Option<usize>, c: Option<usize>| match (r, c) {
        (Some(r), Some(c)) if r < n && c < n => lattice.get(r, c),
        _ => NO_NEIGHBOR,
    };

    let candidates = [
        at(row.checked_sub(1), Some(col)),
        at(row.checked_add(1), Some(col)),
        at(Some(row), col.checked_sub(1)),
        at(Some(row), col.checked_add(1)),
    ];

    let mut found = Neighborhood {
        values: [NO_NEIGHBOR; 4],
        len: 0,
    };
    for value in candidates {
        if value != NO_NEIGHBOR {
            found.values[found.len] = value;
            found.len += 1;
        }
    }
    found
}
