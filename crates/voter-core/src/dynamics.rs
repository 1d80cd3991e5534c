//! Dynamics Rules
//!
//! The q-voter unanimity rules. Only an influence group whose sampled
//! opinions all agree can change a voter.

use crate::lattice::{Opinion, NEGATIVE, POSITIVE};

fn sample_sum(sample: &[Opinion]) -> i64 {
    sample.iter().map(|&o| i64::from(o)).sum()
}

/// Opinion after conformity: adopt a unanimous group's opinion, otherwise keep `agent`.
pub fn conformism(sample: &[Opinion], q: usize, agent: Opinion) -> Opinion {
    let sum = sample_sum(sample);
    let q = q as i64;
    if sum == q {
        POSITIVE
    } else if sum == -q {
        NEGATIVE
    } else {
        agent
    }
}

/// Opinion after anticonformity: take the opposite of a unanimous group's
/// opinion, otherwise keep `agent`.
pub fn anticonformism(sample: &[Opinion], q: usize, agent: Opinion) -> Opinion {
    let sum = sample_sum(sample);
    let q = q as i64;
    if sum == q {
        NEGATIVE
    } else if sum == -q {
        POSITIVE
    } else {
        agent
    }
}
