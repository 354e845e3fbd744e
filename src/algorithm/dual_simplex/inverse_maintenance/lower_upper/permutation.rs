//! # Permutations
//!
//! The factorization pivots row `r` against basis position `p`. The pairing is kept as a full
//! permutation between row labels and basis positions. It is fixed at factorization time: a
//! Forrest & Tomlin update replaces the column at a position, but the row label that position is
//! paired with stays the same.
use std::fmt;

/// Basic permutation behavior.
pub trait Permutation {
    /// Apply the permutation to an index in the forward direction.
    ///
    /// # Arguments
    ///
    /// * `i`: Value in range `0..self.len()`.
    fn forward(&self, i: usize) -> usize;
    /// Apply the permutation to an index in the backward direction.
    ///
    /// # Arguments
    ///
    /// * `i`: Value in range `0..self.len()`.
    fn backward(&self, i: usize) -> usize;
    /// Number of elements permuted.
    fn len(&self) -> usize;
}

/// Full permutation.
///
/// Both the entire forward and backward permutation is stored explicitly.
#[derive(Eq, PartialEq, Clone, Debug)]
pub struct Full {
    /// Index of the value is mapped to the value at the index.
    forward: Vec<usize>,
    /// Index of the value is mapped to the value at the index.
    backward: Vec<usize>,
}

impl Full {
    /// Create a new instance.
    ///
    /// Computes the inverse by scattering.
    pub fn new(forward: Vec<usize>) -> Self {
        let mut backward = vec![0; forward.len()];
        for (i, &j) in forward.iter().enumerate() {
            backward[j] = i;
        }

        Self { forward, backward }
    }

    /// Create a new instance that maps an index onto itself.
    pub fn identity(n: usize) -> Self {
        Self {
            forward: (0..n).collect(),
            backward: (0..n).collect(),
        }
    }
}

impl Permutation for Full {
    fn forward(&self, i: usize) -> usize {
        debug_assert!(i < self.len());

        self.forward[i]
    }

    fn backward(&self, i: usize) -> usize {
        debug_assert!(i < self.len());

        self.backward[i]
    }

    fn len(&self) -> usize {
        self.forward.len()
    }
}

impl fmt::Display for Full {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, j) in self.forward.iter().enumerate() {
            writeln!(f, "{} -> {}", i, j)?;
        }
        Ok(())
    }
}
