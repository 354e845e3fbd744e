//! # Forrest & Tomlin LU Update
//!
//! Updating the LU factorization without completely refactoring it.
//!
//! See the 1972 paper by Forrest and Tomlin. When the column at basis position `p` is replaced,
//! the slot holding that column is removed from `U` and the new column, transformed by `L` and the
//! existing row etas (the "spike"), is appended as the last slot. The row of `p`'s label now has
//! entries to the right of its new diagonal position; they are eliminated by a row eta.
use std::collections::BTreeMap;

use crate::algorithm::dual_simplex::inverse_maintenance::UpdateError;
use crate::algorithm::dual_simplex::inverse_maintenance::lower_upper::LUDecomposition;
use crate::algorithm::dual_simplex::inverse_maintenance::lower_upper::eta_file::EtaFile;
use crate::algorithm::dual_simplex::inverse_maintenance::lower_upper::permutation::Permutation;
use crate::data::linear_algebra::vector::{IndexedVector, TINY};
use crate::data::number_types::float::numerical_precision::relative_difference;

/// Relative disagreement tolerated between the new diagonal and its prediction from the pivot.
const STABILITY_TOLERANCE: f64 = 1e-6;

/// Information stored for each step of the Forrest & Tomlin update.
#[derive(Debug, PartialEq, Clone)]
pub struct ForrestTomlinUpdate {
    /// The eta file is called "r" or "R" in the original paper.
    eta_file: EtaFile,
}

impl ForrestTomlinUpdate {
    /// The row eta of this update.
    pub fn eta_file(&self) -> &EtaFile {
        &self.eta_file
    }
}

impl LUDecomposition {
    /// Replace the column at basis position `position` by the column whose spike is given.
    ///
    /// On error, the decomposition is left unchanged and should be rebuilt for the new basis.
    ///
    /// # Arguments
    ///
    /// * `position`: Basis position of the leaving column.
    /// * `spike`: Entering column after applying `L^-1` and the existing row etas, as written by
    /// `ftran`.
    /// * `pivot`: Element of the transformed entering column (`B^-1 a_q`) at `position`.
    /// * `pivot_tolerance`: Smallest acceptable magnitude of the new diagonal value.
    pub fn update(
        &mut self,
        position: usize,
        spike: &IndexedVector<f64>,
        pivot: f64,
        pivot_tolerance: f64,
    ) -> Result<(), UpdateError> {
        debug_assert!(position < self.m);
        debug_assert_eq!(spike.dim(), self.m);

        let label = self.labels.forward(position);
        let leaving_slot = self.upper.label_slot[label];

        let eta_file = EtaFile::new(self.eliminate_row(label), label);
        let diagonal = eta_file.spike_pivot_value(spike.array());
        if diagonal.abs() < pivot_tolerance {
            return Err(UpdateError::Singular { diagonal });
        }
        let expected = self.upper.diagonal[leaving_slot] * pivot;
        if relative_difference(diagonal, expected) > STABILITY_TOLERANCE {
            return Err(UpdateError::Unstable { diagonal, expected });
        }

        // All information is collected, start modifying the triangle
        self.upper.clear_row(label);
        self.upper.deactivate(leaving_slot);
        let column = spike.iter()
            .filter(|&(i, value)| i != label && value.abs() >= TINY)
            .collect();
        self.upper.push_slot(label, diagonal, column);

        self.updates.push(ForrestTomlinUpdate { eta_file });

        Ok(())
    }

    /// Compute `r` such that subtracting `r^T` times the later rows from row `label` zeros out the
    /// part of the row to the right of its diagonal.
    ///
    /// Solves `r^T U_22 = u^T` where `u` holds the off-diagonal entries of the row and `U_22` is
    /// the part of `U` right of and below the diagonal of `label`.
    fn eliminate_row(&self, label: usize) -> Vec<(usize, f64)> {
        // Keyed by slot, which is the triangular order
        let mut work = self.upper.rows[label].iter().copied().collect::<BTreeMap<_, _>>();

        let mut r = Vec::with_capacity(work.len());
        while let Some((slot, value)) = work.pop_first() {
            if value.abs() < TINY {
                continue;
            }
            let multiplier = value / self.upper.diagonal[slot];
            let row_label = self.upper.slot_label[slot];
            r.push((row_label, multiplier));
            for &(later, entry) in &self.upper.rows[row_label] {
                *work.entry(later).or_insert(0_f64) -= multiplier * entry;
            }
        }

        r
    }
}
