//! # Row eta files
//!
//! Each Forrest & Tomlin update eliminates the part of the leaving row that lies to the right of
//! the leaving column. The row operations used are stored as a single row eta.
use crate::algorithm::dual_simplex::inverse_maintenance::lower_upper::accumulate;
use crate::data::linear_algebra::SparseTuple;

/// Update row or "file".
///
/// `R = I - e_p r^T` where `p` is the row label of the leaving position and `r` is nonzero only
/// at labels whose slot comes after the leaving slot in the triangular order.
#[derive(PartialEq, Clone, Debug)]
pub struct EtaFile {
    values: Vec<SparseTuple<f64>>,
    pivot: usize,
}

impl EtaFile {
    /// Create a new instance.
    ///
    /// # Arguments
    ///
    /// * `values`: (row label, multiplier) tuples, none of them at `pivot`.
    /// * `pivot`: Row label that the values are subtracted into.
    pub fn new(values: Vec<SparseTuple<f64>>, pivot: usize) -> Self {
        debug_assert!(values.iter().all(|&(i, _)| i != pivot));

        Self { values, pivot }
    }

    /// Column-multiply with this matrix (from the right, i.e. `R x`), as part of an FTRAN.
    ///
    /// # Return value
    ///
    /// Number of entries read.
    pub fn apply_right(&self, array: &mut [f64], index: &mut Vec<usize>) -> usize {
        let total = self.values.iter().map(|&(i, r)| r * array[i]).sum::<f64>();
        if total != 0_f64 {
            accumulate(array, index, self.pivot, -total);
        }

        self.values.len()
    }

    /// Row-multiply with this matrix (from the left, i.e. `x^T R`), as part of a BTRAN.
    ///
    /// # Return value
    ///
    /// Number of entries written.
    pub fn apply_left(&self, array: &mut [f64], index: &mut Vec<usize>) -> usize {
        let pivot_value = array[self.pivot];
        if pivot_value == 0_f64 {
            return 0;
        }
        for &(i, r) in &self.values {
            accumulate(array, index, i, -r * pivot_value);
        }

        self.values.len()
    }

    /// Value the spike takes at the pivot row after applying this eta.
    ///
    /// During the update, multiples of rows are subtracted from the pivot row to make all of its
    /// values except for the right-most one equal to zero. This computes that right-most value.
    pub fn spike_pivot_value(&self, spike: &[f64]) -> f64 {
        spike[self.pivot] - self.values.iter().map(|&(i, r)| r * spike[i]).sum::<f64>()
    }

    /// Number of stored multipliers.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// The (row label, multiplier) tuples.
    pub fn values(&self) -> &[SparseTuple<f64>] {
        &self.values
    }

    /// Row label that this eta modifies.
    pub fn pivot(&self) -> usize {
        self.pivot
    }
}
