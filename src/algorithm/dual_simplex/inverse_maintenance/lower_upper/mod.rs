//! # LU decomposition
//!
//! Decompose the basis matrix `B` into `PBQ = LU` and solve with it. Rather than storing `P` and
//! `Q` as explicit permutations, the factors are kept in the index space of the original rows
//! ("labels"):
//!
//! * `L` is stored per elimination step `k`. Step `k` pivots on row label `pivot_rows[k]` and
//!   subtracts multiples of it from labels that are pivoted later.
//! * `U` is stored per "slot". Each slot has a row label, a diagonal value and a column of
//!   off-diagonal entries at labels of earlier slots. The slot index is its rank in the triangular
//!   order, so that Forrest & Tomlin updates can append new slots at the end.
//!
//! The pairing between row labels and basis positions is fixed at factorization time.
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;

use crate::algorithm::dual_simplex::inverse_maintenance::lower_upper::forrest_tomlin_update::ForrestTomlinUpdate;
use crate::algorithm::dual_simplex::inverse_maintenance::lower_upper::permutation::{Full as FullPermutation, Permutation};
use crate::data::linear_algebra::SparseTuple;
use crate::data::linear_algebra::vector::{IndexedVector, TINY};

pub mod decomposition;
pub mod eta_file;
pub mod forrest_tomlin_update;
pub mod permutation;

/// Placeholder for a listed value that cancelled to zero.
///
/// Keeps "listed in the index" equivalent to "nonzero in the array" during a solve. Removed by the
/// `tight` at the end of each solve.
const ZERO_MARK: f64 = 1e-50;

/// Add `delta` to `array[i]`, registering `i` in `index` if it was zero.
///
/// # Return value
///
/// Whether `i` was newly registered.
#[inline]
pub(crate) fn accumulate(array: &mut [f64], index: &mut Vec<usize>, i: usize, delta: f64) -> bool {
    let before = array[i];
    let after = before + delta;
    array[i] = if after == 0_f64 { ZERO_MARK } else { after };
    if before == 0_f64 {
        index.push(i);
        true
    } else {
        false
    }
}

/// Upper triangle with a column-wise and a row-wise copy of its off-diagonal entries.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct UpperTriangle {
    /// Per slot: (label, value), without the diagonal.
    columns: Vec<Vec<SparseTuple<f64>>>,
    /// Per label: (slot, value), without the diagonal.
    rows: Vec<Vec<SparseTuple<f64>>>,
    /// Per slot.
    diagonal: Vec<f64>,
    /// Per slot.
    slot_label: Vec<usize>,
    /// Per label, the slot that currently holds its diagonal.
    label_slot: Vec<usize>,
    /// Per slot, slots replaced by an update are inactive.
    active: Vec<bool>,
    /// Active off-diagonal entries.
    nnz: usize,
}

impl UpperTriangle {
    fn new(m: usize) -> Self {
        Self {
            columns: Vec::with_capacity(m),
            rows: vec![Vec::new(); m],
            diagonal: Vec::with_capacity(m),
            slot_label: Vec::with_capacity(m),
            label_slot: vec![0; m],
            active: Vec::with_capacity(m),
            nnz: 0,
        }
    }

    /// Append a slot at the end of the triangular order.
    fn push_slot(
        &mut self,
        label: usize,
        diagonal: f64,
        column: Vec<SparseTuple<f64>>,
    ) {
        let slot = self.columns.len();
        for &(i, value) in &column {
            debug_assert_ne!(i, label);
            debug_assert!(self.active[self.label_slot[i]] && self.label_slot[i] < slot);

            self.rows[i].push((slot, value));
        }
        self.nnz += column.len();
        self.columns.push(column);
        self.diagonal.push(diagonal);
        self.slot_label.push(label);
        self.label_slot[label] = slot;
        self.active.push(true);
    }

    /// Remove all off-diagonal entries of row `label`.
    fn clear_row(&mut self, label: usize) {
        let row = std::mem::take(&mut self.rows[label]);
        for (slot, _) in &row {
            let column = &mut self.columns[*slot];
            if let Some(k) = column.iter().position(|&(i, _)| i == label) {
                column.swap_remove(k);
            }
        }
        self.nnz -= row.len();
    }

    /// Deactivate a slot and remove its column.
    fn deactivate(&mut self, slot: usize) {
        let column = std::mem::take(&mut self.columns[slot]);
        for (label, _) in &column {
            let row = &mut self.rows[*label];
            if let Some(k) = row.iter().position(|&(s, _)| s == slot) {
                row.swap_remove(k);
            }
        }
        self.nnz -= column.len();
        self.active[slot] = false;
    }

    fn nr_slots(&self) -> usize {
        self.columns.len()
    }
}

/// Decomposition of a basis matrix, kept up to date with Forrest & Tomlin updates.
#[derive(Clone, Debug)]
pub struct LUDecomposition {
    m: usize,
    /// Row label pivoted in each elimination step.
    pivot_rows: Vec<usize>,
    /// Inverse of `pivot_rows`.
    step_of_row: Vec<usize>,
    /// Per step: (label, multiplier) for the labels eliminated with the pivot row.
    lower_columns: Vec<Vec<SparseTuple<f64>>>,
    /// Per label: (pivot label, multiplier), the row-wise copy of `lower_columns`.
    lower_rows: Vec<Vec<SparseTuple<f64>>>,
    lower_nnz: usize,
    upper: UpperTriangle,
    /// Forward: basis position to row label. Backward: row label to basis position.
    labels: FullPermutation,
    updates: Vec<ForrestTomlinUpdate>,
    /// Factor size right after the decomposition, used to measure fill growth.
    fresh_nnz: usize,

    // Scratch space reused across solves
    max_heap: BinaryHeap<usize>,
    min_heap: BinaryHeap<Reverse<usize>>,
    permute_buffer: Vec<SparseTuple<f64>>,
}

impl LUDecomposition {
    /// Dimension of the basis.
    pub fn m(&self) -> usize {
        self.m
    }

    /// Number of Forrest & Tomlin updates applied since the decomposition.
    pub fn nr_updates(&self) -> usize {
        self.updates.len()
    }

    /// Nonzeros of `L`, `U` including its diagonal and all row etas.
    pub fn nnz(&self) -> usize {
        self.lower_nnz + self.upper.nnz + self.m + self.updates.iter().map(|update| update.eta_file().len()).sum::<usize>()
    }

    /// Value of `nnz` right after the decomposition.
    pub fn fresh_nnz(&self) -> usize {
        self.fresh_nnz
    }

    /// Solve `B x = r` in place.
    ///
    /// # Arguments
    ///
    /// * `rhs`: Right-hand side indexed by row, overwritten by the solution indexed by basis
    /// position.
    /// * `spike`: If present, receives the partially transformed right-hand side that a
    /// Forrest & Tomlin update of this column needs.
    pub fn ftran(&mut self, rhs: &mut IndexedVector<f64>, spike: Option<&mut IndexedVector<f64>>) {
        debug_assert_eq!(rhs.dim(), self.m);

        let mut ticks = self.solve_lower(rhs);
        {
            let (array, index) = rhs.parts_mut();
            for update in &self.updates {
                ticks += update.eta_file().apply_right(array, index);
            }
        }
        if let Some(spike) = spike {
            spike.copy_from(rhs);
        }
        ticks += self.solve_upper(rhs);
        self.permute(rhs, |labels, label| labels.backward(label));
        rhs.tight();
        rhs.add_ticks(ticks as f64);
    }

    /// Solve `B^T x = r` in place.
    ///
    /// # Arguments
    ///
    /// * `rhs`: Right-hand side indexed by basis position, overwritten by the solution indexed by
    /// row.
    pub fn btran(&mut self, rhs: &mut IndexedVector<f64>) {
        debug_assert_eq!(rhs.dim(), self.m);

        self.permute(rhs, |labels, position| labels.forward(position));
        let mut ticks = self.solve_upper_transposed(rhs);
        {
            let (array, index) = rhs.parts_mut();
            for update in self.updates.iter().rev() {
                ticks += update.eta_file().apply_left(array, index);
            }
        }
        ticks += self.solve_lower_transposed(rhs);
        rhs.tight();
        rhs.add_ticks(ticks as f64);
    }

    /// Forward substitution with `L`, by increasing step.
    fn solve_lower(&mut self, rhs: &mut IndexedVector<f64>) -> usize {
        let mut ticks = 0;
        if rhs.is_hyper_sparse(rhs.count()) {
            let Self { min_heap, lower_columns, pivot_rows, step_of_row, .. } = self;
            let (array, index) = rhs.parts_mut();
            min_heap.clear();
            min_heap.extend(index.iter().map(|&i| Reverse(step_of_row[i])));
            while let Some(Reverse(step)) = min_heap.pop() {
                let value = array[pivot_rows[step]];
                if value.abs() < TINY {
                    continue;
                }
                for &(i, multiplier) in &lower_columns[step] {
                    if accumulate(array, index, i, -multiplier * value) {
                        min_heap.push(Reverse(step_of_row[i]));
                    }
                }
                ticks += lower_columns[step].len() + 1;
            }
        } else {
            {
                let (array, _) = rhs.parts_mut();
                for (step, column) in self.lower_columns.iter().enumerate() {
                    let value = array[self.pivot_rows[step]];
                    if value == 0_f64 {
                        continue;
                    }
                    for &(i, multiplier) in column {
                        array[i] -= multiplier * value;
                    }
                    ticks += column.len();
                }
            }
            ticks += self.m;
            rhs.re_index();
        }

        ticks
    }

    /// Back substitution with `U`, by decreasing slot.
    fn solve_upper(&mut self, rhs: &mut IndexedVector<f64>) -> usize {
        let mut ticks = 0;
        if rhs.is_hyper_sparse(rhs.count()) {
            let Self { max_heap, upper, .. } = self;
            let (array, index) = rhs.parts_mut();
            max_heap.clear();
            max_heap.extend(index.iter().map(|&i| upper.label_slot[i]));
            while let Some(slot) = max_heap.pop() {
                let label = upper.slot_label[slot];
                let value = array[label];
                if value.abs() < TINY {
                    array[label] = ZERO_MARK;
                    continue;
                }
                let solution = value / upper.diagonal[slot];
                array[label] = solution;
                for &(i, entry) in &upper.columns[slot] {
                    if accumulate(array, index, i, -entry * solution) {
                        max_heap.push(upper.label_slot[i]);
                    }
                }
                ticks += upper.columns[slot].len() + 1;
            }
        } else {
            {
                let upper = &self.upper;
                let (array, _) = rhs.parts_mut();
                for slot in (0..upper.nr_slots()).rev() {
                    if !upper.active[slot] {
                        continue;
                    }
                    let label = upper.slot_label[slot];
                    if array[label] == 0_f64 {
                        continue;
                    }
                    let solution = array[label] / upper.diagonal[slot];
                    array[label] = solution;
                    for &(i, entry) in &upper.columns[slot] {
                        array[i] -= entry * solution;
                    }
                    ticks += upper.columns[slot].len();
                }
            }
            ticks += self.upper.nr_slots();
            rhs.re_index();
        }

        ticks
    }

    /// Forward substitution with `U^T`, by increasing slot.
    fn solve_upper_transposed(&mut self, rhs: &mut IndexedVector<f64>) -> usize {
        let mut ticks = 0;
        if rhs.is_hyper_sparse(rhs.count()) {
            let Self { min_heap, upper, .. } = self;
            let (array, index) = rhs.parts_mut();
            min_heap.clear();
            min_heap.extend(index.iter().map(|&i| Reverse(upper.label_slot[i])));
            while let Some(Reverse(slot)) = min_heap.pop() {
                let label = upper.slot_label[slot];
                let value = array[label];
                if value.abs() < TINY {
                    array[label] = ZERO_MARK;
                    continue;
                }
                let solution = value / upper.diagonal[slot];
                array[label] = solution;
                for &(later, entry) in &upper.rows[label] {
                    if accumulate(array, index, upper.slot_label[later], -entry * solution) {
                        min_heap.push(Reverse(later));
                    }
                }
                ticks += upper.rows[label].len() + 1;
            }
        } else {
            {
                let upper = &self.upper;
                let (array, _) = rhs.parts_mut();
                for slot in 0..upper.nr_slots() {
                    if !upper.active[slot] {
                        continue;
                    }
                    let label = upper.slot_label[slot];
                    let inner = upper.columns[slot].iter()
                        .map(|&(i, entry)| entry * array[i])
                        .sum::<f64>();
                    array[label] = (array[label] - inner) / upper.diagonal[slot];
                    ticks += upper.columns[slot].len();
                }
            }
            ticks += self.upper.nr_slots();
            rhs.re_index();
        }

        ticks
    }

    /// Back substitution with `L^T`, by decreasing step.
    fn solve_lower_transposed(&mut self, rhs: &mut IndexedVector<f64>) -> usize {
        let mut ticks = 0;
        if rhs.is_hyper_sparse(rhs.count()) {
            let Self { max_heap, lower_rows, pivot_rows, step_of_row, .. } = self;
            let (array, index) = rhs.parts_mut();
            max_heap.clear();
            max_heap.extend(index.iter().map(|&i| step_of_row[i]));
            while let Some(step) = max_heap.pop() {
                let label = pivot_rows[step];
                let value = array[label];
                if value.abs() < TINY {
                    continue;
                }
                for &(earlier, multiplier) in &lower_rows[label] {
                    if accumulate(array, index, earlier, -multiplier * value) {
                        max_heap.push(step_of_row[earlier]);
                    }
                }
                ticks += lower_rows[label].len() + 1;
            }
        } else {
            {
                let (array, _) = rhs.parts_mut();
                for step in (0..self.m).rev() {
                    let column = &self.lower_columns[step];
                    if column.is_empty() {
                        continue;
                    }
                    let inner = column.iter().map(|&(i, multiplier)| multiplier * array[i]).sum::<f64>();
                    array[self.pivot_rows[step]] -= inner;
                    ticks += column.len();
                }
            }
            ticks += self.m;
            rhs.re_index();
        }

        ticks
    }

    /// Move the listed values of `rhs` to their image under `map`.
    fn permute(
        &mut self,
        rhs: &mut IndexedVector<f64>,
        map: impl Fn(&FullPermutation, usize) -> usize,
    ) {
        let Self { permute_buffer, labels, .. } = self;
        let (array, index) = rhs.parts_mut();
        permute_buffer.clear();
        for &i in index.iter() {
            permute_buffer.push((map(labels, i), array[i]));
            array[i] = 0_f64;
        }
        index.clear();
        for &(i, value) in permute_buffer.iter() {
            array[i] = value;
            index.push(i);
        }
    }

    /// Dense copy of the factored basis matrix `B`, reconstructed as `L U` in position space.
    ///
    /// Only meant for tests and debugging.
    pub fn reconstruct(&self) -> Vec<Vec<f64>> {
        let m = self.m;
        let mut result = vec![vec![0_f64; m]; m];
        for position in 0..m {
            // Column of U for this position, in label space
            let mut column = vec![0_f64; m];
            let label = self.labels.forward(position);
            let slot = self.upper.label_slot[label];
            column[label] = self.upper.diagonal[slot];
            for &(i, value) in &self.upper.columns[slot] {
                column[i] = value;
            }
            // Undo the row etas, newest first
            for update in self.updates.iter().rev() {
                let eta = update.eta_file();
                let mut shift = 0_f64;
                for &(i, r) in eta.values() {
                    shift += r * column[i];
                }
                column[eta.pivot()] += shift;
            }
            // Multiply with L, by decreasing step
            for step in (0..m).rev() {
                let value = column[self.pivot_rows[step]];
                for &(i, multiplier) in &self.lower_columns[step] {
                    column[i] += multiplier * value;
                }
            }
            for (i, value) in column.into_iter().enumerate() {
                result[i][position] = value;
            }
        }

        result
    }
}

impl fmt::Display for LUDecomposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Lower triangular ({} steps):", self.m)?;
        for (step, column) in self.lower_columns.iter().enumerate() {
            write!(f, "{:>4} (row {:>4}):", step, self.pivot_rows[step])?;
            for &(i, value) in column {
                write!(f, " {}:{:.6}", i, value)?;
            }
            writeln!(f)?;
        }
        writeln!(f, "Upper triangular ({} slots, {} updates):", self.upper.nr_slots(), self.updates.len())?;
        for slot in 0..self.upper.nr_slots() {
            if !self.upper.active[slot] {
                continue;
            }
            let label = self.upper.slot_label[slot];
            write!(
                f, "{:>4} (row {:>4}, position {:>4}) diagonal {:.6}:",
                slot, label, self.labels.backward(label), self.upper.diagonal[slot],
            )?;
            for &(i, value) in &self.upper.columns[slot] {
                write!(f, " {}:{:.6}", i, value)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
