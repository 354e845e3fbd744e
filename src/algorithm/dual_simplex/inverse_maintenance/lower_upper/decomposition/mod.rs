//! # LU Decomposition
//!
//! Right-looking elimination on an explicitly stored active submatrix. Pivots are chosen by a
//! `PivotRule`, the default being a Markowitz search with threshold partial pivoting.
use std::collections::BinaryHeap;
use std::mem;

use fifo_set::FIFOSet;
use log::debug;

use crate::algorithm::dual_simplex::inverse_maintenance::FactorError;
use crate::algorithm::dual_simplex::inverse_maintenance::lower_upper::{LUDecomposition, UpperTriangle};
use crate::algorithm::dual_simplex::inverse_maintenance::lower_upper::decomposition::pivoting::{CountLists, Markowitz, PivotChoice, PivotRule};
use crate::algorithm::dual_simplex::inverse_maintenance::lower_upper::permutation::Full as FullPermutation;
use crate::data::linear_algebra::SparseTuple;
use crate::data::linear_algebra::vector::TINY;

mod pivoting;

/// Number of rows or columns with eligible pivots the Markowitz search looks at.
const MAX_SEARCH: usize = 4;

/// Tolerances for the decomposition.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FactorSettings {
    /// Relative pivot threshold, in `(0, 1]`.
    pub pivot_threshold: f64,
    /// Absolute pivot tolerance.
    pub pivot_tolerance: f64,
}

/// Facts about a fresh decomposition.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FactorReport {
    /// Nonzeros of the basis matrix.
    pub basis_nnz: usize,
    /// Nonzeros of `L` and `U`, including the diagonal of `U`.
    pub factor_nnz: usize,
    /// `factor_nnz / basis_nnz`.
    pub fill_factor: f64,
    /// Largest magnitude in `U` relative to the largest magnitude in `B`.
    pub growth: f64,
    /// Work of the elimination, in entries touched.
    pub ticks: f64,
}

/// Basis positions that could not be pivoted, paired with rows that were left over.
///
/// Replacing the column at each of these positions with the unit column of the paired row gives a
/// nonsingular matrix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dependencies {
    /// (basis position, row) pairs.
    pub pairs: Vec<(usize, usize)>,
}

/// Active submatrix during elimination.
pub(super) struct ActiveMatrix {
    m: usize,
    /// Per basis position, the (row, value) entries in active rows.
    columns: Vec<Vec<SparseTuple<f64>>>,
    /// Per row, the active positions with an entry.
    rows: Vec<Vec<usize>>,
    column_max: Vec<f64>,
    column_lists: CountLists,
    row_lists: CountLists,
    /// Lines whose count or maximum changed in the last elimination step.
    stale_columns: FIFOSet<usize>,
    stale_rows: FIFOSet<usize>,
}

impl ActiveMatrix {
    fn new(m: usize, columns: &[Vec<SparseTuple<f64>>]) -> Self {
        let columns = columns.iter()
            .map(|column| column.iter().copied().filter(|&(_, value)| value != 0_f64).collect::<Vec<_>>())
            .collect::<Vec<_>>();
        let mut rows = vec![Vec::new(); m];
        for (j, column) in columns.iter().enumerate() {
            for &(i, _) in column {
                rows[i].push(j);
            }
        }

        let mut column_lists = CountLists::new(m, m);
        let mut row_lists = CountLists::new(m, m);
        // Reverse insertion makes the lists ordered by index
        for j in (0..m).rev() {
            column_lists.insert(j, columns[j].len());
        }
        for i in (0..m).rev() {
            row_lists.insert(i, rows[i].len());
        }
        let column_max = columns.iter().map(|column| max_abs(column)).collect();

        Self {
            m,
            columns,
            rows,
            column_max,
            column_lists,
            row_lists,
            stale_columns: std::iter::empty().collect(),
            stale_rows: std::iter::empty().collect(),
        }
    }

    /// Value at (`row`, `column`), which should be present.
    fn value(&self, row: usize, column: usize) -> f64 {
        self.columns[column].iter()
            .find(|&&(i, _)| i == row)
            .map_or(0_f64, |&(_, value)| value)
    }

    /// Eliminate with the pivot at (`row`, `column`).
    ///
    /// # Return value
    ///
    /// The row of `U`, as (position, value), and the column of `L`, as (row, multiplier).
    fn eliminate(
        &mut self,
        row: usize,
        column: usize,
        pivot: f64,
    ) -> (Vec<SparseTuple<f64>>, Vec<SparseTuple<f64>>) {
        let mut upper_row = Vec::with_capacity(self.rows[row].len());
        for j in mem::take(&mut self.rows[row]) {
            if j == column {
                continue;
            }
            let entries = &mut self.columns[j];
            if let Some(k) = entries.iter().position(|&(i, _)| i == row) {
                upper_row.push((j, entries.swap_remove(k).1));
            }
            self.stale_columns.push(j);
        }

        let mut lower_column = Vec::with_capacity(self.columns[column].len());
        for (i, value) in mem::take(&mut self.columns[column]) {
            if i == row {
                continue;
            }
            lower_column.push((i, value / pivot));
            remove_position(&mut self.rows[i], column);
            self.stale_rows.push(i);
        }

        // Schur complement update
        for &(i, multiplier) in &lower_column {
            for &(j, upper_value) in &upper_row {
                let delta = -multiplier * upper_value;
                let entries = &mut self.columns[j];
                match entries.iter().position(|&(ii, _)| ii == i) {
                    Some(k) => {
                        entries[k].1 += delta;
                        if entries[k].1.abs() < TINY {
                            entries.swap_remove(k);
                            remove_position(&mut self.rows[i], j);
                        }
                    },
                    None => if delta.abs() >= TINY {
                        entries.push((i, delta));
                        self.rows[i].push(j);
                    },
                }
            }
        }

        self.column_lists.remove(column);
        self.row_lists.remove(row);
        self.refresh();

        (upper_row, lower_column)
    }

    /// Take a column out of the active submatrix without pivoting on it.
    fn drop_column(&mut self, column: usize) {
        for (i, _) in mem::take(&mut self.columns[column]) {
            remove_position(&mut self.rows[i], column);
            self.stale_rows.push(i);
        }
        self.column_lists.remove(column);
        self.refresh();
    }

    /// Rebucket the lines touched since the last call.
    fn refresh(&mut self) {
        while let Some(j) = self.stale_columns.pop() {
            self.column_max[j] = max_abs(&self.columns[j]);
            self.column_lists.update(j, self.columns[j].len());
        }
        while let Some(i) = self.stale_rows.pop() {
            self.row_lists.update(i, self.rows[i].len());
        }
    }
}

fn max_abs(column: &[SparseTuple<f64>]) -> f64 {
    column.iter().fold(0_f64, |max, &(_, value)| max.max(value.abs()))
}

fn remove_position(line: &mut Vec<usize>, item: usize) {
    if let Some(k) = line.iter().position(|&x| x == item) {
        line.swap_remove(k);
    }
}

impl LUDecomposition {
    /// Compute the factorization `PBQ = LU`.
    ///
    /// # Arguments
    ///
    /// * `columns`: The basis matrix by basis position, with (row, value) entries.
    /// * `settings`: Pivot tolerances.
    ///
    /// # Return value
    ///
    /// The decomposition and its statistics, or the dependencies found when the matrix is
    /// (numerically) singular.
    pub fn decompose(
        columns: &[Vec<SparseTuple<f64>>],
        settings: &FactorSettings,
    ) -> Result<(Self, FactorReport), FactorError> {
        let m = columns.len();
        debug_assert!(columns.iter().all(|column| column.iter().all(|&(i, _)| i < m)));

        let basis_nnz = columns.iter().map(Vec::len).sum::<usize>();
        let basis_max = columns.iter().map(|column| max_abs(column)).fold(0_f64, f64::max);
        let rule = Markowitz {
            threshold: settings.pivot_threshold,
            tolerance: settings.pivot_tolerance,
            max_search: MAX_SEARCH,
        };

        let mut active = ActiveMatrix::new(m, columns);
        let mut pivots = Vec::new();
        pivots.try_reserve_exact(m).map_err(|_| FactorError::OutOfMemory)?;
        let mut upper_columns = vec![Vec::new(); m];
        let mut lower_columns = Vec::new();
        lower_columns.try_reserve_exact(m).map_err(|_| FactorError::OutOfMemory)?;
        let mut dependent = Vec::new();
        let mut row_done = vec![false; m];
        let mut ticks = basis_nnz;

        while pivots.len() + dependent.len() < m {
            match rule.choose_pivot(&active) {
                PivotChoice::Pivot { row, column, value } => {
                    let (upper_row, lower_column) = active.eliminate(row, column, value);
                    ticks += (upper_row.len() + 1) * (lower_column.len() + 1);
                    for (j, upper_value) in upper_row {
                        upper_columns[j].push((row, upper_value));
                    }
                    lower_columns.push(lower_column);
                    pivots.push((row, column, value));
                    row_done[row] = true;
                },
                PivotChoice::EmptyColumn(column) => {
                    active.drop_column(column);
                    dependent.push(column);
                },
                PivotChoice::Exhausted => {
                    let mut remaining = (0..m)
                        .filter(|&j| !pivots.iter().any(|&(_, c, _)| c == j) && !dependent.contains(&j))
                        .collect::<Vec<_>>();
                    dependent.append(&mut remaining);
                },
            }
        }

        if !dependent.is_empty() {
            dependent.sort_unstable();
            let rows = (0..m).filter(|&i| !row_done[i]);
            let pairs = dependent.into_iter().zip(rows).collect::<Vec<_>>();
            debug!("basis is singular, {} dependent columns", pairs.len());
            return Err(FactorError::SingularBasis(Dependencies { pairs }));
        }

        let mut pivot_rows = Vec::new();
        pivot_rows.try_reserve_exact(m).map_err(|_| FactorError::OutOfMemory)?;
        let decomposition = Self::assemble(m, pivots, lower_columns, upper_columns, pivot_rows);
        let factor_nnz = decomposition.nnz();
        let upper_max = decomposition.upper.diagonal.iter().map(|value| value.abs())
            .chain(decomposition.upper.columns.iter().flat_map(|column| column.iter().map(|(_, value)| value.abs())))
            .fold(0_f64, f64::max);
        let report = FactorReport {
            basis_nnz,
            factor_nnz,
            fill_factor: if basis_nnz > 0 { factor_nnz as f64 / basis_nnz as f64 } else { 1_f64 },
            growth: if basis_max > 0_f64 { upper_max / basis_max } else { 1_f64 },
            ticks: ticks as f64,
        };

        Ok((decomposition, report))
    }

    /// Factorization of the identity matrix.
    pub fn identity(m: usize) -> Self {
        let pivots = (0..m).map(|i| (i, i, 1_f64)).collect();

        Self::assemble(m, pivots, vec![Vec::new(); m], vec![Vec::new(); m], Vec::with_capacity(m))
    }

    /// Store the elimination result in the solve-friendly layout.
    fn assemble(
        m: usize,
        pivots: Vec<(usize, usize, f64)>,
        lower_columns: Vec<Vec<SparseTuple<f64>>>,
        mut upper_columns: Vec<Vec<SparseTuple<f64>>>,
        mut pivot_rows: Vec<usize>,
    ) -> Self {
        let mut lower_rows = vec![Vec::new(); m];
        let mut lower_nnz = 0;
        for (step, column) in lower_columns.iter().enumerate() {
            let pivot_row = pivots[step].0;
            for &(i, multiplier) in column {
                lower_rows[i].push((pivot_row, multiplier));
            }
            lower_nnz += column.len();
        }

        let mut upper = UpperTriangle::new(m);
        let mut step_of_row = vec![0; m];
        let mut position_label = vec![0; m];
        for (step, &(row, column, value)) in pivots.iter().enumerate() {
            pivot_rows.push(row);
            step_of_row[row] = step;
            position_label[column] = row;
            upper.push_slot(row, value, mem::take(&mut upper_columns[column]));
        }

        let mut decomposition = Self {
            m,
            pivot_rows,
            step_of_row,
            lower_columns,
            lower_rows,
            lower_nnz,
            upper,
            labels: FullPermutation::new(position_label),
            updates: Vec::new(),
            fresh_nnz: 0,
            max_heap: BinaryHeap::with_capacity(m),
            min_heap: BinaryHeap::with_capacity(m),
            permute_buffer: Vec::with_capacity(m),
        };
        decomposition.fresh_nnz = decomposition.nnz();

        decomposition
    }
}
