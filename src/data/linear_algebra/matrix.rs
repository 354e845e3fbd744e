//! # Sparse matrices
//!
//! The constraint matrix is stored twice: by column for FTRAN right-hand sides and the
//! factorization, and by row for a hyper-sparse PRICE.
use std::iter::Iterator;

use itertools::izip;

use crate::data::linear_algebra::SparseTuple;
use crate::data::linear_algebra::vector::IndexedVector;

/// Compressed sparse column storage.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnMajor {
    start: Vec<usize>,
    index: Vec<usize>,
    value: Vec<f64>,
    nr_rows: usize,
}

/// Compressed sparse row storage.
#[derive(Clone, Debug, PartialEq)]
pub struct RowMajor {
    start: Vec<usize>,
    index: Vec<usize>,
    value: Vec<f64>,
    nr_columns: usize,
}

impl ColumnMajor {
    /// Create a matrix from its compressed arrays.
    ///
    /// The arrays are assumed to be validated already, see `LinearProgram::new`.
    ///
    /// # Arguments
    ///
    /// * `nr_rows`: Number of rows.
    /// * `start`: Length `nr_columns + 1`, offsets of each column in `index` and `value`.
    /// * `index`: Row indices.
    /// * `value`: Values, same length as `index`.
    pub fn new(nr_rows: usize, start: Vec<usize>, index: Vec<usize>, value: Vec<f64>) -> Self {
        debug_assert!(!start.is_empty());
        debug_assert_eq!(start.last().copied(), Some(index.len()));
        debug_assert_eq!(index.len(), value.len());
        debug_assert!(index.iter().all(|&i| i < nr_rows));

        Self { start, index, value, nr_rows }
    }

    /// Create a matrix from dense rows, dropping zeros.
    pub fn from_dense(rows: &[Vec<f64>], nr_columns: usize) -> Self {
        let nr_rows = rows.len();
        let mut columns = vec![Vec::new(); nr_columns];
        for (i, row) in rows.iter().enumerate() {
            debug_assert_eq!(row.len(), nr_columns);
            for (j, &value) in row.iter().enumerate() {
                if value != 0_f64 {
                    columns[j].push((i, value));
                }
            }
        }

        Self::from_columns(nr_rows, columns)
    }

    /// Create a matrix from sparse columns.
    pub fn from_columns(nr_rows: usize, columns: Vec<Vec<SparseTuple<f64>>>) -> Self {
        let mut start = Vec::with_capacity(columns.len() + 1);
        let mut index = Vec::new();
        let mut value = Vec::new();
        start.push(0);
        for column in columns {
            for (i, v) in column {
                index.push(i);
                value.push(v);
            }
            start.push(index.len());
        }

        Self::new(nr_rows, start, index, value)
    }

    /// Row indices and values of column `j`.
    pub fn column(&self, j: usize) -> (&[usize], &[f64]) {
        let range = self.start[j]..self.start[j + 1];
        (&self.index[range.clone()], &self.value[range])
    }

    /// Iterate over the entries of column `j`.
    pub fn column_iter(&self, j: usize) -> impl Iterator<Item = SparseTuple<f64>> + '_ {
        let (index, value) = self.column(j);
        izip!(index.iter().copied(), value.iter().copied())
    }

    /// Inner product of column `j` with a dense vector.
    pub fn column_dot(&self, j: usize, dense: &[f64]) -> f64 {
        self.column_iter(j).map(|(i, v)| v * dense[i]).sum()
    }

    /// Number of rows.
    pub fn nr_rows(&self) -> usize {
        self.nr_rows
    }

    /// Number of columns.
    pub fn nr_columns(&self) -> usize {
        self.start.len() - 1
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.index.len()
    }

    /// Create the row-wise copy.
    pub fn transpose(&self) -> RowMajor {
        let mut counts = vec![0; self.nr_rows + 1];
        for &i in &self.index {
            counts[i + 1] += 1;
        }
        for i in 0..self.nr_rows {
            counts[i + 1] += counts[i];
        }
        let start = counts.clone();
        let mut next = counts;
        let mut index = vec![0; self.index.len()];
        let mut value = vec![0_f64; self.value.len()];
        for j in 0..self.nr_columns() {
            for (i, v) in self.column_iter(j) {
                index[next[i]] = j;
                value[next[i]] = v;
                next[i] += 1;
            }
        }

        RowMajor { start, index, value, nr_columns: self.nr_columns() }
    }

    /// Compute `a_j^T rho` for all columns by a dense sweep over the columns.
    ///
    /// The result is written to the first `nr_columns` positions of `result`, which should be
    /// cleared.
    pub fn price_by_column(&self, rho: &IndexedVector<f64>, result: &mut IndexedVector<f64>) {
        let dense = rho.array();
        let (array, index) = result.parts_mut();
        for j in 0..self.nr_columns() {
            let value = self.column_dot(j, dense);
            if value != 0_f64 {
                array[j] = value;
                index.push(j);
            }
        }
        result.add_ticks(self.nnz() as f64);
    }
}

impl RowMajor {
    /// Column indices and values of row `i`.
    pub fn row(&self, i: usize) -> (&[usize], &[f64]) {
        let range = self.start[i]..self.start[i + 1];
        (&self.index[range.clone()], &self.value[range])
    }

    /// Number of rows.
    pub fn nr_rows(&self) -> usize {
        self.start.len() - 1
    }

    /// Number of columns.
    pub fn nr_columns(&self) -> usize {
        self.nr_columns
    }

    /// Compute `a_j^T rho` for all columns by combining the rows in the support of `rho`.
    ///
    /// Cheap when `rho` is hyper-sparse. The result is written to the first `nr_columns`
    /// positions of `result`, which should be cleared.
    pub fn price_by_row(&self, rho: &IndexedVector<f64>, result: &mut IndexedVector<f64>) {
        let mut ticks = 0;
        {
            let (array, index) = result.parts_mut();
            for &i in rho.index() {
                let multiplier = rho.get(i);
                if multiplier == 0_f64 {
                    continue;
                }
                let (columns, values) = self.row(i);
                ticks += columns.len();
                for (&j, &v) in columns.iter().zip(values) {
                    if array[j] == 0_f64 {
                        index.push(j);
                    }
                    array[j] += multiplier * v;
                    if array[j] == 0_f64 {
                        // Keep the position registered, `tight` removes it
                        array[j] = f64::MIN_POSITIVE;
                    }
                }
            }
        }
        result.add_ticks(ticks as f64);
        result.tight();
    }
}
