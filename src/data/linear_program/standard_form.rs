//! # Linear programs in bounded standard form
//!
//! `min c^T x + offset` subject to `row_lower <= A x <= row_upper` and
//! `column_lower <= x <= column_upper`. Absent bounds are infinite. The program is validated on
//! construction and immutable afterwards.
use std::collections::HashSet;

use crate::data::linear_algebra::matrix::{ColumnMajor, RowMajor};
use crate::data::linear_program::elements::{ObjectiveSense, VariableKind};
use crate::data::linear_program::error::InputError;
use crate::data::number_types::float::numerical_precision::normalize_infinity;

/// Default magnitude beyond which a bound is considered infinite.
pub const DEFAULT_INFINITY: f64 = 1e30;

/// A validated linear program.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearProgram {
    sense: ObjectiveSense,
    offset: f64,
    costs: Vec<f64>,
    column_lower: Vec<f64>,
    column_upper: Vec<f64>,
    row_lower: Vec<f64>,
    row_upper: Vec<f64>,
    columns: ColumnMajor,
    rows: RowMajor,
}

impl LinearProgram {
    /// Start building a program with `nr_rows` rows and `nr_columns` columns.
    ///
    /// Columns default to `[0, inf)` with zero cost, rows default to free and the matrix to empty.
    pub fn builder(nr_rows: usize, nr_columns: usize) -> LinearProgramBuilder {
        LinearProgramBuilder {
            nr_rows,
            nr_columns,
            sense: ObjectiveSense::Minimize,
            offset: 0_f64,
            costs: vec![0_f64; nr_columns],
            column_lower: vec![0_f64; nr_columns],
            column_upper: vec![f64::INFINITY; nr_columns],
            row_lower: vec![f64::NEG_INFINITY; nr_rows],
            row_upper: vec![f64::INFINITY; nr_rows],
            start: vec![0; nr_columns + 1],
            index: Vec::new(),
            value: Vec::new(),
            infinity: DEFAULT_INFINITY,
        }
    }

    /// Number of constraint rows `m`.
    pub fn nr_rows(&self) -> usize {
        self.row_lower.len()
    }

    /// Number of structural columns `n`.
    pub fn nr_columns(&self) -> usize {
        self.costs.len()
    }

    /// Direction of optimization.
    pub fn sense(&self) -> ObjectiveSense {
        self.sense
    }

    /// Constant added to the objective.
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Cost vector in the direction of `sense`.
    pub fn costs(&self) -> &[f64] {
        &self.costs
    }

    #[allow(missing_docs)]
    pub fn column_lower(&self) -> &[f64] {
        &self.column_lower
    }

    #[allow(missing_docs)]
    pub fn column_upper(&self) -> &[f64] {
        &self.column_upper
    }

    #[allow(missing_docs)]
    pub fn row_lower(&self) -> &[f64] {
        &self.row_lower
    }

    #[allow(missing_docs)]
    pub fn row_upper(&self) -> &[f64] {
        &self.row_upper
    }

    /// The constraint matrix by column.
    pub fn columns(&self) -> &ColumnMajor {
        &self.columns
    }

    /// The constraint matrix by row.
    pub fn rows(&self) -> &RowMajor {
        &self.rows
    }

    /// Objective value of a point in the caller's sense, including the offset.
    pub fn objective_value(&self, column_values: &[f64]) -> f64 {
        debug_assert_eq!(column_values.len(), self.nr_columns());

        self.offset + self.costs.iter().zip(column_values).map(|(c, x)| c * x).sum::<f64>()
    }

    /// Row activities `A x`.
    pub fn row_activities(&self, column_values: &[f64]) -> Vec<f64> {
        let mut activities = vec![0_f64; self.nr_rows()];
        for (j, &x) in column_values.iter().enumerate() {
            if x != 0_f64 {
                for (i, value) in self.columns.column_iter(j) {
                    activities[i] += value * x;
                }
            }
        }
        activities
    }
}

/// Collects the parts of a `LinearProgram` before validation.
#[derive(Clone, Debug)]
pub struct LinearProgramBuilder {
    nr_rows: usize,
    nr_columns: usize,
    sense: ObjectiveSense,
    offset: f64,
    costs: Vec<f64>,
    column_lower: Vec<f64>,
    column_upper: Vec<f64>,
    row_lower: Vec<f64>,
    row_upper: Vec<f64>,
    start: Vec<usize>,
    index: Vec<usize>,
    value: Vec<f64>,
    infinity: f64,
}

impl LinearProgramBuilder {
    #[allow(missing_docs)]
    pub fn sense(mut self, sense: ObjectiveSense) -> Self {
        self.sense = sense;
        self
    }

    #[allow(missing_docs)]
    pub fn offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    #[allow(missing_docs)]
    pub fn costs(mut self, costs: Vec<f64>) -> Self {
        self.costs = costs;
        self
    }

    #[allow(missing_docs)]
    pub fn column_bounds(mut self, lower: Vec<f64>, upper: Vec<f64>) -> Self {
        self.column_lower = lower;
        self.column_upper = upper;
        self
    }

    #[allow(missing_docs)]
    pub fn row_bounds(mut self, lower: Vec<f64>, upper: Vec<f64>) -> Self {
        self.row_lower = lower;
        self.row_upper = upper;
        self
    }

    /// The matrix in compressed column form.
    pub fn matrix(mut self, start: Vec<usize>, index: Vec<usize>, value: Vec<f64>) -> Self {
        self.start = start;
        self.index = index;
        self.value = value;
        self
    }

    /// The matrix as dense rows, zeros are dropped.
    ///
    /// Rows of the wrong length are caught by `build`.
    pub fn dense_matrix(mut self, rows: &[Vec<f64>]) -> Self {
        let mut start = Vec::with_capacity(self.nr_columns + 1);
        let mut index = Vec::new();
        let mut value = Vec::new();
        start.push(0);
        for j in 0..self.nr_columns {
            for (i, row) in rows.iter().enumerate() {
                if let Some(&v) = row.get(j) {
                    if v != 0_f64 {
                        index.push(i);
                        value.push(v);
                    }
                }
            }
            start.push(index.len());
        }
        if rows.len() != self.nr_rows || rows.iter().any(|row| row.len() != self.nr_columns) {
            // Makes `build` report the mismatch
            start.push(index.len());
        }

        self.start = start;
        self.index = index;
        self.value = value;
        self
    }

    /// Magnitude at and beyond which bounds are infinite.
    pub fn infinity(mut self, infinity: f64) -> Self {
        self.infinity = infinity;
        self
    }

    /// Validate the parts and create the program.
    pub fn build(self) -> Result<LinearProgram, InputError> {
        let Self {
            nr_rows, nr_columns, sense, offset, costs,
            column_lower, column_upper, row_lower, row_upper,
            start, index, value, infinity,
        } = self;

        check_length("costs", nr_columns, costs.len())?;
        check_length("column lower bounds", nr_columns, column_lower.len())?;
        check_length("column upper bounds", nr_columns, column_upper.len())?;
        check_length("row lower bounds", nr_rows, row_lower.len())?;
        check_length("row upper bounds", nr_rows, row_upper.len())?;
        check_length("column starts", nr_columns + 1, start.len())?;
        check_length("matrix values", index.len(), value.len())?;
        if start[0] != 0 {
            return Err(InputError::NonMonotoneStarts { column: 0 });
        }
        check_length("matrix indices", start[nr_columns], index.len())?;
        if !offset.is_finite() {
            return Err(InputError::NonFiniteOffset(offset));
        }

        if let Some(j) = (0..nr_columns).find(|&j| start[j + 1] < start[j]) {
            return Err(InputError::NonMonotoneStarts { column: j + 1 });
        }

        let mut seen = HashSet::new();
        for j in 0..nr_columns {
            seen.clear();
            for k in start[j]..start[j + 1] {
                let row = index[k];
                if row >= nr_rows {
                    return Err(InputError::IndexOutOfRange { column: j, row, nr_rows });
                }
                if !seen.insert(row) {
                    return Err(InputError::DuplicateEntry { column: j, row });
                }
                if !value[k].is_finite() {
                    return Err(InputError::NonFiniteValue { row, column: j, value: value[k] });
                }
            }
        }
        for (column, &cost) in costs.iter().enumerate() {
            if !cost.is_finite() {
                return Err(InputError::NonFiniteCost { column, value: cost });
            }
        }

        let (column_lower, column_upper) = normalize_bounds(
            VariableKind::Column, column_lower, column_upper, infinity,
        )?;
        let (row_lower, row_upper) = normalize_bounds(
            VariableKind::Row, row_lower, row_upper, infinity,
        )?;

        // Explicit zeros carry no information
        let mut columns = vec![Vec::new(); nr_columns];
        for j in 0..nr_columns {
            for k in start[j]..start[j + 1] {
                if value[k] != 0_f64 {
                    columns[j].push((index[k], value[k]));
                }
            }
            columns[j].sort_unstable_by_key(|&(i, _)| i);
        }
        let columns = ColumnMajor::from_columns(nr_rows, columns);
        let rows = columns.transpose();

        Ok(LinearProgram {
            sense, offset, costs,
            column_lower, column_upper, row_lower, row_upper,
            columns, rows,
        })
    }
}

fn check_length(what: &'static str, expected: usize, found: usize) -> Result<(), InputError> {
    if expected == found {
        Ok(())
    } else {
        Err(InputError::DimensionMismatch { what, expected, found })
    }
}

fn normalize_bounds(
    kind: VariableKind,
    mut lower: Vec<f64>,
    mut upper: Vec<f64>,
    infinity: f64,
) -> Result<(Vec<f64>, Vec<f64>), InputError> {
    for (index, (l, u)) in lower.iter_mut().zip(upper.iter_mut()).enumerate() {
        if l.is_nan() || u.is_nan() {
            return Err(InputError::InvalidBound { kind, index, lower: *l, upper: *u });
        }
        *l = normalize_infinity(*l, infinity);
        *u = normalize_infinity(*u, infinity);
        if *l == f64::INFINITY || *u == f64::NEG_INFINITY {
            return Err(InputError::InvalidBound { kind, index, lower: *l, upper: *u });
        }
        if *l > *u {
            return Err(InputError::NonMonotoneBounds { kind, index, lower: *l, upper: *u });
        }
    }

    Ok((lower, upper))
}
