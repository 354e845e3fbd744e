//! # Representation of solutions
//!
//! Once the engine terminates, the final iterate is mapped back to the caller's problem: values
//! and duals in the caller's objective sense, the basis for a warm start and, if the problem was
//! shown to be infeasible or unbounded, a certificate.
use crate::algorithm::SolveStatus;
use crate::algorithm::dual_simplex::statistics::Statistics;
use crate::data::linear_program::elements::{VariableKind, VariableStatus};
use crate::data::linear_program::error::InputError;
use crate::data::linear_program::standard_form::LinearProgram;

/// Status of every column and every row.
///
/// Exactly `m` entries should be `Basic`. Row statuses describe the row activity, `AtLower`
/// meaning the activity sits at the row's lower side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Basis {
    columns: Vec<VariableStatus>,
    rows: Vec<VariableStatus>,
}

impl Basis {
    /// Create a basis from column and row statuses.
    pub fn new(columns: Vec<VariableStatus>, rows: Vec<VariableStatus>) -> Self {
        Self { columns, rows }
    }

    /// The basis of all logical variables, columns at their natural bound.
    pub fn slack(lp: &LinearProgram) -> Self {
        let columns = lp.column_lower().iter().zip(lp.column_upper())
            .map(|(&lower, &upper)| VariableStatus::nonbasic_for_bounds(lower, upper))
            .collect();

        Self { columns, rows: vec![VariableStatus::Basic; lp.nr_rows()] }
    }

    #[allow(missing_docs)]
    pub fn columns(&self) -> &[VariableStatus] {
        &self.columns
    }

    #[allow(missing_docs)]
    pub fn rows(&self) -> &[VariableStatus] {
        &self.rows
    }

    /// Number of basic variables, columns and rows together.
    pub fn nr_basic(&self) -> usize {
        self.columns.iter().chain(&self.rows).filter(|status| status.is_basic()).count()
    }

    /// Whether the basis has the dimensions of a problem with these sizes.
    pub fn is_right_size(&self, nr_columns: usize, nr_rows: usize) -> bool {
        self.columns.len() == nr_columns && self.rows.len() == nr_rows
    }

    /// Check that the basis can be used to start solving `lp`.
    pub fn validate(&self, lp: &LinearProgram) -> Result<(), InputError> {
        if self.columns.len() != lp.nr_columns() {
            return Err(InputError::BasisSize { expected: lp.nr_columns(), found: self.columns.len() });
        }
        if self.rows.len() != lp.nr_rows() {
            return Err(InputError::BasisSize { expected: lp.nr_rows(), found: self.rows.len() });
        }
        let nr_basic = self.nr_basic();
        if nr_basic != lp.nr_rows() {
            return Err(InputError::BasisCount { expected: lp.nr_rows(), found: nr_basic });
        }

        let column_bounds = lp.column_lower().iter().zip(lp.column_upper());
        for (index, (&status, (&lower, &upper))) in self.columns.iter().zip(column_bounds).enumerate() {
            if !status.is_compatible_with(lower, upper) {
                return Err(InputError::BasisStatus { kind: VariableKind::Column, index, status, lower, upper });
            }
        }
        let row_bounds = lp.row_lower().iter().zip(lp.row_upper());
        for (index, (&status, (&lower, &upper))) in self.rows.iter().zip(row_bounds).enumerate() {
            if !status.is_compatible_with(lower, upper) {
                return Err(InputError::BasisStatus { kind: VariableKind::Row, index, status, lower, upper });
            }
        }

        Ok(())
    }

    /// Extend the basis after columns with the given bounds were added to the problem.
    ///
    /// The new columns become nonbasic at their natural bound, so the basis stays square.
    pub fn append_nonbasic_columns(&mut self, lower: &[f64], upper: &[f64]) {
        debug_assert_eq!(lower.len(), upper.len());

        self.columns.extend(lower.iter().zip(upper)
            .map(|(&lower, &upper)| VariableStatus::nonbasic_for_bounds(lower, upper)));
    }

    /// Extend the basis after `count` rows were added to the problem.
    ///
    /// The logical variables of the new rows become basic, so the basis stays square.
    pub fn append_basic_rows(&mut self, count: usize) {
        self.rows.extend((0..count).map(|_| VariableStatus::Basic));
    }
}

/// Count, largest and total violation of a set of conditions.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Infeasibilities {
    /// Number of violations above the tolerance.
    pub count: usize,
    /// Largest violation.
    pub max: f64,
    /// Sum of the violations above the tolerance.
    pub sum: f64,
}

impl Infeasibilities {
    /// Register a violation, ignoring it when it is within `tolerance`.
    pub fn register(&mut self, violation: f64, tolerance: f64) {
        if violation > tolerance {
            self.count += 1;
            self.sum += violation;
        }
        self.max = self.max.max(violation);
    }
}

/// Infeasibilities of the final point with respect to the original problem.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct InfeasibilitySummary {
    /// Bound violations of columns and rows.
    pub primal: Infeasibilities,
    /// Reduced costs with the wrong sign for the status.
    pub dual: Infeasibilities,
}

/// Result of a solve.
///
/// Values are always present and describe the last consistent iterate. For statuses other than
/// `Optimal` they need not be feasible.
#[derive(Clone, Debug, PartialEq)]
pub struct Solution {
    pub(crate) status: SolveStatus,
    pub(crate) objective_value: f64,
    pub(crate) column_values: Vec<f64>,
    pub(crate) row_values: Vec<f64>,
    pub(crate) column_duals: Vec<f64>,
    pub(crate) row_duals: Vec<f64>,
    pub(crate) basis: Basis,
    pub(crate) basic_index: Vec<usize>,
    pub(crate) dual_ray: Option<Vec<f64>>,
    pub(crate) primal_ray: Option<Vec<f64>>,
    pub(crate) infeasibilities: InfeasibilitySummary,
    pub(crate) statistics: Statistics,
}

impl Solution {
    /// How the solve terminated.
    pub fn status(&self) -> SolveStatus {
        self.status
    }

    /// Objective value including the offset, computed from the column values.
    pub fn objective_value(&self) -> f64 {
        self.objective_value
    }

    #[allow(missing_docs)]
    pub fn column_values(&self) -> &[f64] {
        &self.column_values
    }

    /// Row activities `A x`.
    pub fn row_values(&self) -> &[f64] {
        &self.row_values
    }

    /// Reduced costs of the columns, zero for basic columns.
    pub fn column_duals(&self) -> &[f64] {
        &self.column_duals
    }

    /// Dual multipliers `y` of the rows, such that the column duals are `c - A^T y`.
    pub fn row_duals(&self) -> &[f64] {
        &self.row_duals
    }

    /// Final basis, usable for a warm start.
    pub fn basis(&self) -> &Basis {
        &self.basis
    }

    /// Which variable occupies each basic position.
    ///
    /// Columns are `0..n`, the logical variable of row `i` is `n + i`.
    pub fn basic_index(&self) -> &[usize] {
        &self.basic_index
    }

    /// Certificate of primal infeasibility.
    ///
    /// A vector `y` over the rows such that the supremum of `y^T A x` over the column bounds is
    /// smaller than the infimum of `y^T r` over the row bounds, so no `x` satisfies both.
    pub fn dual_ray(&self) -> Option<&[f64]> {
        self.dual_ray.as_deref()
    }

    /// Certificate of unboundedness.
    ///
    /// A direction `d` over the columns that is a recession direction of the column and row
    /// bounds, along which the objective improves.
    pub fn primal_ray(&self) -> Option<&[f64]> {
        self.primal_ray.as_deref()
    }

    /// Violations of the final point on the original, unperturbed problem.
    pub fn infeasibilities(&self) -> &InfeasibilitySummary {
        &self.infeasibilities
    }

    /// Counters collected during the solve.
    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }
}

#[cfg(test)]
mod test {
    use crate::data::linear_program::elements::VariableStatus;
    use crate::data::linear_program::error::InputError;
    use crate::data::linear_program::solution::{Basis, Infeasibilities};
    use crate::data::linear_program::standard_form::LinearProgram;

    fn lp() -> LinearProgram {
        LinearProgram::builder(2, 2)
            .dense_matrix(&[vec![1_f64, 1_f64], vec![1_f64, -1_f64]])
            .column_bounds(vec![0_f64, f64::NEG_INFINITY], vec![1_f64, f64::INFINITY])
            .row_bounds(vec![1_f64, f64::NEG_INFINITY], vec![1_f64, 0_f64])
            .build()
            .unwrap()
    }

    #[test]
    fn slack() {
        let basis = Basis::slack(&lp());
        assert_eq!(basis.columns(), &[VariableStatus::AtLower, VariableStatus::Free]);
        assert_eq!(basis.nr_basic(), 2);
        assert!(basis.is_right_size(2, 2));
        assert_eq!(basis.validate(&lp()), Ok(()));
    }

    #[test]
    fn invalid() {
        let basis = Basis::new(vec![VariableStatus::Basic; 2], vec![VariableStatus::Basic; 2]);
        assert_eq!(basis.validate(&lp()), Err(InputError::BasisCount { expected: 2, found: 4 }));

        let basis = Basis::new(
            vec![VariableStatus::AtUpper, VariableStatus::AtUpper],
            vec![VariableStatus::Basic; 2],
        );
        assert!(matches!(basis.validate(&lp()), Err(InputError::BasisStatus { index: 1, .. })));
    }

    #[test]
    fn append() {
        let mut basis = Basis::slack(&lp());
        basis.append_nonbasic_columns(&[f64::NEG_INFINITY], &[3_f64]);
        basis.append_basic_rows(1);
        assert!(basis.is_right_size(3, 3));
        assert_eq!(basis.columns()[2], VariableStatus::AtUpper);
        assert_eq!(basis.nr_basic(), 3);
    }

    #[test]
    fn register() {
        let mut infeasibilities = Infeasibilities::default();
        infeasibilities.register(1e-9, 1e-7);
        infeasibilities.register(0.5, 1e-7);
        assert_eq!(infeasibilities.count, 1);
        assert_eq!(infeasibilities.max, 0.5);
        assert_eq!(infeasibilities.sum, 0.5);
    }
}
