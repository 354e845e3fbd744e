//! # Maintaining a factorization of the basis matrix
//!
//! The simplex iterations need to solve with the basis matrix `B` and its transpose. The matrix is
//! factored as `LU` and kept up to date with Forrest & Tomlin updates. The factorization is rebuilt
//! from scratch once the updates are too many or have caused too much fill.
use log::{debug, trace};
use thiserror::Error;

use crate::algorithm::dual_simplex::inverse_maintenance::lower_upper::LUDecomposition;
use crate::algorithm::dual_simplex::inverse_maintenance::lower_upper::decomposition::{Dependencies, FactorReport, FactorSettings};
use crate::data::linear_algebra::SparseTuple;
use crate::data::linear_algebra::vector::IndexedVector;

pub mod lower_upper;

/// Element growth in `U` above which the pivot threshold is raised.
const GROWTH_LIMIT: f64 = 1e12;
/// Solve work since the last factorization, as a multiple of the factoring work, that triggers a
/// rebuild.
const TICK_BUDGET: f64 = 10_f64;
/// Updates before the solve work is compared with the factoring work.
const MIN_TICK_UPDATES: usize = 20;

/// Failure to factor a basis matrix.
#[derive(Error, Clone, Debug, PartialEq)]
pub enum FactorError {
    /// The matrix is (numerically) singular.
    #[error("basis matrix is singular, {} columns are dependent", .0.pairs.len())]
    SingularBasis(Dependencies),
    /// Element growth was excessive. The pivot threshold has been raised, factor again.
    #[error("element growth of {growth:e} in the factor, pivot threshold raised to {threshold}")]
    PivotToleranceViolation {
        /// Largest magnitude in `U` relative to the largest magnitude in `B`.
        growth: f64,
        /// New relative pivot threshold.
        threshold: f64,
    },
    /// Allocating the factor failed.
    #[error("out of memory while factoring the basis matrix")]
    OutOfMemory,
}

/// Failure to update the factorization after a basis change.
///
/// The factorization is unchanged and should be rebuilt for the new basis.
#[derive(Error, Copy, Clone, Debug, PartialEq)]
pub enum UpdateError {
    /// The new diagonal element is too small.
    #[error("update would create a diagonal element of {diagonal:e}")]
    Singular {
        /// Value of the new diagonal element.
        diagonal: f64,
    },
    /// The new diagonal element disagrees with its prediction from the pivot element.
    #[error("update diagonal {diagonal:e} differs from expected {expected:e}")]
    Unstable {
        /// Value of the new diagonal element.
        diagonal: f64,
        /// Old diagonal element times the pivot element.
        expected: f64,
    },
}

/// Reason for rebuilding the factorization.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RefactorReason {
    /// The maximum number of updates was reached.
    UpdateLimit,
    /// The factor grew too much compared to its fresh size.
    FillGrowth,
    /// Solving with the updated factor has cost more than factoring again would.
    TickBudget,
}

/// Settings for the factorization and its updates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FactorParameters {
    /// Initial relative pivot threshold.
    pub pivot_threshold: f64,
    /// Largest relative pivot threshold it may be raised to.
    pub threshold_ceiling: f64,
    /// Absolute pivot tolerance, for factoring and updating.
    pub pivot_tolerance: f64,
    /// Rebuild after this many updates.
    pub max_updates: usize,
    /// Rebuild when the factor has grown beyond this multiple of its fresh size.
    pub max_fill_growth: f64,
}

/// LU factorization of the basis matrix with Forrest & Tomlin updates.
#[derive(Debug)]
pub struct BasisFactor {
    decomposition: LUDecomposition,
    parameters: FactorParameters,
    /// Current relative pivot threshold, can only be raised until the next `reset_threshold`.
    threshold: f64,
    /// Partially transformed column saved by the last `ftran_with_spike`.
    spike: IndexedVector<f64>,
    spike_valid: bool,
    /// Work of the last factorization.
    build_ticks: f64,
    /// Work of the solves since the last factorization.
    solve_ticks: f64,
}

impl BasisFactor {
    /// Create a factorization of the identity matrix of size `m`.
    pub fn new(m: usize, parameters: FactorParameters) -> Self {
        debug_assert!(parameters.pivot_threshold > 0_f64 && parameters.pivot_threshold <= 1_f64);
        debug_assert!(parameters.pivot_threshold <= parameters.threshold_ceiling);
        debug_assert!(parameters.max_updates > 0);

        Self {
            decomposition: LUDecomposition::identity(m),
            parameters,
            threshold: parameters.pivot_threshold,
            spike: IndexedVector::new(m),
            spike_valid: false,
            build_ticks: m as f64,
            solve_ticks: 0_f64,
        }
    }

    /// Dimension of the basis.
    pub fn m(&self) -> usize {
        self.decomposition.m()
    }

    /// Factor a new basis matrix.
    ///
    /// On error, the previous factorization is kept.
    ///
    /// # Arguments
    ///
    /// * `columns`: Basis matrix by basis position, as (row, value) tuples.
    ///
    /// # Return value
    ///
    /// Statistics about the new factorization, or the reason no factorization was made. When
    /// `PivotToleranceViolation` is returned, the pivot threshold was raised and factoring again
    /// may succeed.
    pub fn refactor(&mut self, columns: &[Vec<SparseTuple<f64>>]) -> Result<FactorReport, FactorError> {
        debug_assert_eq!(columns.len(), self.m());

        let settings = FactorSettings {
            pivot_threshold: self.threshold,
            pivot_tolerance: self.parameters.pivot_tolerance,
        };
        let (decomposition, report) = LUDecomposition::decompose(columns, &settings)?;

        if report.growth > GROWTH_LIMIT && self.escalate_threshold() {
            return Err(FactorError::PivotToleranceViolation { growth: report.growth, threshold: self.threshold });
        }

        debug!(
            "factored basis of dimension {}: {} nonzeros in B, {} in LU, growth {:.3e}",
            self.m(), report.basis_nnz, report.factor_nnz, report.growth,
        );
        self.decomposition = decomposition;
        self.spike_valid = false;
        self.build_ticks = report.ticks.max(self.m() as f64);
        self.solve_ticks = 0_f64;

        Ok(report)
    }

    /// Raise the relative pivot threshold for the next factorizations.
    ///
    /// # Return value
    ///
    /// Whether the threshold was raised, which is not possible once it reached the ceiling.
    pub fn escalate_threshold(&mut self) -> bool {
        if self.threshold >= self.parameters.threshold_ceiling {
            return false;
        }
        self.threshold = (2_f64 * self.threshold).min(self.parameters.threshold_ceiling);
        debug!("raised pivot threshold to {}", self.threshold);
        true
    }

    /// Current relative pivot threshold.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Solve `B x = r` in place.
    pub fn ftran(&mut self, rhs: &mut IndexedVector<f64>) {
        let before = rhs.synthetic_tick();
        self.decomposition.ftran(rhs, None);
        self.solve_ticks += rhs.synthetic_tick() - before;
    }

    /// Solve `B x = r` in place for a column that might enter the basis.
    ///
    /// The intermediate result is saved for a following `update`.
    pub fn ftran_with_spike(&mut self, rhs: &mut IndexedVector<f64>) {
        let before = rhs.synthetic_tick();
        self.decomposition.ftran(rhs, Some(&mut self.spike));
        self.solve_ticks += rhs.synthetic_tick() - before;
        self.spike_valid = true;
    }

    /// Solve `B^T x = r` in place.
    pub fn btran(&mut self, rhs: &mut IndexedVector<f64>) {
        let before = rhs.synthetic_tick();
        self.decomposition.btran(rhs);
        self.solve_ticks += rhs.synthetic_tick() - before;
    }

    /// Replace the column at a basis position by the column last solved with `ftran_with_spike`.
    ///
    /// # Arguments
    ///
    /// * `position`: Basis position of the leaving variable.
    /// * `pivot`: Element at `position` of the transformed entering column.
    pub fn update(&mut self, position: usize, pivot: f64) -> Result<(), UpdateError> {
        debug_assert!(self.spike_valid);

        self.spike_valid = false;
        let result = self.decomposition.update(position, &self.spike, pivot, self.parameters.pivot_tolerance);
        if let Err(error) = &result {
            trace!("update at position {} failed: {}", position, error);
        }
        result
    }

    /// Whether the factorization should be rebuilt before the next iteration.
    pub fn should_refactor(&self) -> Option<RefactorReason> {
        if self.decomposition.nr_updates() >= self.parameters.max_updates {
            Some(RefactorReason::UpdateLimit)
        } else if self.decomposition.nnz() as f64 > self.parameters.max_fill_growth * self.decomposition.fresh_nnz() as f64 {
            Some(RefactorReason::FillGrowth)
        } else if self.decomposition.nr_updates() >= MIN_TICK_UPDATES && self.solve_ticks > TICK_BUDGET * self.build_ticks {
            Some(RefactorReason::TickBudget)
        } else {
            None
        }
    }

    /// Number of updates since the last factorization.
    pub fn nr_updates(&self) -> usize {
        self.decomposition.nr_updates()
    }

    /// Relative accuracy of solving with the factorization.
    ///
    /// Solves `B x = B e` where `e` is the all ones vector and measures how far `x` is from `e`.
    ///
    /// # Arguments
    ///
    /// * `columns`: The basis matrix that was factored, by basis position.
    pub fn residual(&mut self, columns: &[Vec<SparseTuple<f64>>]) -> f64 {
        debug_assert_eq!(columns.len(), self.m());

        let mut rhs = IndexedVector::from_tuples(self.m(), columns.iter().flatten().copied());
        self.decomposition.ftran(&mut rhs, None);

        rhs.array().iter()
            .map(|&value| (value - 1_f64).abs())
            .fold(0_f64, f64::max)
    }

}
