//! # Statistics
//!
//! Counters collected during a solve, reported with the solution.
use std::time::Duration;

use enum_map::{Enum, EnumMap};

/// Numerical difficulty that was detected and recovered from.
#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum NumericalEvent {
    /// The basis matrix was singular, dependent columns were replaced by logicals.
    SingularBasis,
    /// A Forrest & Tomlin update was rejected.
    UpdateSingular,
    /// The factorization did not reproduce the basis matrix accurately enough.
    ResidualTooLarge,
    /// The pivot element from the column and from the row disagreed.
    PivotMismatch,
    /// Reduced costs recomputed after a refactorization were dual infeasible.
    DualInfeasibilityAfterRebuild,
    /// A variable entered the basis suspiciously often.
    CycleDetected,
    /// The relative pivot threshold of the LU was raised.
    PivotThresholdEscalation,
    /// A certificate of infeasibility did not pass verification.
    UnboundedRayRejected,
}

/// Counters of a solve.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Statistics {
    /// Total number of basis changes.
    pub iterations: usize,
    /// Basis changes while searching for a dual feasible basis.
    pub phase_one_iterations: usize,
    /// Bound flips performed by the ratio test.
    pub bound_flips: usize,
    /// Number of fresh factorizations, including the first.
    pub refactorizations: usize,
    /// Work in the triangular solves, in entries touched.
    pub synthetic_ticks: f64,
    /// `(nnz(L) + nnz(U)) / nnz(B)` of each fresh factorization.
    pub fill_factors: Vec<f64>,
    /// How often each kind of numerical difficulty occurred.
    pub numerical_events: EnumMap<NumericalEvent, usize>,
    /// Objective of the working problem after each iteration, if requested.
    pub objective_trace: Vec<f64>,
    /// Largest `‖B x_B + N x_N‖∞ / (1 + ‖N x_N‖∞)` observed after a refactorization.
    pub max_primal_residual: f64,
    /// Largest `‖B^T π - c_B‖∞ / (1 + ‖c_B‖∞)` observed after a refactorization.
    pub max_dual_residual: f64,
    /// Wall clock time of the solve.
    pub solve_time: Duration,
}

impl Statistics {
    /// Register an event.
    pub fn count(&mut self, event: NumericalEvent) {
        self.numerical_events[event] += 1;
    }

    /// How often an event occurred.
    pub fn event_count(&self, event: NumericalEvent) -> usize {
        self.numerical_events[event]
    }
}
