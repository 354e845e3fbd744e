//! # The dual simplex method
//!
//! The problem is solved in the bounded form `[A I] x = 0`, where the variable `n + i` is the
//! logical variable of row `i`. Its bounds are the negated row bounds, such that the row activity
//! is `-x_{n + i}`. Costs are normalized to minimization.
//!
//! The driver moves through a few states. Starting from the initial basis it tries to reach dual
//! feasibility by flipping boxed variables and shifting tiny cost errors. If that doesn't suffice,
//! dual phase one solves an auxiliary problem over the cone of recession directions. Phase two
//! then iterates until the basis is primal feasible, after which the cost perturbation and bound
//! shifts are removed and the result is checked again.
use std::iter;
use std::time::Instant;

use itertools::Either;
use log::info;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::algorithm::SolveStatus;
use crate::algorithm::dual_simplex::cycling::CycleDetector;
use crate::algorithm::dual_simplex::inverse_maintenance::BasisFactor;
use crate::algorithm::dual_simplex::ratio_test::BoundFlippingRatioTest;
use crate::algorithm::dual_simplex::strategy::pivot_rule::EdgeWeights;
use crate::data::linear_algebra::SparseTuple;
use crate::data::linear_algebra::vector::IndexedVector;
use crate::data::linear_program::{Basis, BoundType, Infeasibilities, InfeasibilitySummary, LinearProgram, Solution, VariableStatus};

pub use parameters::{ParameterError, Parameters, PricingRule};
pub use statistics::{NumericalEvent, Statistics};

pub mod certificate;
pub mod cycling;
pub mod inverse_maintenance;
mod iteration;
pub mod parameters;
mod perturbation;
mod phase_one;
pub mod ratio_test;
mod rebuild;
pub mod statistics;
pub mod strategy;


/// Consecutive recoveries without a successful pivot before giving up.
const MAX_TROUBLE: usize = 10;
/// Rounds of removing perturbations and shifts before accepting the result as it is.
const MAX_CLEANUP_ROUNDS: usize = 4;
/// Initial dual infeasibilities up to this multiple of the tolerance are removed by shifting costs.
const INITIAL_SHIFT_FACTOR: f64 = 100_f64;

/// Which objective the working costs describe.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Phase {
    /// Bounds are replaced by the auxiliary bounds of dual phase one.
    One,
    /// Bounds are those of the problem, possibly shifted.
    Two,
}

/// Position of the driver in its state machine.
#[derive(Debug)]
enum State {
    Start,
    PhaseOne,
    PhaseTwo,
    Cleanup,
    FeasibilityCheck,
    Done(SolveStatus),
}

/// How a run of simplex iterations ended.
#[derive(Debug)]
enum PhaseOutcome {
    /// The basis is primal and dual feasible for the working problem.
    Optimal,
    /// The ratio test found no entering variable, the row multipliers of the dual ray are given.
    Infeasible(Vec<f64>),
}

/// Result of removing perturbations and shifts.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum CleanupOutcome {
    Optimal,
    PrimalInfeasible,
    DualInfeasible,
}

/// Dual simplex solver for a single problem.
///
/// Owns all working data of a solve: values, reduced costs, the basis factorization, edge weights
/// and scratch vectors.
pub struct Driver<'a> {
    lp: &'a LinearProgram,
    parameters: &'a Parameters,
    /// Number of rows.
    m: usize,
    /// Number of structural columns.
    n: usize,

    /// Costs in minimization sense, per variable.
    original_cost: Vec<f64>,
    original_lower: Vec<f64>,
    original_upper: Vec<f64>,
    /// Working costs, might be perturbed or shifted.
    cost: Vec<f64>,
    /// Working bounds, replaced in phase one and shifted against stalling.
    lower: Vec<f64>,
    upper: Vec<f64>,
    /// Variables with shifted bounds, with their bounds before the shift.
    shifted: Vec<(usize, f64, f64)>,
    phase: Phase,

    status: Vec<VariableStatus>,
    /// Variable in each basis position.
    basic_index: Vec<usize>,
    value: Vec<f64>,
    reduced_cost: Vec<f64>,
    /// Simplex multipliers `π`, one per row.
    multipliers: Vec<f64>,
    /// Per basis position, the primal infeasibility `δ` of the basic variable.
    infeasibilities: Vec<f64>,

    factor: BasisFactor,
    /// Whether `factor` describes the current basis.
    factor_valid: bool,
    edge_weights: EdgeWeights,
    cycle_detector: CycleDetector,
    rng: ChaCha8Rng,
    perturbed: bool,
    trouble: usize,

    dual_ray: Option<Vec<f64>>,
    primal_ray: Option<Vec<f64>>,
    statistics: Statistics,
    start: Instant,

    /// `ρ_p`, row `p` of the basis inverse.
    row_ep: IndexedVector<f64>,
    /// `α_r`, the pivot row restricted to the structural columns.
    row_ap: IndexedVector<f64>,
    /// `α_q`, the transformed entering column.
    column_aq: IndexedVector<f64>,
    /// `B^-1 ρ_p` for the steepest edge update.
    tau: IndexedVector<f64>,
    work: IndexedVector<f64>,
    ratio_test: BoundFlippingRatioTest,
}

impl<'a> Driver<'a> {
    /// Set up a solve.
    ///
    /// # Arguments
    ///
    /// * `lp`: Problem to solve.
    /// * `basis`: Starting basis, should have passed `Basis::validate`.
    /// * `parameters`: Should have passed `Parameters::validate`.
    pub fn new(lp: &'a LinearProgram, basis: &Basis, parameters: &'a Parameters) -> Self {
        debug_assert!(basis.validate(lp).is_ok());
        debug_assert!(parameters.validate().is_ok());

        let m = lp.nr_rows();
        let n = lp.nr_columns();
        let sign = lp.sense().sign();

        let original_cost = lp.costs().iter().map(|&c| sign * c)
            .chain(iter::repeat_n(0_f64, m))
            .collect::<Vec<_>>();
        let original_lower = lp.column_lower().iter().copied()
            .chain(lp.row_upper().iter().map(|&upper| -upper))
            .collect::<Vec<_>>();
        let original_upper = lp.column_upper().iter().copied()
            .chain(lp.row_lower().iter().map(|&lower| -lower))
            .collect::<Vec<_>>();

        let status = basis.columns().iter().copied()
            .chain(basis.rows().iter().map(|status| status.mirrored()))
            .collect::<Vec<_>>();
        let basic_index = (0..n + m).filter(|&j| status[j].is_basic()).collect::<Vec<_>>();
        let value = (0..n + m)
            .map(|j| nonbasic_value(status[j], original_lower[j], original_upper[j]))
            .collect();

        let density = parameters.density_threshold;
        Self {
            lp,
            parameters,
            m,
            n,

            cost: original_cost.clone(),
            lower: original_lower.clone(),
            upper: original_upper.clone(),
            original_cost,
            original_lower,
            original_upper,
            shifted: Vec::new(),
            phase: Phase::Two,

            status,
            basic_index,
            value,
            reduced_cost: vec![0_f64; n + m],
            multipliers: vec![0_f64; m],
            infeasibilities: vec![0_f64; m],

            factor: BasisFactor::new(m, parameters.factor_parameters()),
            factor_valid: false,
            edge_weights: EdgeWeights::new(parameters.pricing_rule, m),
            cycle_detector: CycleDetector::new(parameters.cycle_window, parameters.cycle_threshold),
            rng: ChaCha8Rng::seed_from_u64(parameters.random_seed),
            perturbed: false,
            trouble: 0,

            dual_ray: None,
            primal_ray: None,
            statistics: Statistics::default(),
            start: Instant::now(),

            row_ep: IndexedVector::with_density_threshold(m, density),
            row_ap: IndexedVector::with_density_threshold(n, density),
            column_aq: IndexedVector::with_density_threshold(m, density),
            tau: IndexedVector::with_density_threshold(m, density),
            work: IndexedVector::with_density_threshold(m, density),
            ratio_test: BoundFlippingRatioTest::default(),
        }
    }

    /// Solve the problem and report the final iterate.
    pub fn solve(mut self) -> Solution {
        info!(
            "solving {} rows and {} columns ({} nonzeros) with {:?} pricing",
            self.m, self.n, self.lp.columns().nnz(), self.parameters.pricing_rule,
        );

        let status = self.run();
        self.finish(status);

        info!(
            "{} after {} iterations ({} in phase one), objective {}",
            status, self.statistics.iterations, self.statistics.phase_one_iterations,
            self.lp.objective_value(&self.value[..self.n]),
        );

        self.into_solution(status)
    }

    /// Run the state machine until a terminal status is reached.
    fn run(&mut self) -> SolveStatus {
        if let Err(status) = self.initialize() {
            return status;
        }

        let mut state = State::Start;
        let mut cleanup_rounds = 0;
        loop {
            state = match state {
                State::Start => {
                    if self.make_dual_feasible() {
                        State::PhaseTwo
                    } else {
                        State::PhaseOne
                    }
                },
                State::PhaseOne => match self.phase_one() {
                    Ok(true) => State::PhaseTwo,
                    Ok(false) => State::FeasibilityCheck,
                    Err(status) => State::Done(status),
                },
                State::PhaseTwo => {
                    if self.parameters.perturbation && !self.perturbed {
                        self.perturb_costs();
                    }
                    info!("dual phase two");
                    match self.run_phase() {
                        Ok(PhaseOutcome::Optimal) => State::Cleanup,
                        Ok(PhaseOutcome::Infeasible(ray)) => {
                            if self.accept_dual_ray(ray) {
                                State::Done(SolveStatus::PrimalInfeasible)
                            } else {
                                match self.recover_from_rejected_ray() {
                                    Ok(()) => State::PhaseTwo,
                                    Err(status) => State::Done(status),
                                }
                            }
                        },
                        Err(status) => State::Done(status),
                    }
                },
                State::Cleanup => {
                    cleanup_rounds += 1;
                    match self.cleanup(cleanup_rounds > MAX_CLEANUP_ROUNDS) {
                        Ok(CleanupOutcome::Optimal) => State::Done(SolveStatus::Optimal),
                        Ok(CleanupOutcome::PrimalInfeasible) => State::PhaseTwo,
                        Ok(CleanupOutcome::DualInfeasible) => State::PhaseOne,
                        Err(status) => State::Done(status),
                    }
                },
                State::FeasibilityCheck => match self.check_primal_feasibility() {
                    Ok(true) => State::Done(SolveStatus::DualInfeasible),
                    Ok(false) => {
                        self.primal_ray = None;
                        State::Done(SolveStatus::PrimalInfeasible)
                    },
                    Err(status) => State::Done(status),
                },
                State::Done(status) => return status,
            };
        }
    }

    /// Factor the initial basis and compute all derived quantities.
    fn initialize(&mut self) -> Result<(), SolveStatus> {
        self.rebuild()?;
        if self.edge_weights.wants_exact_weights() && self.basic_index.iter().any(|&j| j < self.n) {
            self.compute_exact_weights();
        }

        Ok(())
    }

    /// Try to make the initial basis dual feasible without phase one.
    ///
    /// Boxed variables with a reduced cost of the wrong sign move to their other bound, small
    /// errors on the other variables are removed by shifting their cost.
    ///
    /// # Return value
    ///
    /// Whether the basis is now dual feasible.
    fn make_dual_feasible(&mut self) -> bool {
        let tolerance = self.parameters.dual_feasibility_tolerance;
        let needs_phase_one = (0..self.n + self.m)
            .filter(|&j| !BoundType::from_bounds(self.lower[j], self.upper[j]).is_boxed())
            .any(|j| dual_infeasibility(self.status[j], self.reduced_cost[j]) > INITIAL_SHIFT_FACTOR * tolerance);
        if needs_phase_one {
            return false;
        }

        self.correct_dual_infeasibilities();
        true
    }

    /// Remove the cost perturbation and bound shifts and decide whether the result is final.
    ///
    /// # Arguments
    ///
    /// * `last_round`: Accept the result when the remaining infeasibilities are small.
    fn cleanup(&mut self, last_round: bool) -> Result<CleanupOutcome, SolveStatus> {
        let shifts_removed = self.remove_bound_shifts();
        self.restore_costs();
        if shifts_removed {
            self.recompute_primal();
        }
        self.recompute_dual();

        let dual_tolerance = self.parameters.dual_feasibility_tolerance;
        let mut flipped = false;
        let mut dual_infeasible = false;
        for j in 0..self.n + self.m {
            if dual_infeasibility(self.status[j], self.reduced_cost[j]) <= dual_tolerance {
                continue;
            }
            if BoundType::from_bounds(self.lower[j], self.upper[j]).is_boxed() {
                self.flip(j);
                flipped = true;
            } else {
                dual_infeasible = true;
            }
        }
        if flipped {
            self.recompute_primal();
        }
        self.compute_infeasibilities();
        let primal_infeasible = self.infeasibilities.iter().any(|&delta| delta != 0_f64);

        if !dual_infeasible && !primal_infeasible {
            return Ok(CleanupOutcome::Optimal);
        }

        if last_round {
            let summary = self.infeasibility_summary();
            let acceptable = summary.primal.max <= 10_f64 * self.parameters.primal_feasibility_tolerance
                && summary.dual.max <= 10_f64 * dual_tolerance;
            return if acceptable {
                info!("accepting slightly infeasible result after cleanup");
                Ok(CleanupOutcome::Optimal)
            } else {
                Err(SolveStatus::NumericalError)
            };
        }

        if dual_infeasible {
            info!("dual infeasible after removing the perturbation");
            Ok(CleanupOutcome::DualInfeasible)
        } else {
            info!("primal infeasible after removing the perturbation");
            Ok(CleanupOutcome::PrimalInfeasible)
        }
    }

    /// Bring the iterate back to the original problem after termination.
    fn finish(&mut self, status: SolveStatus) {
        if self.phase == Phase::One {
            self.restore_original_bounds();
            if self.factor_valid {
                self.recompute_primal();
            }
        }
        if self.remove_bound_shifts() && self.factor_valid {
            self.recompute_primal();
        }
        self.restore_costs();
        if self.factor_valid {
            self.recompute_dual();
        }
        if status == SolveStatus::Optimal {
            debug_assert!(self.check_invariants(None).is_ok());
        }

        self.statistics.solve_time = self.start.elapsed();
    }

    fn into_solution(self, status: SolveStatus) -> Solution {
        let sign = self.lp.sense().sign();
        let infeasibilities = self.infeasibility_summary();

        let column_values = self.value[..self.n].to_vec();
        let row_values = self.value[self.n..].iter().map(|&value| -value).collect();
        let column_duals = self.reduced_cost[..self.n].iter().map(|&d| sign * d).collect();
        let row_duals = self.multipliers.iter().map(|&y| sign * y).collect();
        let basis = Basis::new(
            self.status[..self.n].to_vec(),
            self.status[self.n..].iter().map(|status| status.mirrored()).collect(),
        );

        Solution {
            status,
            objective_value: self.lp.objective_value(&column_values),
            column_values,
            row_values,
            column_duals,
            row_duals,
            basis,
            basic_index: self.basic_index,
            dual_ray: self.dual_ray,
            primal_ray: self.primal_ray,
            infeasibilities,
            statistics: self.statistics,
        }
    }

    /// Violations of the original bounds and reduced costs of the wrong sign.
    fn infeasibility_summary(&self) -> InfeasibilitySummary {
        let mut primal = Infeasibilities::default();
        let mut dual = Infeasibilities::default();
        for j in 0..self.n + self.m {
            let x = self.value[j];
            let violation = (self.original_lower[j] - x).max(x - self.original_upper[j]).max(0_f64);
            primal.register(violation, self.parameters.primal_feasibility_tolerance);
            dual.register(
                dual_infeasibility(self.status[j], self.reduced_cost[j]),
                self.parameters.dual_feasibility_tolerance,
            );
        }

        InfeasibilitySummary { primal, dual }
    }

    /// Stop at the iteration boundary when the caller asked for it or time ran out.
    fn check_limits(&self) -> Result<(), SolveStatus> {
        if let Some(flag) = &self.parameters.interrupt {
            if flag.load(std::sync::atomic::Ordering::Relaxed) {
                return Err(SolveStatus::UserInterrupt);
            }
        }
        if let Some(limit) = self.parameters.time_limit {
            if self.start.elapsed() >= limit {
                return Err(SolveStatus::TimeLimit);
            }
        }

        Ok(())
    }

    /// Verify the consistency of the working data.
    ///
    /// # Arguments
    ///
    /// * `dual_tolerance`: If given, also check the sign of the reduced costs.
    ///
    /// # Return value
    ///
    /// A description of the first violation found.
    pub fn check_invariants(&self, dual_tolerance: Option<f64>) -> Result<(), String> {
        if self.basic_index.len() != self.m {
            return Err(format!("{} basic variables for {} rows", self.basic_index.len(), self.m));
        }
        let mut seen = vec![false; self.n + self.m];
        for (position, &j) in self.basic_index.iter().enumerate() {
            if j >= self.n + self.m || seen[j] {
                return Err(format!("variable {} at position {} is out of range or repeated", j, position));
            }
            seen[j] = true;
            if !self.status[j].is_basic() {
                return Err(format!("variable {} at position {} has status {:?}", j, position, self.status[j]));
            }
        }

        for j in 0..self.n + self.m {
            let status = self.status[j];
            if status.is_basic() {
                if !seen[j] {
                    return Err(format!("basic variable {} has no basis position", j));
                }
                continue;
            }
            if !status.is_compatible_with(self.lower[j], self.upper[j]) {
                return Err(format!("status {:?} of variable {} does not fit its bounds", status, j));
            }
            let expected = nonbasic_value(status, self.lower[j], self.upper[j]);
            if self.value[j].to_bits() != expected.to_bits() && !(expected == 0_f64 && self.value[j] == 0_f64) {
                return Err(format!("nonbasic variable {} has value {} instead of {}", j, self.value[j], expected));
            }
            if let Some(tolerance) = dual_tolerance {
                if dual_infeasibility(status, self.reduced_cost[j]) > tolerance {
                    return Err(format!("variable {} at {:?} has reduced cost {}", j, status, self.reduced_cost[j]));
                }
            }
        }

        if let Some(weights) = self.edge_weights.weights() {
            if let Some((position, weight)) = weights.iter().enumerate().find(|&(_, &w)| w < 1_f64 - 1e-10) {
                return Err(format!("edge weight {} at position {}", weight, position));
            }
        }

        Ok(())
    }
}

/// Column of variable `j` in `[A I]`.
fn variable_column(lp: &LinearProgram, j: usize) -> impl Iterator<Item = SparseTuple<f64>> + '_ {
    let n = lp.nr_columns();
    if j < n {
        Either::Left(lp.columns().column_iter(j))
    } else {
        Either::Right(iter::once((j - n, 1_f64)))
    }
}

/// Value of a nonbasic variable with this status.
fn nonbasic_value(status: VariableStatus, lower: f64, upper: f64) -> f64 {
    match status {
        VariableStatus::AtLower | VariableStatus::Fixed => lower,
        VariableStatus::AtUpper => upper,
        VariableStatus::Free | VariableStatus::Basic => 0_f64,
    }
}

/// By how much a reduced cost has the wrong sign for the status.
fn dual_infeasibility(status: VariableStatus, reduced_cost: f64) -> f64 {
    match status {
        VariableStatus::AtLower => (-reduced_cost).max(0_f64),
        VariableStatus::AtUpper => reduced_cost.max(0_f64),
        VariableStatus::Free => reduced_cost.abs(),
        VariableStatus::Fixed | VariableStatus::Basic => 0_f64,
    }
}
