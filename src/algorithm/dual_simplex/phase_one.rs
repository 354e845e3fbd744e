//! # Dual phase one
//!
//! Dual feasibility is sought by solving an auxiliary problem with the same matrix and costs, but
//! with bounds that describe the directions of recession of the original bounds:
//!
//! | original bounds | auxiliary bounds |
//! |---|---|
//! | lower only | `[0, 1]` |
//! | upper only | `[-1, 0]` |
//! | free | `[-1000, 1000]` |
//! | both finite | `[0, 0]` |
//!
//! This problem is always feasible and bounded. At its optimum, the reduced costs can be given the
//! signs the original bounds require, unless a direction of recession with negative cost exists.
//! That direction is then a primal ray.
use log::{debug, info};

use crate::algorithm::SolveStatus;
use crate::algorithm::dual_simplex::{Driver, Phase, PhaseOutcome, dual_infeasibility, nonbasic_value};
use crate::algorithm::dual_simplex::certificate::is_primal_ray;
use crate::algorithm::dual_simplex::statistics::NumericalEvent;
use crate::data::linear_program::{BoundType, VariableStatus};

/// Bound used in the auxiliary problem for free variables.
const FREE_BOUND: f64 = 1000_f64;

/// Bounds of a variable in the auxiliary problem.
fn auxiliary_bounds(lower: f64, upper: f64) -> (f64, f64) {
    match BoundType::from_bounds(lower, upper) {
        BoundType::Lower => (0_f64, 1_f64),
        BoundType::Upper => (-1_f64, 0_f64),
        BoundType::Free => (-FREE_BOUND, FREE_BOUND),
        BoundType::Boxed | BoundType::Fixed => (0_f64, 0_f64),
    }
}

impl<'a> Driver<'a> {
    /// Run dual phase one.
    ///
    /// # Return value
    ///
    /// Whether the basis is now dual feasible. If not, a primal ray has been found and the primal
    /// feasibility of the problem should be checked.
    pub(super) fn phase_one(&mut self) -> Result<bool, SolveStatus> {
        info!("dual phase one");

        self.enter_auxiliary_problem();
        self.solve_auxiliary_problem()?;

        let direction = self.value[..self.n].to_vec();
        self.restore_original_bounds();

        let tolerance = self.parameters.dual_feasibility_tolerance;
        let mut dual_infeasible = false;
        for j in 0..self.n + self.m {
            if self.status[j].is_basic() {
                continue;
            }
            let (lower, upper) = (self.lower[j], self.upper[j]);
            let status = match BoundType::from_bounds(lower, upper) {
                BoundType::Fixed => VariableStatus::Fixed,
                BoundType::Boxed if self.reduced_cost[j] < 0_f64 => VariableStatus::AtUpper,
                BoundType::Boxed | BoundType::Lower => VariableStatus::AtLower,
                BoundType::Upper => VariableStatus::AtUpper,
                BoundType::Free => VariableStatus::Free,
            };
            self.status[j] = status;
            self.value[j] = nonbasic_value(status, lower, upper);
            if dual_infeasibility(status, self.reduced_cost[j]) > tolerance {
                dual_infeasible = true;
            }
        }
        self.recompute_primal();

        if !dual_infeasible {
            info!("dual feasible after {} phase one iterations", self.statistics.phase_one_iterations);
            return Ok(true);
        }

        if is_primal_ray(self.lp, &direction, self.parameters.primal_feasibility_tolerance) {
            info!("the problem has a primal ray");
            self.primal_ray = Some(direction);
            Ok(false)
        } else {
            self.statistics.count(NumericalEvent::UnboundedRayRejected);
            debug!("phase one direction is not a primal ray, shifting costs");
            self.correct_dual_infeasibilities();
            Ok(true)
        }
    }

    /// Replace the working bounds by the auxiliary bounds and give the nonbasic variables the bound
    /// that makes their reduced cost dual feasible.
    pub(super) fn enter_auxiliary_problem(&mut self) {
        self.phase = Phase::One;
        self.shifted.clear();
        for j in 0..self.n + self.m {
            let (lower, upper) = auxiliary_bounds(self.original_lower[j], self.original_upper[j]);
            self.lower[j] = lower;
            self.upper[j] = upper;
        }
        for j in 0..self.n + self.m {
            if !self.status[j].is_basic() {
                self.status[j] = if self.lower[j] == self.upper[j] {
                    VariableStatus::Fixed
                } else if self.reduced_cost[j] >= 0_f64 {
                    VariableStatus::AtLower
                } else {
                    VariableStatus::AtUpper
                };
                self.value[j] = nonbasic_value(self.status[j], self.lower[j], self.upper[j]);
            }
        }
        self.recompute_primal();
    }

    /// Iterate until the auxiliary problem is optimal.
    ///
    /// The auxiliary problem is feasible, so a dual ray can only come from numerical trouble or
    /// shifted bounds. It is recovered from like any rejected ray.
    pub(super) fn solve_auxiliary_problem(&mut self) -> Result<(), SolveStatus> {
        loop {
            match self.run_phase()? {
                PhaseOutcome::Optimal => return Ok(()),
                PhaseOutcome::Infeasible(_) => {
                    debug!("auxiliary problem reported infeasible, recovering");
                    self.statistics.count(NumericalEvent::UnboundedRayRejected);
                    self.recover_from_rejected_ray()?;
                },
            }
        }
    }

    /// Replace the working bounds by the bounds of the problem.
    ///
    /// Nonbasic variables whose status no longer fits their bounds get their natural status.
    /// Basic values are not updated.
    pub(super) fn restore_original_bounds(&mut self) {
        self.phase = Phase::Two;
        self.shifted.clear();
        self.lower.copy_from_slice(&self.original_lower);
        self.upper.copy_from_slice(&self.original_upper);

        for j in 0..self.n + self.m {
            if self.status[j].is_basic() {
                continue;
            }
            if !self.status[j].is_compatible_with(self.lower[j], self.upper[j]) {
                self.status[j] = VariableStatus::nonbasic_for_bounds(self.lower[j], self.upper[j]);
            }
            self.value[j] = nonbasic_value(self.status[j], self.lower[j], self.upper[j]);
        }
    }

    /// Decide whether a problem with a primal ray has a feasible point.
    ///
    /// Phase two is run with all costs zero, the basis being dual feasible for any statuses.
    ///
    /// # Return value
    ///
    /// Whether the problem is primal feasible. If not, the dual ray has been stored.
    pub(super) fn check_primal_feasibility(&mut self) -> Result<bool, SolveStatus> {
        info!("checking primal feasibility");

        self.cost.iter_mut().for_each(|cost| *cost = 0_f64);
        self.recompute_dual();
        loop {
            match self.run_phase()? {
                PhaseOutcome::Optimal => {
                    if self.remove_bound_shifts() {
                        self.recompute_primal();
                        continue;
                    }
                    return Ok(true);
                },
                PhaseOutcome::Infeasible(ray) => {
                    if self.accept_dual_ray(ray) {
                        return Ok(false);
                    }
                    self.recover_from_rejected_ray()?;
                },
            }
        }
    }
}
