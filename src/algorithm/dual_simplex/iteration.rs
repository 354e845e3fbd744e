//! # Dual simplex iterations
//!
//! A single iteration chooses a leaving row with the pivot rule, computes the pivot row, selects
//! the entering variable with the bound flipping ratio test and updates values, reduced costs,
//! edge weights and the factorization.
use log::{debug, trace};

use crate::algorithm::SolveStatus;
use crate::algorithm::dual_simplex::{Driver, MAX_TROUBLE, Phase, PhaseOutcome, variable_column};
use crate::algorithm::dual_simplex::ratio_test::{Candidate, RatioTestResult};
use crate::algorithm::dual_simplex::statistics::NumericalEvent;
use crate::algorithm::dual_simplex::strategy::pivot_rule::{PivotRule, PivotUpdate, WeightStatus};
use crate::data::linear_program::VariableStatus;
use crate::data::number_types::float::numerical_precision::relative_difference;

/// Largest relative difference between the pivot from the column and from the row.
const PIVOT_AGREEMENT: f64 = 1e-7;

/// Result of a single iteration.
#[derive(Debug)]
enum Step {
    /// A pivot was made, or a numerical difficulty was dealt with.
    Continue,
    Done(PhaseOutcome),
}

impl<'a> Driver<'a> {
    /// Iterate until the working problem is solved.
    pub(super) fn run_phase(&mut self) -> Result<PhaseOutcome, SolveStatus> {
        loop {
            self.check_limits()?;

            if let Some(reason) = self.factor.should_refactor() {
                debug!("refactoring after {} updates, reason {:?}", self.factor.nr_updates(), reason);
                self.rebuild()?;
                self.correct_dual_infeasibilities();
            }

            if let Step::Done(outcome) = self.iterate()? {
                return Ok(outcome);
            }
        }
    }

    fn iterate(&mut self) -> Result<Step, SolveStatus> {
        self.compute_infeasibilities();
        let position = match self.edge_weights.choose_row(&self.infeasibilities, &self.basic_index) {
            Some(position) => position,
            None => return Ok(Step::Done(PhaseOutcome::Optimal)),
        };
        let leaving = self.basic_index[position];
        let delta = self.infeasibilities[position];
        let direction = delta.signum();

        self.row_ep.clear();
        self.row_ep.set_unit(position, 1_f64);
        self.factor.btran(&mut self.row_ep);
        self.statistics.synthetic_ticks += self.row_ep.synthetic_tick();
        self.price();

        self.collect_candidates(direction);
        let (entering, step) = match self.ratio_test.run(
            delta.abs(),
            self.parameters.dual_feasibility_tolerance,
            self.parameters.primal_feasibility_tolerance,
        ) {
            RatioTestResult::Entering { variable, step, .. } => (variable, step),
            RatioTestResult::Unbounded => {
                let ray = self.row_ep.array().iter().map(|&value| direction * value).collect();
                return Ok(Step::Done(PhaseOutcome::Infeasible(ray)));
            },
        };

        if let Some(limit) = self.parameters.iteration_limit {
            if self.statistics.iterations >= limit {
                return Err(SolveStatus::IterationLimit);
            }
        }

        self.column_aq.clear();
        for (i, value) in variable_column(self.lp, entering) {
            self.column_aq.add(i, value);
        }
        self.factor.ftran_with_spike(&mut self.column_aq);
        self.statistics.synthetic_ticks += self.column_aq.synthetic_tick();

        let pivot = self.column_aq.get(position);
        let row_pivot = self.row_alpha(entering);
        let tiny = pivot.abs() < self.parameters.pivot_tolerance;
        if tiny || relative_difference(pivot, row_pivot) > PIVOT_AGREEMENT {
            self.statistics.count(NumericalEvent::PivotMismatch);
            if self.factor.nr_updates() > 0 {
                debug!("pivot {:e} from the column differs from {:e} from the row, refactoring", pivot, row_pivot);
                self.rebuild()?;
                self.correct_dual_infeasibilities();
                return Ok(Step::Continue);
            }
            if tiny {
                self.trouble += 1;
                if self.trouble > MAX_TROUBLE {
                    return Err(SolveStatus::NumericalError);
                }
                debug!("pivot {:e} too small on a fresh factorization, shifting the bound of {}", pivot, leaving);
                self.shift_bound(leaving);
                return Ok(Step::Continue);
            }
        }

        if self.edge_weights.needs_tau() {
            self.tau.copy_from(&self.row_ep);
            let before = self.tau.synthetic_tick();
            self.factor.ftran(&mut self.tau);
            self.statistics.synthetic_ticks += self.tau.synthetic_tick() - before;
        }

        self.update_duals(leaving, entering, step * direction);
        self.flip_bounds();
        self.update_primal(position, entering, direction, pivot);

        let update = PivotUpdate {
            position,
            column: &self.column_aq,
            tau: if self.edge_weights.needs_tau() { Some(&self.tau) } else { None },
        };
        let weight_status = self.edge_weights.update_after_pivot(&update);

        self.basic_index[position] = entering;
        self.status[entering] = VariableStatus::Basic;
        self.status[leaving] = if self.lower[leaving] == self.upper[leaving] {
            VariableStatus::Fixed
        } else if direction > 0_f64 {
            VariableStatus::AtUpper
        } else {
            VariableStatus::AtLower
        };

        self.statistics.iterations += 1;
        if self.phase == Phase::One {
            self.statistics.phase_one_iterations += 1;
        }
        let nr_flips = self.ratio_test.flips().len();
        self.statistics.bound_flips += nr_flips;
        self.trouble = 0;
        trace!(
            "iteration {}: {} leaves from position {} with infeasibility {:e}, {} enters with pivot {:e}, dual step {:e}, {} flips",
            self.statistics.iterations, leaving, position, delta, entering, pivot, step, nr_flips,
        );

        if let Err(error) = self.factor.update(position, pivot) {
            debug!("factorization update failed: {}", error);
            self.statistics.count(NumericalEvent::UpdateSingular);
            self.factor_valid = false;
            self.rebuild()?;
            self.correct_dual_infeasibilities();
        } else if weight_status == WeightStatus::NeedsRecompute {
            debug!("recomputing steepest edge weights");
            self.compute_exact_weights();
        }

        if self.parameters.record_objective_trace {
            let objective = self.working_objective();
            self.statistics.objective_trace.push(objective);
        }
        debug_assert!(self.check_invariants(None).is_ok());

        if self.cycle_detector.record(entering) {
            self.break_cycle()?;
        }

        Ok(Step::Continue)
    }

    /// Compute the primal infeasibility of each basic variable.
    pub(super) fn compute_infeasibilities(&mut self) {
        let tolerance = self.parameters.primal_feasibility_tolerance;
        for (position, &j) in self.basic_index.iter().enumerate() {
            let x = self.value[j];
            self.infeasibilities[position] = if x > self.upper[j] + tolerance {
                x - self.upper[j]
            } else if x < self.lower[j] - tolerance {
                x - self.lower[j]
            } else {
                0_f64
            };
        }
    }

    /// Compute the structural part of the pivot row, `ρ_p^T A`.
    fn price(&mut self) {
        self.row_ap.clear();
        if self.row_ep.is_hyper_sparse(self.row_ep.count()) {
            self.lp.rows().price_by_row(&self.row_ep, &mut self.row_ap);
        } else {
            self.lp.columns().price_by_column(&self.row_ep, &mut self.row_ap);
        }
        self.statistics.synthetic_ticks += self.row_ap.synthetic_tick();
    }

    /// Pivot row entry of any variable.
    fn row_alpha(&self, j: usize) -> f64 {
        if j < self.n {
            self.row_ap.get(j)
        } else {
            self.row_ep.get(j - self.n)
        }
    }

    /// Register the nonbasic variables whose reduced cost moves towards zero as the dual step
    /// grows with the ratio test.
    fn collect_candidates(&mut self, direction: f64) {
        self.ratio_test.clear();
        for k in 0..self.row_ap.count() {
            let j = self.row_ap.index()[k];
            if let Some(candidate) = self.candidate(j, direction) {
                self.ratio_test.push(candidate);
            }
        }
        for k in 0..self.row_ep.count() {
            let j = self.n + self.row_ep.index()[k];
            if let Some(candidate) = self.candidate(j, direction) {
                self.ratio_test.push(candidate);
            }
        }
    }

    fn candidate(&self, j: usize, direction: f64) -> Option<Candidate> {
        let alpha = self.row_alpha(j);
        let signed = direction * alpha;
        let moving = match self.status[j] {
            VariableStatus::AtLower => 1_f64,
            VariableStatus::AtUpper => -1_f64,
            VariableStatus::Free => signed.signum(),
            VariableStatus::Fixed | VariableStatus::Basic => return None,
        };
        if moving * signed <= self.parameters.pivot_tolerance {
            return None;
        }

        let range = if self.lower[j].is_finite() && self.upper[j].is_finite() {
            self.upper[j] - self.lower[j]
        } else {
            f64::INFINITY
        };
        Some(Candidate {
            variable: j,
            alpha: alpha.abs(),
            ratio: moving * self.reduced_cost[j] / alpha.abs(),
            range,
        })
    }

    /// Take a dual step of `signed_step` along the pivot row.
    fn update_duals(&mut self, leaving: usize, entering: usize, signed_step: f64) {
        if signed_step != 0_f64 {
            for (j, alpha) in self.row_ap.iter() {
                if !self.status[j].is_basic() {
                    self.reduced_cost[j] -= signed_step * alpha;
                }
            }
            for (i, rho) in self.row_ep.iter() {
                let j = self.n + i;
                if !self.status[j].is_basic() {
                    self.reduced_cost[j] -= signed_step * rho;
                }
                self.multipliers[i] += signed_step * rho;
            }
        }

        self.reduced_cost[leaving] = -signed_step;
        self.reduced_cost[entering] = 0_f64;
    }

    /// Move the boxed variables chosen by the ratio test to their other bound and update the basic
    /// values.
    fn flip_bounds(&mut self) {
        if self.ratio_test.flips().is_empty() {
            return;
        }

        self.work.clear();
        for k in 0..self.ratio_test.flips().len() {
            let j = self.ratio_test.flips()[k];
            let (status, target) = match self.status[j] {
                VariableStatus::AtLower => (VariableStatus::AtUpper, self.upper[j]),
                VariableStatus::AtUpper => (VariableStatus::AtLower, self.lower[j]),
                _ => {
                    debug_assert!(false, "only variables between two finite bounds can flip");
                    continue;
                },
            };
            let change = target - self.value[j];
            self.value[j] = target;
            self.status[j] = status;
            for (i, value) in variable_column(self.lp, j) {
                self.work.add(i, value * change);
            }
        }

        self.factor.ftran(&mut self.work);
        self.statistics.synthetic_ticks += self.work.synthetic_tick();
        for (position, change) in self.work.iter() {
            self.value[self.basic_index[position]] -= change;
        }
    }

    /// Move the leaving variable to its violated bound, along the entering column.
    fn update_primal(&mut self, position: usize, entering: usize, direction: f64, pivot: f64) {
        let leaving = self.basic_index[position];
        let target = if direction > 0_f64 { self.upper[leaving] } else { self.lower[leaving] };
        let theta = (self.value[leaving] - target) / pivot;

        for (p, alpha) in self.column_aq.iter() {
            self.value[self.basic_index[p]] -= theta * alpha;
        }
        self.value[entering] += theta;
        self.value[leaving] = target;
    }

    /// Objective value of the working problem.
    pub(super) fn working_objective(&self) -> f64 {
        self.cost.iter().zip(&self.value).map(|(c, x)| c * x).sum()
    }
}
