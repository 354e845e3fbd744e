//! # Rebuilding the factorization
//!
//! Refactoring discards the accumulated updates and recomputes all values and reduced costs from
//! scratch. A singular basis is repaired by replacing dependent columns with logical variables.
use log::debug;

use crate::algorithm::SolveStatus;
use crate::algorithm::dual_simplex::{Driver, dual_infeasibility, nonbasic_value, variable_column};
use crate::algorithm::dual_simplex::inverse_maintenance::FactorError;
use crate::algorithm::dual_simplex::inverse_maintenance::lower_upper::decomposition::Dependencies;
use crate::algorithm::dual_simplex::statistics::NumericalEvent;
use crate::algorithm::dual_simplex::strategy::pivot_rule::PivotRule;
use crate::data::linear_algebra::SparseTuple;
use crate::data::linear_program::{BoundType, VariableStatus};

/// Attempts at factoring before giving up.
const MAX_REBUILD_ATTEMPTS: usize = 10;
/// Largest acceptable error when solving with a fresh factorization.
const RESIDUAL_LIMIT: f64 = 1e-8;

impl<'a> Driver<'a> {
    /// Factor the current basis and recompute values, multipliers and reduced costs.
    pub(super) fn rebuild(&mut self) -> Result<(), SolveStatus> {
        let mut repaired = false;
        let mut attempts = 0;
        loop {
            attempts += 1;
            if attempts > MAX_REBUILD_ATTEMPTS {
                return Err(SolveStatus::NumericalError);
            }

            let columns = self.basis_columns();
            match self.factor.refactor(&columns) {
                Ok(report) => {
                    let residual = self.factor.residual(&columns);
                    if residual > RESIDUAL_LIMIT {
                        self.statistics.count(NumericalEvent::ResidualTooLarge);
                        if self.factor.escalate_threshold() {
                            self.statistics.count(NumericalEvent::PivotThresholdEscalation);
                            continue;
                        }
                        debug!("accepting factorization with residual {:e}", residual);
                    }
                    self.statistics.refactorizations += 1;
                    self.statistics.fill_factors.push(report.fill_factor);
                    debug!("refactorization {}, fill factor {:.2}", self.statistics.refactorizations, report.fill_factor);
                    break;
                },
                Err(FactorError::SingularBasis(dependencies)) => {
                    self.statistics.count(NumericalEvent::SingularBasis);
                    self.replace_dependent(&dependencies);
                    repaired = true;
                },
                Err(FactorError::PivotToleranceViolation { growth, threshold }) => {
                    debug!("element growth {:e}, factoring again with threshold {}", growth, threshold);
                    self.statistics.count(NumericalEvent::PivotThresholdEscalation);
                },
                Err(FactorError::OutOfMemory) => return Err(SolveStatus::OutOfMemory),
            }
        }
        self.factor_valid = true;

        self.recompute_primal();
        self.recompute_dual();
        self.measure_residuals();

        if repaired {
            if self.edge_weights.wants_exact_weights() {
                self.compute_exact_weights();
            } else {
                self.edge_weights.reset_weights(self.m);
            }
        }

        Ok(())
    }

    /// Basis matrix by basis position.
    fn basis_columns(&self) -> Vec<Vec<SparseTuple<f64>>> {
        self.basic_index.iter()
            .map(|&j| variable_column(self.lp, j).collect())
            .collect()
    }

    /// Replace dependent basic variables by the logical variables of the uncovered rows.
    fn replace_dependent(&mut self, dependencies: &Dependencies) {
        debug!("replacing {} dependent basic variables by logicals", dependencies.pairs.len());
        self.factor_valid = false;

        for &(position, _) in &dependencies.pairs {
            let j = self.basic_index[position];
            let status = VariableStatus::nonbasic_for_bounds(self.lower[j], self.upper[j]);
            self.status[j] = status;
            self.value[j] = nonbasic_value(status, self.lower[j], self.upper[j]);
        }
        for &(position, row) in &dependencies.pairs {
            let logical = self.n + row;
            debug_assert!(!self.status[logical].is_basic());

            self.basic_index[position] = logical;
            self.status[logical] = VariableStatus::Basic;
        }
    }

    /// Solve for the basic values given the nonbasic values.
    pub(super) fn recompute_primal(&mut self) {
        self.work.clear();
        for j in 0..self.n + self.m {
            if self.status[j].is_basic() || self.value[j] == 0_f64 {
                continue;
            }
            for (i, value) in variable_column(self.lp, j) {
                self.work.add(i, -value * self.value[j]);
            }
        }

        self.factor.ftran(&mut self.work);
        self.statistics.synthetic_ticks += self.work.synthetic_tick();
        for (position, &j) in self.basic_index.iter().enumerate() {
            self.value[j] = self.work.get(position);
        }
    }

    /// Solve for the multipliers and compute all reduced costs.
    pub(super) fn recompute_dual(&mut self) {
        self.work.clear();
        for (position, &j) in self.basic_index.iter().enumerate() {
            if self.cost[j] != 0_f64 {
                self.work.add(position, self.cost[j]);
            }
        }

        self.factor.btran(&mut self.work);
        self.statistics.synthetic_ticks += self.work.synthetic_tick();
        self.multipliers.copy_from_slice(self.work.array());

        for j in 0..self.n {
            self.reduced_cost[j] = self.cost[j] - self.lp.columns().column_dot(j, &self.multipliers);
        }
        for i in 0..self.m {
            self.reduced_cost[self.n + i] = self.cost[self.n + i] - self.multipliers[i];
        }
        for &j in &self.basic_index {
            self.reduced_cost[j] = 0_f64;
        }
    }

    /// Record how well the recomputed values satisfy the equations, relative to the size of the
    /// right-hand sides.
    fn measure_residuals(&mut self) {
        let mut activity = vec![0_f64; self.m];
        let mut nonbasic = vec![0_f64; self.m];
        for j in 0..self.n + self.m {
            if self.value[j] == 0_f64 {
                continue;
            }
            let basic = self.status[j].is_basic();
            for (i, value) in variable_column(self.lp, j) {
                let product = value * self.value[j];
                activity[i] += product;
                if !basic {
                    nonbasic[i] += product;
                }
            }
        }
        let primal_scale = 1_f64 + max_abs(&nonbasic);
        let primal_residual = max_abs(&activity) / primal_scale;

        let mut cost_scale = 0_f64;
        let mut dual_residual = 0_f64;
        for &j in &self.basic_index {
            let column_dot = variable_column(self.lp, j)
                .map(|(i, value)| value * self.multipliers[i])
                .sum::<f64>();
            dual_residual = dual_residual.max((self.cost[j] - column_dot).abs());
            cost_scale = cost_scale.max(self.cost[j].abs());
        }
        let dual_residual = dual_residual / (1_f64 + cost_scale);

        self.statistics.max_primal_residual = self.statistics.max_primal_residual.max(primal_residual);
        self.statistics.max_dual_residual = self.statistics.max_dual_residual.max(dual_residual);
    }

    /// Remove dual infeasibilities that appeared through rounding.
    ///
    /// Boxed variables move to their other bound, other variables get their cost shifted.
    pub(super) fn correct_dual_infeasibilities(&mut self) {
        let tolerance = self.parameters.dual_feasibility_tolerance;
        let mut flipped = 0;
        let mut shifted = 0;
        for j in 0..self.n + self.m {
            if dual_infeasibility(self.status[j], self.reduced_cost[j]) <= tolerance {
                continue;
            }
            if BoundType::from_bounds(self.lower[j], self.upper[j]).is_boxed() {
                self.flip(j);
                flipped += 1;
            } else {
                self.cost[j] -= self.reduced_cost[j];
                self.reduced_cost[j] = 0_f64;
                shifted += 1;
            }
        }

        if flipped + shifted > 0 {
            debug!("corrected dual infeasibilities: {} flips, {} cost shifts", flipped, shifted);
            self.statistics.count(NumericalEvent::DualInfeasibilityAfterRebuild);
        }
        if flipped > 0 {
            self.recompute_primal();
        }
    }

    /// Move a nonbasic boxed variable to its other bound, without updating the basic values.
    pub(super) fn flip(&mut self, j: usize) {
        let status = match self.status[j] {
            VariableStatus::AtLower => VariableStatus::AtUpper,
            VariableStatus::AtUpper => VariableStatus::AtLower,
            other => other,
        };
        self.status[j] = status;
        self.value[j] = nonbasic_value(status, self.lower[j], self.upper[j]);
    }

    /// Compute the steepest edge weights `‖e_i^T B^-1‖²` from scratch.
    pub(super) fn compute_exact_weights(&mut self) {
        let mut weights = Vec::with_capacity(self.m);
        for position in 0..self.m {
            self.work.clear();
            self.work.set_unit(position, 1_f64);
            self.factor.btran(&mut self.work);
            self.statistics.synthetic_ticks += self.work.synthetic_tick();
            weights.push(self.work.norm2().max(1_f64));
        }

        self.edge_weights.set_exact_weights(weights);
    }
}

fn max_abs(values: &[f64]) -> f64 {
    values.iter().fold(0_f64, |max, value| max.max(value.abs()))
}
