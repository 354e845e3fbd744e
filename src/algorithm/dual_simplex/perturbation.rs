//! # Perturbation and shifting
//!
//! Against dual degeneracy, the costs of nonbasic variables are perturbed by small random amounts
//! in the direction that keeps them dual feasible. Against stalling, bounds of slightly infeasible
//! basic variables are relaxed. Both changes are removed before a result is reported.
use log::debug;
use rand::Rng;

use crate::algorithm::SolveStatus;
use crate::algorithm::dual_simplex::{Driver, Phase, nonbasic_value};
use crate::algorithm::dual_simplex::statistics::NumericalEvent;
use crate::data::linear_program::VariableStatus;

/// Base magnitude of the cost perturbation.
const PERTURBATION_BASE: f64 = 5e-8;
/// Basic infeasibilities up to this multiple of the tolerance are removed by shifting a bound.
const BOUND_SHIFT_FACTOR: f64 = 1e3;

impl<'a> Driver<'a> {
    /// Perturb the costs of the nonbasic variables that sit at a bound.
    ///
    /// The magnitude is `(1 + u) (1 + |c_j|)` times a small base, with `u` uniform in `[0, 1)`.
    pub(super) fn perturb_costs(&mut self) {
        let mut count = 0;
        for j in 0..self.n + self.m {
            let direction = match self.status[j] {
                VariableStatus::AtLower => 1_f64,
                VariableStatus::AtUpper => -1_f64,
                _ => continue,
            };
            let random = self.rng.gen_range(0_f64..1_f64);
            let change = direction * PERTURBATION_BASE * (1_f64 + random) * (1_f64 + self.cost[j].abs());
            self.cost[j] += change;
            self.reduced_cost[j] += change;
            count += 1;
        }

        self.perturbed = true;
        debug!("perturbed {} costs", count);
    }

    /// Reset the working costs to the costs of the problem.
    pub(super) fn restore_costs(&mut self) {
        self.cost.copy_from_slice(&self.original_cost);
    }

    /// Relax the violated bound of a basic variable up to its current value.
    pub(super) fn shift_bound(&mut self, j: usize) {
        debug_assert!(self.status[j].is_basic());

        let x = self.value[j];
        if x < self.lower[j] {
            self.shifted.push((j, self.lower[j], self.upper[j]));
            self.lower[j] = x;
        } else if x > self.upper[j] {
            self.shifted.push((j, self.lower[j], self.upper[j]));
            self.upper[j] = x;
        }
    }

    /// Undo all bound shifts, moving nonbasic variables to their restored bound.
    ///
    /// # Return value
    ///
    /// Whether any bound was restored. If so, the basic values should be recomputed.
    pub(super) fn remove_bound_shifts(&mut self) -> bool {
        if self.shifted.is_empty() {
            return false;
        }

        debug!("removing {} bound shifts", self.shifted.len());
        while let Some((j, lower, upper)) = self.shifted.pop() {
            self.lower[j] = lower;
            self.upper[j] = upper;
            if !self.status[j].is_basic() {
                if !self.status[j].is_compatible_with(lower, upper) {
                    self.status[j] = VariableStatus::nonbasic_for_bounds(lower, upper);
                }
                self.value[j] = nonbasic_value(self.status[j], lower, upper);
            }
        }

        true
    }

    /// Respond to a variable entering the basis too often.
    ///
    /// The factorization is rebuilt. The costs are perturbed if that didn't happen yet, otherwise
    /// the bounds of slightly infeasible basic variables are shifted.
    pub(super) fn break_cycle(&mut self) -> Result<(), SolveStatus> {
        self.statistics.count(NumericalEvent::CycleDetected);
        debug!("cycling detected after {} iterations", self.statistics.iterations);

        self.rebuild()?;
        self.correct_dual_infeasibilities();

        if self.parameters.perturbation && !self.perturbed && self.phase == Phase::Two {
            self.perturb_costs();
        } else {
            self.compute_infeasibilities();
            let limit = BOUND_SHIFT_FACTOR * self.parameters.primal_feasibility_tolerance;
            let candidates = self.infeasibilities.iter().enumerate()
                .filter(|&(_, &delta)| delta != 0_f64 && delta.abs() <= limit)
                .map(|(position, _)| self.basic_index[position])
                .collect::<Vec<_>>();
            debug!("shifting bounds of {} basic variables", candidates.len());
            for j in candidates {
                self.shift_bound(j);
            }
        }

        Ok(())
    }
}
