//! # Certificates of infeasibility and unboundedness
//!
//! A dual ray `y` proves that no point satisfies all bounds: every `x` within the column bounds
//! has `y^T A x < min { y^T r | r within the row bounds }`, so `A x` can't satisfy the row bounds.
//!
//! A primal ray `d` is a direction of recession of the bounds with negative cost, which makes the
//! objective unbounded as soon as a feasible point exists.
//!
//! Both are verified against the problem data before they are reported.
use log::{debug, info};

use crate::algorithm::SolveStatus;
use crate::algorithm::dual_simplex::{Driver, MAX_TROUBLE};
use crate::algorithm::dual_simplex::statistics::NumericalEvent;
use crate::data::linear_program::LinearProgram;

/// Values below this magnitude, relative to the largest entry of the ray, are treated as zero.
const RELATIVE_ZERO: f64 = 1e-9;

/// Largest value of `Σ g_j x_j` for `x` within the bounds.
fn maximum(g: f64, lower: f64, upper: f64) -> f64 {
    if g > 0_f64 {
        g * upper
    } else {
        g * lower
    }
}

/// Whether `multipliers` prove that the problem has no feasible point.
///
/// # Arguments
///
/// * `lp`: Problem.
/// * `multipliers`: One value per row.
pub fn is_dual_ray(lp: &LinearProgram, multipliers: &[f64]) -> bool {
    debug_assert_eq!(multipliers.len(), lp.nr_rows());

    let scale = multipliers.iter().fold(1_f64, |max, y| max.max(y.abs()));
    let zero = RELATIVE_ZERO * scale;

    let columns = (0..lp.nr_columns()).map(|j| {
        let g = lp.columns().column_dot(j, multipliers);
        (g, lp.column_lower()[j], lp.column_upper()[j])
    });
    // The logical variable of a row is minus the row activity
    let rows = multipliers.iter().enumerate()
        .map(|(i, &y)| (y, -lp.row_upper()[i], -lp.row_lower()[i]));

    let bound = columns.chain(rows)
        .filter(|&(g, _, _)| g.abs() > zero)
        .map(|(g, lower, upper)| maximum(g, lower, upper))
        .sum::<f64>();

    bound < -zero
}

/// Whether `direction` is a direction of recession with negative cost.
///
/// # Arguments
///
/// * `lp`: Problem.
/// * `direction`: One value per column.
/// * `tolerance`: Allowed violation of the recession conditions, relative to the largest entry.
pub fn is_primal_ray(lp: &LinearProgram, direction: &[f64], tolerance: f64) -> bool {
    debug_assert_eq!(direction.len(), lp.nr_columns());

    let scale = direction.iter().fold(0_f64, |max, d| max.max(d.abs()));
    if scale == 0_f64 {
        return false;
    }
    let slack = tolerance * scale;

    let sign = lp.sense().sign();
    let cost = direction.iter().zip(lp.costs()).map(|(d, c)| sign * c * d).sum::<f64>();
    if cost >= -RELATIVE_ZERO * scale {
        return false;
    }

    let recedes = |value: f64, lower: f64, upper: f64| {
        (!lower.is_finite() || value >= -slack) && (!upper.is_finite() || value <= slack)
    };
    let columns = direction.iter().zip(lp.column_lower().iter().zip(lp.column_upper()))
        .all(|(&d, (&lower, &upper))| recedes(d, lower, upper));
    let activities = lp.row_activities(direction);
    let rows = activities.iter().zip(lp.row_lower().iter().zip(lp.row_upper()))
        .all(|(&r, (&lower, &upper))| recedes(r, lower, upper));

    columns && rows
}

impl<'a> Driver<'a> {
    /// Verify and store a dual ray.
    ///
    /// # Return value
    ///
    /// Whether the ray proves infeasibility of the problem.
    pub(super) fn accept_dual_ray(&mut self, ray: Vec<f64>) -> bool {
        if is_dual_ray(self.lp, &ray) {
            info!("the problem is primal infeasible");
            self.dual_ray = Some(ray);
            true
        } else {
            debug!("dual ray rejected");
            self.statistics.count(NumericalEvent::UnboundedRayRejected);
            false
        }
    }

    /// Prepare to continue iterating after a rejected dual ray.
    pub(super) fn recover_from_rejected_ray(&mut self) -> Result<(), SolveStatus> {
        if self.remove_bound_shifts() {
            self.recompute_primal();
            return Ok(());
        }

        self.trouble += 1;
        if self.trouble > MAX_TROUBLE {
            return Err(SolveStatus::NumericalError);
        }
        if self.factor.escalate_threshold() {
            self.statistics.count(NumericalEvent::PivotThresholdEscalation);
        }
        self.rebuild()?;
        self.correct_dual_infeasibilities();

        Ok(())
    }
}
