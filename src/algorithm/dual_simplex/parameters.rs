//! # Parameters
//!
//! Tolerances, limits and strategy choices of a solve. All values have defaults, individual values
//! can be changed with the `with_*` methods.
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use thiserror::Error;

use crate::algorithm::dual_simplex::inverse_maintenance::FactorParameters;

/// How the leaving variable is chosen.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub enum PricingRule {
    /// Largest primal infeasibility.
    Dantzig,
    /// Largest infeasibility relative to an approximate reference framework weight.
    Devex,
    /// Largest infeasibility relative to the exact dual steepest edge weight.
    #[default]
    SteepestEdge,
}

/// A parameter value is out of its range.
#[allow(missing_docs)]
#[derive(Error, Clone, Debug, PartialEq)]
pub enum ParameterError {
    #[error("tolerance {name} should be positive and finite, was {value}")]
    Tolerance { name: &'static str, value: f64 },
    #[error("{name} should be in (0, 1], was {value}")]
    Fraction { name: &'static str, value: f64 },
    #[error("pivot threshold {threshold} exceeds its ceiling {ceiling}")]
    ThresholdCeiling { threshold: f64, ceiling: f64 },
    #[error("{name} should be at least {minimum}, was {value}")]
    TooSmall { name: &'static str, minimum: f64, value: f64 },
}

/// Settings of the dual simplex method.
#[derive(Clone, Debug)]
pub struct Parameters {
    /// Strategy to choose the leaving variable.
    pub pricing_rule: PricingRule,
    /// Largest bound violation considered feasible.
    pub primal_feasibility_tolerance: f64,
    /// Largest reduced cost of the wrong sign considered feasible.
    pub dual_feasibility_tolerance: f64,
    /// Smallest magnitude of an acceptable pivot element, in the ratio test and in the LU.
    pub pivot_tolerance: f64,
    /// Initial relative pivot threshold of the LU.
    pub pivot_threshold: f64,
    /// Largest relative pivot threshold the LU may be escalated to.
    pub pivot_threshold_ceiling: f64,
    /// Refactor after this many updates.
    pub max_updates: usize,
    /// Refactor when the factors have grown beyond this multiple of their fresh size.
    pub max_fill_growth: f64,
    /// Stop after this many iterations.
    pub iteration_limit: Option<usize>,
    /// Stop after this much time.
    pub time_limit: Option<Duration>,
    /// When this flag is raised, the solve stops at the next iteration boundary.
    pub interrupt: Option<Arc<AtomicBool>>,
    /// Fraction of the dimension up to which solves use sparse sweeps.
    pub density_threshold: f64,
    /// Whether costs are perturbed against dual degeneracy.
    pub perturbation: bool,
    /// Seed for the perturbation.
    pub random_seed: u64,
    /// Number of recent entering variables looked at for cycle detection.
    pub cycle_window: usize,
    /// A variable entering more often than this within the window indicates cycling.
    pub cycle_threshold: usize,
    /// Whether the objective value is recorded after every iteration.
    pub record_objective_trace: bool,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            pricing_rule: PricingRule::default(),
            primal_feasibility_tolerance: 1e-7,
            dual_feasibility_tolerance: 1e-7,
            pivot_tolerance: 1e-9,
            pivot_threshold: 0.1,
            pivot_threshold_ceiling: 0.5,
            max_updates: 100,
            max_fill_growth: 1.5,
            iteration_limit: None,
            time_limit: None,
            interrupt: None,
            density_threshold: 0.10,
            perturbation: true,
            random_seed: 0,
            cycle_window: 64,
            cycle_threshold: 8,
            record_objective_trace: false,
        }
    }
}

impl Parameters {
    #[allow(missing_docs)]
    pub fn with_pricing_rule(mut self, pricing_rule: PricingRule) -> Self {
        self.pricing_rule = pricing_rule;
        self
    }

    #[allow(missing_docs)]
    pub fn with_primal_feasibility_tolerance(mut self, tolerance: f64) -> Self {
        self.primal_feasibility_tolerance = tolerance;
        self
    }

    #[allow(missing_docs)]
    pub fn with_dual_feasibility_tolerance(mut self, tolerance: f64) -> Self {
        self.dual_feasibility_tolerance = tolerance;
        self
    }

    #[allow(missing_docs)]
    pub fn with_pivot_tolerance(mut self, tolerance: f64) -> Self {
        self.pivot_tolerance = tolerance;
        self
    }

    /// Set the initial relative pivot threshold and its ceiling.
    pub fn with_pivot_threshold(mut self, threshold: f64, ceiling: f64) -> Self {
        self.pivot_threshold = threshold;
        self.pivot_threshold_ceiling = ceiling;
        self
    }

    /// Set when the factorization is rebuilt.
    ///
    /// # Arguments
    ///
    /// * `max_updates`: Maximum number of updates, `1` refactors every iteration.
    /// * `max_fill_growth`: Maximum growth of the factors relative to their fresh size.
    pub fn with_refactor_frequency(mut self, max_updates: usize, max_fill_growth: f64) -> Self {
        self.max_updates = max_updates;
        self.max_fill_growth = max_fill_growth;
        self
    }

    #[allow(missing_docs)]
    pub fn with_iteration_limit(mut self, limit: usize) -> Self {
        self.iteration_limit = Some(limit);
        self
    }

    #[allow(missing_docs)]
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Poll this flag at every iteration boundary.
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }

    #[allow(missing_docs)]
    pub fn with_density_threshold(mut self, threshold: f64) -> Self {
        self.density_threshold = threshold;
        self
    }

    /// Enable or disable cost perturbation.
    pub fn with_perturbation(mut self, perturbation: bool) -> Self {
        self.perturbation = perturbation;
        self
    }

    #[allow(missing_docs)]
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    /// Detect cycling when a variable enters more than `threshold` times in the last `window`
    /// iterations.
    pub fn with_cycle_detection(mut self, window: usize, threshold: usize) -> Self {
        self.cycle_window = window;
        self.cycle_threshold = threshold;
        self
    }

    #[allow(missing_docs)]
    pub fn with_objective_trace(mut self, record: bool) -> Self {
        self.record_objective_trace = record;
        self
    }

    /// Check that all values are in their range.
    pub fn validate(&self) -> Result<(), ParameterError> {
        for (name, value) in [
            ("primal feasibility tolerance", self.primal_feasibility_tolerance),
            ("dual feasibility tolerance", self.dual_feasibility_tolerance),
            ("pivot tolerance", self.pivot_tolerance),
        ] {
            if !(value.is_finite() && value > 0_f64) {
                return Err(ParameterError::Tolerance { name, value });
            }
        }
        for (name, value) in [
            ("density threshold", self.density_threshold),
            ("pivot threshold", self.pivot_threshold),
            ("pivot threshold ceiling", self.pivot_threshold_ceiling),
        ] {
            if !(value > 0_f64 && value <= 1_f64) {
                return Err(ParameterError::Fraction { name, value });
            }
        }
        if self.pivot_threshold > self.pivot_threshold_ceiling {
            return Err(ParameterError::ThresholdCeiling {
                threshold: self.pivot_threshold,
                ceiling: self.pivot_threshold_ceiling,
            });
        }
        for (name, minimum, value) in [
            ("max updates", 1_f64, self.max_updates as f64),
            ("max fill growth", 1_f64, self.max_fill_growth),
            ("cycle window", 1_f64, self.cycle_window as f64),
            ("cycle threshold", 1_f64, self.cycle_threshold as f64),
        ] {
            if !(value >= minimum) {
                return Err(ParameterError::TooSmall { name, minimum, value });
            }
        }

        Ok(())
    }

    /// Settings for the basis factorization.
    pub(crate) fn factor_parameters(&self) -> FactorParameters {
        FactorParameters {
            pivot_threshold: self.pivot_threshold,
            threshold_ceiling: self.pivot_threshold_ceiling,
            pivot_tolerance: self.pivot_tolerance,
            max_updates: self.max_updates,
            max_fill_growth: self.max_fill_growth,
        }
    }
}
