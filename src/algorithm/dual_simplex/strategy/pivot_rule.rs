//! # Pivot rules
//!
//! In the dual simplex method, the pivot rule decides which infeasible basic variable leaves the
//! basis. The rules differ in how they weigh the primal infeasibility of a basic position:
//!
//! * Dantzig takes the largest infeasibility.
//! * Devex divides the squared infeasibility by a reference framework weight.
//! * Dual steepest edge divides the squared infeasibility by `‖e_i^T B^-1‖²`, the squared norm of
//! the row of the basis inverse, which is maintained exactly through each basis change.
use crate::algorithm::dual_simplex::parameters::PricingRule;
use crate::data::linear_algebra::vector::IndexedVector;

/// Devex weights are reset once one of them exceeds this value.
const DEVEX_RESET: f64 = 1e7;
/// Steepest edge weights are recomputed once one of them exceeds this value.
const STEEPEST_EDGE_RECOMPUTE: f64 = 1e20;

/// Basis change information used to update the weights.
#[derive(Debug)]
pub struct PivotUpdate<'a> {
    /// Basic position of the leaving variable.
    pub position: usize,
    /// Transformed entering column `B^-1 a_q`, by basic position.
    pub column: &'a IndexedVector<f64>,
    /// `B^-1 ρ_p`, where `ρ_p` is row `p` of the basis inverse. Only computed when the rule needs
    /// it.
    pub tau: Option<&'a IndexedVector<f64>>,
}

/// Whether the weights can still be trusted after an update.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum WeightStatus {
    /// The weights are usable.
    Valid,
    /// The weights should be recomputed from scratch.
    NeedsRecompute,
}

/// Deciding which basic variable leaves the basis.
pub trait PivotRule {
    /// Select the leaving position.
    ///
    /// # Arguments
    ///
    /// * `infeasibilities`: Per basic position, the bound violation `δ_i`, zero if feasible.
    /// * `basic_index`: Per basic position, the variable, to break ties.
    ///
    /// # Return value
    ///
    /// The position with the largest weighted infeasibility, ties broken by lowest variable
    /// index, or `None` if all basic variables are feasible.
    fn choose_row(&self, infeasibilities: &[f64], basic_index: &[usize]) -> Option<usize> {
        let mut best: Option<(f64, usize, usize)> = None;
        for (position, &infeasibility) in infeasibilities.iter().enumerate() {
            if infeasibility == 0_f64 {
                continue;
            }
            let score = infeasibility * infeasibility / self.weight(position);
            let variable = basic_index[position];
            let better = match best {
                None => true,
                Some((best_score, best_variable, _)) => {
                    score > best_score || (score == best_score && variable < best_variable)
                },
            };
            if better {
                best = Some((score, variable, position));
            }
        }

        best.map(|(_, _, position)| position)
    }

    /// Weight of a basic position.
    fn weight(&self, position: usize) -> f64;

    /// Whether `update_after_pivot` needs `PivotUpdate::tau`.
    fn needs_tau(&self) -> bool {
        false
    }

    /// Update the weights for a basis change.
    fn update_after_pivot(&mut self, update: &PivotUpdate<'_>) -> WeightStatus;

    /// Reset all weights to one, for a basis of size `m`.
    fn reset_weights(&mut self, m: usize);
}

/// Largest infeasibility.
#[derive(Clone, Debug, Default)]
pub struct Dantzig;

impl PivotRule for Dantzig {
    fn weight(&self, _position: usize) -> f64 {
        1_f64
    }

    fn update_after_pivot(&mut self, _update: &PivotUpdate<'_>) -> WeightStatus {
        WeightStatus::Valid
    }

    fn reset_weights(&mut self, _m: usize) {
    }
}

/// Reference framework weights, see Forrest and Goldfarb (1992).
#[derive(Clone, Debug)]
pub struct Devex {
    weights: Vec<f64>,
    resets: usize,
}

impl Devex {
    /// Create a reference framework of the current basis.
    pub fn new(m: usize) -> Self {
        Self { weights: vec![1_f64; m], resets: 0 }
    }

    /// Number of times the reference framework was reset after the weights grew too large.
    pub fn resets(&self) -> usize {
        self.resets
    }
}

impl PivotRule for Devex {
    fn weight(&self, position: usize) -> f64 {
        self.weights[position]
    }

    fn update_after_pivot(&mut self, update: &PivotUpdate<'_>) -> WeightStatus {
        let p = update.position;
        let pivot = update.column.get(p);
        debug_assert_ne!(pivot, 0_f64);

        let weight_p = self.weights[p];
        let mut largest = 0_f64;
        for (i, value) in update.column.iter() {
            if i == p {
                continue;
            }
            let ratio = value / pivot;
            self.weights[i] = self.weights[i].max(ratio * ratio * weight_p);
            largest = largest.max(self.weights[i]);
        }
        self.weights[p] = (weight_p / (pivot * pivot)).max(1_f64);
        largest = largest.max(self.weights[p]);

        if largest > DEVEX_RESET {
            self.reset_weights(self.weights.len());
            self.resets += 1;
        }

        WeightStatus::Valid
    }

    fn reset_weights(&mut self, m: usize) {
        self.weights.clear();
        self.weights.resize(m, 1_f64);
    }
}

/// Dual steepest edge weights, see Forrest and Goldfarb (1992).
///
/// The weight of position `i` is `‖e_i^T B^-1‖²`. After each update, weights are floored at one.
#[derive(Clone, Debug)]
pub struct SteepestEdge {
    weights: Vec<f64>,
}

impl SteepestEdge {
    /// Weights for a basis matrix equal to the identity.
    pub fn new(m: usize) -> Self {
        Self { weights: vec![1_f64; m] }
    }

    /// Replace all weights by exactly computed values.
    pub fn set_weights(&mut self, weights: Vec<f64>) {
        debug_assert!(weights.iter().all(|w| w.is_finite()));

        self.weights = weights;
    }
}

impl PivotRule for SteepestEdge {
    fn weight(&self, position: usize) -> f64 {
        self.weights[position]
    }

    fn needs_tau(&self) -> bool {
        true
    }

    fn update_after_pivot(&mut self, update: &PivotUpdate<'_>) -> WeightStatus {
        let p = update.position;
        let pivot = update.column.get(p);
        debug_assert_ne!(pivot, 0_f64);
        debug_assert!(update.tau.is_some());

        let weight_p = self.weights[p];
        let mut largest = 0_f64;
        for (i, value) in update.column.iter() {
            if i == p {
                continue;
            }
            let ratio = value / pivot;
            let tau = update.tau.map_or(0_f64, |tau| tau.get(i));
            let weight = self.weights[i] + ratio * (ratio * weight_p - 2_f64 * tau);
            self.weights[i] = weight.max(1_f64);
            largest = largest.max(self.weights[i]);
        }
        self.weights[p] = (weight_p / (pivot * pivot)).max(1_f64);
        largest = largest.max(self.weights[p]);

        if largest > STEEPEST_EDGE_RECOMPUTE {
            WeightStatus::NeedsRecompute
        } else {
            WeightStatus::Valid
        }
    }

    fn reset_weights(&mut self, m: usize) {
        self.weights.clear();
        self.weights.resize(m, 1_f64);
    }
}

/// The pivot rule of a solve, chosen once at the start.
#[derive(Clone, Debug)]
pub enum EdgeWeights {
    #[allow(missing_docs)]
    Dantzig(Dantzig),
    #[allow(missing_docs)]
    Devex(Devex),
    #[allow(missing_docs)]
    SteepestEdge(SteepestEdge),
}

impl EdgeWeights {
    /// Create the rule with unit weights for a basis of size `m`.
    pub fn new(rule: PricingRule, m: usize) -> Self {
        match rule {
            PricingRule::Dantzig => EdgeWeights::Dantzig(Dantzig),
            PricingRule::Devex => EdgeWeights::Devex(Devex::new(m)),
            PricingRule::SteepestEdge => EdgeWeights::SteepestEdge(SteepestEdge::new(m)),
        }
    }

    fn rule(&self) -> &dyn PivotRule {
        match self {
            EdgeWeights::Dantzig(rule) => rule,
            EdgeWeights::Devex(rule) => rule,
            EdgeWeights::SteepestEdge(rule) => rule,
        }
    }

    fn rule_mut(&mut self) -> &mut dyn PivotRule {
        match self {
            EdgeWeights::Dantzig(rule) => rule,
            EdgeWeights::Devex(rule) => rule,
            EdgeWeights::SteepestEdge(rule) => rule,
        }
    }

    /// Whether exact weights should be computed when the basis is not the identity.
    pub fn wants_exact_weights(&self) -> bool {
        matches!(self, EdgeWeights::SteepestEdge(_))
    }

    /// All weights, if the rule keeps any.
    pub fn weights(&self) -> Option<&[f64]> {
        match self {
            EdgeWeights::Dantzig(_) => None,
            EdgeWeights::Devex(rule) => Some(&rule.weights),
            EdgeWeights::SteepestEdge(rule) => Some(&rule.weights),
        }
    }

    /// Install exactly computed steepest edge weights, ignored by the other rules.
    pub fn set_exact_weights(&mut self, weights: Vec<f64>) {
        if let EdgeWeights::SteepestEdge(rule) = self {
            rule.set_weights(weights);
        }
    }
}

impl PivotRule for EdgeWeights {
    fn choose_row(&self, infeasibilities: &[f64], basic_index: &[usize]) -> Option<usize> {
        self.rule().choose_row(infeasibilities, basic_index)
    }

    fn weight(&self, position: usize) -> f64 {
        self.rule().weight(position)
    }

    fn needs_tau(&self) -> bool {
        self.rule().needs_tau()
    }

    fn update_after_pivot(&mut self, update: &PivotUpdate<'_>) -> WeightStatus {
        self.rule_mut().update_after_pivot(update)
    }

    fn reset_weights(&mut self, m: usize) {
        self.rule_mut().reset_weights(m)
    }
}

#[cfg(test)]
mod test {
    use approx::assert_abs_diff_eq;

    use crate::algorithm::dual_simplex::parameters::PricingRule;
    use crate::algorithm::dual_simplex::strategy::pivot_rule::{Dantzig, Devex, EdgeWeights, PivotRule, PivotUpdate, SteepestEdge, WeightStatus};
    use crate::data::linear_algebra::vector::IndexedVector;

    #[test]
    fn dantzig_ties() {
        let rule = Dantzig;
        assert_eq!(rule.choose_row(&[0_f64, 0_f64], &[0, 1]), None);
        assert_eq!(rule.choose_row(&[0_f64, -2_f64, 1_f64], &[0, 1, 2]), Some(1));
        // Equal scores, the lower variable index wins even at a later position
        assert_eq!(rule.choose_row(&[2_f64, -2_f64], &[7, 3]), Some(1));
    }

    #[test]
    fn weighted_choice() {
        let mut rule = SteepestEdge::new(2);
        rule.set_weights(vec![1_f64, 16_f64]);
        // 1 / 1 versus 9 / 16
        assert_eq!(rule.choose_row(&[1_f64, 3_f64], &[0, 1]), Some(0));
    }

    #[test]
    fn steepest_edge_update() {
        // B = I, the entering column is (1, 2) replacing position 0
        let mut rule = SteepestEdge::new(2);
        let column = IndexedVector::from_tuples(2, vec![(0, 2_f64), (1, 1_f64)]);
        // tau = B^-1 e_0 = e_0
        let tau = IndexedVector::from_tuples(2, vec![(0, 1_f64)]);
        let status = rule.update_after_pivot(&PivotUpdate { position: 0, column: &column, tau: Some(&tau) });
        assert_eq!(status, WeightStatus::Valid);
        // New basis [[2, 0], [1, 1]], inverse [[0.5, 0], [-0.5, 1]]: row norms 0.25 and 1.25
        assert_abs_diff_eq!(rule.weight(0), 1_f64);
        assert_abs_diff_eq!(rule.weight(1), 1.25);
    }

    #[test]
    fn steepest_edge_recompute() {
        let mut weights = EdgeWeights::new(PricingRule::SteepestEdge, 2);
        // A tiny pivot makes the weight of the other position explode
        let column = IndexedVector::from_tuples(2, vec![(0, 1e-11), (1, 1_f64)]);
        let tau = IndexedVector::from_tuples(2, vec![(0, 1_f64)]);
        let status = weights.update_after_pivot(&PivotUpdate { position: 0, column: &column, tau: Some(&tau) });
        assert_eq!(status, WeightStatus::NeedsRecompute);
        assert!(weights.weight(1) > 1e20);

        weights.set_exact_weights(vec![4_f64, 1_f64]);
        assert_eq!(weights.weights(), Some(&[4_f64, 1_f64][..]));
        weights.reset_weights(3);
        assert_eq!(weights.weights(), Some(&[1_f64, 1_f64, 1_f64][..]));
    }

    #[test]
    fn exact_weights_only_for_steepest_edge() {
        let mut weights = EdgeWeights::new(PricingRule::Devex, 2);
        assert!(!weights.wants_exact_weights());
        weights.set_exact_weights(vec![4_f64, 9_f64]);
        assert_eq!(weights.weights(), Some(&[1_f64, 1_f64][..]));
    }

    #[test]
    fn devex_reset() {
        let mut rule = Devex::new(2);
        let column = IndexedVector::from_tuples(2, vec![(0, 1e-4), (1, 1_f64)]);
        rule.update_after_pivot(&PivotUpdate { position: 0, column: &column, tau: None });
        // 1e8 exceeds the reset threshold
        assert_eq!(rule.resets(), 1);
        assert_eq!(rule.weight(1), 1_f64);
    }

    #[test]
    fn tagged() {
        let weights = EdgeWeights::new(PricingRule::Devex, 3);
        assert_eq!(weights.weights(), Some(&[1_f64, 1_f64, 1_f64][..]));
        assert!(!weights.needs_tau());
        assert!(EdgeWeights::new(PricingRule::SteepestEdge, 1).needs_tau());
        assert_eq!(EdgeWeights::new(PricingRule::Dantzig, 1).weights(), None);
    }
}
