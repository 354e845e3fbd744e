//! # Bound flipping ratio test
//!
//! Determines the entering variable and the dual step length. Candidates are nonbasic variables
//! whose reduced cost moves towards the wrong sign as the dual step grows. Passing the breakpoint
//! of a candidate with two finite bounds is allowed when the variable moves to its other bound,
//! which costs `|α_j| (u_j - l_j)` of the slope of the dual objective. The step stops at the
//! breakpoint where the slope would turn negative.
//!
//! Breakpoints are processed in groups, each formed with the Harris relaxation: the largest step
//! that keeps every remaining candidate dual feasible within the tolerance is computed, and all
//! candidates with a breakpoint below it form the group. Within the final group, the candidate
//! with the largest `|α_j|` enters. A group whose slope falls short of the remaining slope only by
//! rounding error is accepted as the final group.

/// A nonbasic variable that limits the dual step.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Candidate {
    /// Variable index.
    pub variable: usize,
    /// `|α_j|`, the magnitude of the pivot row entry.
    pub alpha: f64,
    /// Dual step at which the reduced cost reaches zero, `|d_j| / |α_j|` with the sign such that a
    /// reduced cost that is already infeasible gives a negative value.
    pub ratio: f64,
    /// `u_j - l_j`, infinite unless both bounds are finite.
    pub range: f64,
}

/// Outcome of the ratio test.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum RatioTestResult {
    /// A variable enters the basis, after the variables in `BoundFlippingRatioTest::flips` move to
    /// their other bound.
    Entering {
        /// Index of the entering variable.
        variable: usize,
        /// `|α_q|`.
        alpha: f64,
        /// Nonnegative dual step length.
        step: f64,
    },
    /// The dual objective grows without bound along the dual ray.
    Unbounded,
}

/// Buffers of the bound flipping ratio test, reused between iterations.
#[derive(Clone, Debug, Default)]
pub struct BoundFlippingRatioTest {
    candidates: Vec<Candidate>,
    flips: Vec<usize>,
}

impl BoundFlippingRatioTest {
    /// Forget the candidates and flips of the previous iteration.
    pub fn clear(&mut self) {
        self.candidates.clear();
        self.flips.clear();
    }

    /// Register a variable limiting the step.
    pub fn push(&mut self, candidate: Candidate) {
        debug_assert!(candidate.alpha > 0_f64);

        self.candidates.push(candidate);
    }

    /// Variables that should move to their other bound, as found by the last `run`.
    pub fn flips(&self) -> &[usize] {
        &self.flips
    }

    /// Perform the bound flipping ratio test on the registered candidates.
    ///
    /// The candidates are reordered in place, grouped by breakpoint.
    ///
    /// # Arguments
    ///
    /// * `slope`: Initial slope of the dual objective, the primal infeasibility `|δ_p|`.
    /// * `dual_tolerance`: Relaxation used for the Harris bound.
    /// * `primal_tolerance`: Relative amount by which a group's slope may fall short of the
    /// remaining slope and still stop the step.
    ///
    /// # Return value
    ///
    /// The entering variable with the step, or `Unbounded` if the slope stays positive past all
    /// breakpoints.
    pub fn run(&mut self, mut slope: f64, dual_tolerance: f64, primal_tolerance: f64) -> RatioTestResult {
        debug_assert!(slope > 0_f64);

        self.flips.clear();
        let mut start = 0;
        while start < self.candidates.len() {
            let remaining = &mut self.candidates[start..];
            let max_step = remaining.iter()
                .map(|candidate| candidate.ratio + dual_tolerance / candidate.alpha)
                .fold(f64::INFINITY, f64::min);

            // Move the group to the front of the remaining candidates
            let mut end = 0;
            for k in 0..remaining.len() {
                if remaining[k].ratio <= max_step {
                    remaining.swap(end, k);
                    end += 1;
                }
            }
            debug_assert!(end > 0);
            let group = &remaining[..end];

            let group_slope = group.iter()
                .map(|candidate| candidate.alpha * candidate.range)
                .sum::<f64>();
            if group_slope >= slope - primal_tolerance * (1_f64 + slope) {
                return choose_entering(group);
            }

            slope -= group_slope;
            self.flips.extend(group.iter().map(|candidate| candidate.variable));
            start += end;
        }

        RatioTestResult::Unbounded
    }
}

/// Select the candidate with the largest `|α_j|`, ties broken by lowest index.
fn choose_entering(group: &[Candidate]) -> RatioTestResult {
    let mut best = group[0];
    for &candidate in &group[1..] {
        if candidate.alpha > best.alpha || (candidate.alpha == best.alpha && candidate.variable < best.variable) {
            best = candidate;
        }
    }

    RatioTestResult::Entering {
        variable: best.variable,
        alpha: best.alpha,
        step: best.ratio.max(0_f64),
    }
}

#[cfg(test)]
mod test {
    use crate::algorithm::dual_simplex::ratio_test::{BoundFlippingRatioTest, Candidate, RatioTestResult};

    fn candidate(variable: usize, alpha: f64, ratio: f64, range: f64) -> Candidate {
        Candidate { variable, alpha, ratio, range }
    }

    fn run(candidates: &[Candidate], slope: f64) -> (RatioTestResult, Vec<usize>) {
        let mut ratio_test = BoundFlippingRatioTest::default();
        for &candidate in candidates {
            ratio_test.push(candidate);
        }
        let result = ratio_test.run(slope, 1e-7, 1e-7);

        (result, ratio_test.flips().to_vec())
    }

    #[test]
    fn no_candidates() {
        assert_eq!(run(&[], 1_f64).0, RatioTestResult::Unbounded);
    }

    #[test]
    fn smallest_ratio() {
        let candidates = [
            candidate(0, 1_f64, 2_f64, f64::INFINITY),
            candidate(1, 1_f64, 1_f64, f64::INFINITY),
        ];
        match run(&candidates, 1_f64) {
            (RatioTestResult::Entering { variable, step, .. }, flips) => {
                assert_eq!(variable, 1);
                assert_eq!(step, 1_f64);
                assert!(flips.is_empty());
            },
            _ => assert!(false),
        }
    }

    #[test]
    fn harris_prefers_large_pivot() {
        // Both breakpoints are within the tolerance of each other
        let candidates = [
            candidate(3, 1e-3, 0_f64, f64::INFINITY),
            candidate(5, 1_f64, 1e-9, f64::INFINITY),
        ];
        match run(&candidates, 1_f64).0 {
            RatioTestResult::Entering { variable, .. } => assert_eq!(variable, 5),
            _ => assert!(false),
        }
    }

    #[test]
    fn tie_lowest_index() {
        let candidates = [
            candidate(4, 2_f64, 1_f64, f64::INFINITY),
            candidate(2, 2_f64, 1_f64, f64::INFINITY),
        ];
        match run(&candidates, 1_f64).0 {
            RatioTestResult::Entering { variable, .. } => assert_eq!(variable, 2),
            _ => assert!(false),
        }
    }

    #[test]
    fn flips_boxed() {
        // Slope 3: passing variable 0 costs 1 * 2, passing variable 1 would cost 2 * 1
        let candidates = [
            candidate(0, 1_f64, 1_f64, 2_f64),
            candidate(1, 2_f64, 2_f64, 1_f64),
            candidate(2, 1_f64, 3_f64, f64::INFINITY),
        ];
        match run(&candidates, 3_f64) {
            (RatioTestResult::Entering { variable, step, .. }, flips) => {
                assert_eq!(variable, 1);
                assert_eq!(step, 2_f64);
                assert_eq!(flips, vec![0]);
            },
            _ => assert!(false),
        }
    }

    #[test]
    fn unbounded_after_flips() {
        let candidates = [candidate(0, 1_f64, 1_f64, 1_f64)];
        assert_eq!(run(&candidates, 5_f64).0, RatioTestResult::Unbounded);
    }

    #[test]
    fn slope_equal_up_to_rounding() {
        // The remaining slope exceeds the group slope by a few ulps only
        let candidates = [candidate(13, 1_f64, 0.2, 1_f64)];
        match run(&candidates, 1.0000000000000018) {
            (RatioTestResult::Entering { variable, step, .. }, flips) => {
                assert_eq!(variable, 13);
                assert_eq!(step, 0.2);
                assert!(flips.is_empty());
            },
            _ => assert!(false),
        }
    }

    #[test]
    fn slope_clearly_larger_flips() {
        let candidates = [
            candidate(13, 1_f64, 0.2, 1_f64),
            candidate(7, 1_f64, 0.5, f64::INFINITY),
        ];
        match run(&candidates, 1.001) {
            (RatioTestResult::Entering { variable, step, .. }, flips) => {
                assert_eq!(variable, 7);
                assert_eq!(step, 0.5);
                assert_eq!(flips, vec![13]);
            },
            _ => assert!(false),
        }
    }

    #[test]
    fn buffers_reused() {
        let mut ratio_test = BoundFlippingRatioTest::default();
        ratio_test.push(candidate(0, 1_f64, 1_f64, 1_f64));
        ratio_test.push(candidate(1, 1_f64, 2_f64, f64::INFINITY));
        assert!(matches!(ratio_test.run(3_f64, 1e-7, 1e-7), RatioTestResult::Entering { variable: 1, .. }));
        assert_eq!(ratio_test.flips(), &[0]);

        ratio_test.clear();
        assert!(ratio_test.flips().is_empty());
        ratio_test.push(candidate(4, 1_f64, 1_f64, f64::INFINITY));
        assert!(matches!(ratio_test.run(3_f64, 1e-7, 1e-7), RatioTestResult::Entering { variable: 4, .. }));
        assert!(ratio_test.flips().is_empty());
    }

    #[test]
    fn negative_ratio_gives_zero_step() {
        let candidates = [candidate(0, 1_f64, -1e-8, f64::INFINITY)];
        match run(&candidates, 1_f64).0 {
            RatioTestResult::Entering { step, .. } => assert_eq!(step, 0_f64),
            _ => assert!(false),
        }
    }
}
