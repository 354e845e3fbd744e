use approx::assert_relative_eq;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use relp_dual::algorithm::{SolveStatus, solve};
use relp_dual::algorithm::dual_simplex::{Parameters, PricingRule};
use relp_dual::data::linear_program::{LinearProgram, ObjectiveSense, VariableStatus};

use crate::{init_logging, klee_minty_dual};

#[test]
fn tiny() {
    init_logging();
    // min x + y subject to x + y >= 1
    let lp = LinearProgram::builder(1, 2)
        .costs(vec![1_f64, 1_f64])
        .dense_matrix(&[vec![1_f64, 1_f64]])
        .row_bounds(vec![1_f64], vec![f64::INFINITY])
        .build()
        .unwrap();

    let solution = solve(&lp, &Parameters::default()).unwrap();
    assert_eq!(solution.status(), SolveStatus::Optimal);
    assert_eq!(solution.statistics().iterations, 1);
    assert_eq!(solution.statistics().phase_one_iterations, 0);
    assert_relative_eq!(solution.objective_value(), 1_f64, max_relative = 1e-12);
    assert_relative_eq!(solution.column_values().iter().sum::<f64>(), 1_f64, max_relative = 1e-12);
    assert_relative_eq!(solution.row_values()[0], 1_f64, max_relative = 1e-12);
    assert_relative_eq!(solution.row_duals()[0], 1_f64, max_relative = 1e-12);
    assert_eq!(solution.infeasibilities().primal.count, 0);
    assert_eq!(solution.infeasibilities().dual.count, 0);
    assert!(solution.dual_ray().is_none());
    assert!(solution.primal_ray().is_none());
}

#[test]
fn infeasible() {
    init_logging();
    // x <= -1 and x >= 1, x free
    let lp = LinearProgram::builder(2, 1)
        .costs(vec![1_f64])
        .dense_matrix(&[vec![1_f64], vec![1_f64]])
        .column_bounds(vec![f64::NEG_INFINITY], vec![f64::INFINITY])
        .row_bounds(vec![f64::NEG_INFINITY, 1_f64], vec![-1_f64, f64::INFINITY])
        .build()
        .unwrap();

    let solution = solve(&lp, &Parameters::default()).unwrap();
    assert_eq!(solution.status(), SolveStatus::PrimalInfeasible);
    let y = solution.dual_ray().unwrap();
    assert_eq!(y.len(), 2);
    // y^T A vanishes on the free column
    assert!((y[0] + y[1]).abs() < 1e-9 * y[0].abs().max(y[1].abs()));
    // while min { y^T r | r within the row bounds } is positive
    assert!(y[0] < 0_f64 && y[1] > 0_f64);
    assert!(y[0] * -1_f64 + y[1] * 1_f64 > 0_f64);
    assert!(solution.primal_ray().is_none());
}

#[test]
fn unbounded() {
    init_logging();
    // min -x subject to -x <= 0 and x >= 0
    let lp = LinearProgram::builder(1, 1)
        .costs(vec![-1_f64])
        .dense_matrix(&[vec![-1_f64]])
        .row_bounds(vec![f64::NEG_INFINITY], vec![0_f64])
        .build()
        .unwrap();

    let solution = solve(&lp, &Parameters::default()).unwrap();
    assert_eq!(solution.status(), SolveStatus::DualInfeasible);
    let d = solution.primal_ray().unwrap();
    assert_eq!(d, &[1_f64]);
    assert!(lp.row_activities(d)[0] <= 0_f64);
    assert!(lp.objective_value(d) < 0_f64);
    assert!(solution.dual_ray().is_none());
}

#[test]
fn maximize() {
    init_logging();
    // max x + y subject to x + 2y <= 4, 3x + y <= 6
    let lp = LinearProgram::builder(2, 2)
        .sense(ObjectiveSense::Maximize)
        .costs(vec![1_f64, 1_f64])
        .dense_matrix(&[vec![1_f64, 2_f64], vec![3_f64, 1_f64]])
        .row_bounds(vec![f64::NEG_INFINITY; 2], vec![4_f64, 6_f64])
        .build()
        .unwrap();

    let solution = solve(&lp, &Parameters::default()).unwrap();
    assert_eq!(solution.status(), SolveStatus::Optimal);
    assert_relative_eq!(solution.objective_value(), 2.8, max_relative = 1e-9);
    assert_relative_eq!(solution.column_values()[0], 1.6, max_relative = 1e-9);
    assert_relative_eq!(solution.column_values()[1], 1.2, max_relative = 1e-9);
    assert_relative_eq!(solution.row_values()[0], 4_f64, max_relative = 1e-9);
    assert_relative_eq!(solution.row_values()[1], 6_f64, max_relative = 1e-9);
    // Shadow prices of the caller's problem
    assert_relative_eq!(solution.row_duals()[0], 0.4, max_relative = 1e-9);
    assert_relative_eq!(solution.row_duals()[1], 0.2, max_relative = 1e-9);
    assert!(solution.column_duals().iter().all(|d| d.abs() < 1e-9));
    assert_eq!(solution.basis().columns(), &[VariableStatus::Basic; 2]);
    assert_eq!(solution.basis().rows(), &[VariableStatus::AtUpper; 2]);
}

#[test]
fn offset() {
    let lp = LinearProgram::builder(1, 2)
        .offset(10_f64)
        .costs(vec![1_f64, 2_f64])
        .dense_matrix(&[vec![1_f64, 1_f64]])
        .row_bounds(vec![3_f64], vec![f64::INFINITY])
        .build()
        .unwrap();

    let solution = solve(&lp, &Parameters::default()).unwrap();
    assert_eq!(solution.status(), SolveStatus::Optimal);
    assert_relative_eq!(solution.objective_value(), 13_f64, max_relative = 1e-12);
    assert_relative_eq!(solution.column_values()[0], 3_f64, max_relative = 1e-12);
}

#[test]
fn klee_minty_pricing() {
    init_logging();
    let n = 5;
    let lp = klee_minty_dual(n).build().unwrap();
    let iterations = |rule| {
        let parameters = Parameters::default()
            .with_pricing_rule(rule)
            .with_perturbation(false);
        let solution = solve(&lp, &parameters).unwrap();
        assert_eq!(solution.status(), SolveStatus::Optimal);
        assert_relative_eq!(solution.objective_value(), 3125_f64, max_relative = 1e-9);
        solution.statistics().iterations
    };

    let dantzig = iterations(PricingRule::Dantzig);
    let devex = iterations(PricingRule::Devex);
    let steepest_edge = iterations(PricingRule::SteepestEdge);

    assert_eq!(dantzig, 2_usize.pow(n as u32) - 1);
    assert!(steepest_edge <= 2 * n);
    assert!(devex <= 2 * n);
    assert!(2 * steepest_edge < dantzig);
}

#[test]
fn refactor_every_iteration() {
    init_logging();
    let lp = klee_minty_dual(5).build().unwrap();
    let parameters = Parameters::default()
        .with_pricing_rule(PricingRule::Dantzig)
        .with_perturbation(false)
        .with_objective_trace(true);

    let updated = solve(&lp, &parameters).unwrap();
    let fresh = solve(&lp, &parameters.clone().with_refactor_frequency(1, 1.5)).unwrap();

    assert_eq!(updated.status(), SolveStatus::Optimal);
    assert_eq!(fresh.status(), SolveStatus::Optimal);
    let updated = updated.statistics();
    let fresh = fresh.statistics();
    assert_eq!(updated.iterations, fresh.iterations);
    assert!(fresh.refactorizations > updated.refactorizations);
    assert!(fresh.refactorizations >= fresh.iterations);
    assert_eq!(updated.objective_trace.len(), updated.iterations);
    assert_eq!(updated.objective_trace.len(), fresh.objective_trace.len());
    for (a, b) in updated.objective_trace.iter().zip(&fresh.objective_trace) {
        assert_relative_eq!(*a, *b, max_relative = 1e-9, epsilon = 1e-9);
    }
    // The dual objective doesn't decrease
    for window in updated.objective_trace.windows(2) {
        assert!(window[1] >= window[0] - 1e-9 * window[0].abs().max(1_f64));
    }
}

/// A problem with a known feasible point, bounded because every column either has two finite
/// bounds or a positive cost and a finite lower bound.
fn random_feasible(rng: &mut ChaCha8Rng, m: usize, n: usize) -> LinearProgram {
    let rows = (0..m)
        .map(|_| (0..n)
            .map(|_| if rng.gen_bool(0.4) { rng.gen_range(-1_f64..1_f64) } else { 0_f64 })
            .collect::<Vec<_>>())
        .collect::<Vec<_>>();

    let mut costs = Vec::with_capacity(n);
    let mut lower = Vec::with_capacity(n);
    let mut upper = Vec::with_capacity(n);
    for j in 0..n {
        lower.push(rng.gen_range(-2_f64..0_f64));
        if j % 4 == 3 {
            upper.push(f64::INFINITY);
            costs.push(rng.gen_range(0.1..1_f64));
        } else {
            upper.push(rng.gen_range(0_f64..2_f64));
            costs.push(rng.gen_range(-1_f64..1_f64));
        }
    }
    let point = (0..n)
        .map(|j| lower[j] + rng.gen_range(0_f64..1_f64) * (upper[j].min(lower[j] + 2_f64) - lower[j]))
        .collect::<Vec<_>>();

    let mut row_lower = Vec::with_capacity(m);
    let mut row_upper = Vec::with_capacity(m);
    for row in &rows {
        let activity = row.iter().zip(&point).map(|(a, x)| a * x).sum::<f64>();
        match rng.gen_range(0..3) {
            0 => {
                row_lower.push(activity - rng.gen_range(0_f64..1_f64));
                row_upper.push(f64::INFINITY);
            },
            1 => {
                row_lower.push(f64::NEG_INFINITY);
                row_upper.push(activity + rng.gen_range(0_f64..1_f64));
            },
            _ => {
                row_lower.push(activity - rng.gen_range(0_f64..0.5));
                row_upper.push(activity + rng.gen_range(0_f64..0.5));
            },
        }
    }

    LinearProgram::builder(m, n)
        .costs(costs)
        .dense_matrix(&rows)
        .column_bounds(lower, upper)
        .row_bounds(row_lower, row_upper)
        .build()
        .unwrap()
}

#[test]
fn pricing_rules_agree_on_random_problems() {
    init_logging();
    let mut rng = ChaCha8Rng::seed_from_u64(0x5eed);

    for _ in 0..20 {
        let lp = random_feasible(&mut rng, 8, 12);
        let mut objectives = Vec::new();
        for rule in [PricingRule::Dantzig, PricingRule::Devex, PricingRule::SteepestEdge] {
            let solution = solve(&lp, &Parameters::default().with_pricing_rule(rule)).unwrap();
            assert_eq!(solution.status(), SolveStatus::Optimal);

            for (j, &x) in solution.column_values().iter().enumerate() {
                assert!(x >= lp.column_lower()[j] - 1e-6 && x <= lp.column_upper()[j] + 1e-6);
            }
            for (i, &r) in solution.row_values().iter().enumerate() {
                assert!(r >= lp.row_lower()[i] - 1e-6 && r <= lp.row_upper()[i] + 1e-6);
            }
            objectives.push(solution.objective_value());
        }

        assert_relative_eq!(objectives[0], objectives[1], max_relative = 1e-7, epsilon = 1e-7);
        assert_relative_eq!(objectives[0], objectives[2], max_relative = 1e-7, epsilon = 1e-7);
    }
}

#[test]
fn residuals_stay_small() {
    init_logging();
    let mut rng = ChaCha8Rng::seed_from_u64(17);
    let parameters = Parameters::default();
    let tolerance = parameters.primal_feasibility_tolerance;

    let problems = [klee_minty_dual(6).build().unwrap(), random_feasible(&mut rng, 10, 15)];
    for lp in &problems {
        let solution = solve(lp, &parameters).unwrap();
        assert_eq!(solution.status(), SolveStatus::Optimal);
        // Both are measured relative to the size of the right-hand side
        let statistics = solution.statistics();
        assert!(statistics.refactorizations >= 1);
        assert!(statistics.max_primal_residual <= tolerance, "{}", statistics.max_primal_residual);
        assert!(statistics.max_dual_residual <= tolerance, "{}", statistics.max_dual_residual);
    }
}
