use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use approx::assert_relative_eq;

use relp_dual::algorithm::{SolveError, SolveStatus, solve, solve_with_basis};
use relp_dual::algorithm::dual_simplex::{ParameterError, Parameters, PricingRule};
use relp_dual::data::linear_program::{Basis, InputError, LinearProgram, VariableStatus};

use crate::{init_logging, klee_minty_dual};

#[test]
fn warm_start_after_cost_change() {
    init_logging();
    let n = 5;
    let lp = klee_minty_dual(n).build().unwrap();
    let parameters = Parameters::default();
    let first = solve(&lp, &parameters).unwrap();
    assert_eq!(first.status(), SolveStatus::Optimal);

    // Making a nonbasic column more expensive keeps the basis optimal
    let column = first.basis().columns().iter()
        .position(|&status| status == VariableStatus::AtLower)
        .unwrap();
    let mut costs = lp.costs().to_vec();
    costs[column] += 1_f64;
    let changed = klee_minty_dual(n).costs(costs).build().unwrap();

    let cold = solve(&changed, &parameters).unwrap();
    let warm = solve_with_basis(&changed, first.basis(), &parameters).unwrap();
    assert_eq!(cold.status(), SolveStatus::Optimal);
    assert_eq!(warm.status(), SolveStatus::Optimal);
    assert!(cold.statistics().iterations > 0);
    assert!((warm.statistics().iterations as f64) < 0.1 * cold.statistics().iterations as f64);
    assert_relative_eq!(warm.objective_value(), cold.objective_value(), max_relative = 1e-9);
}

#[test]
fn warm_start_with_added_column() {
    let lp = LinearProgram::builder(1, 2)
        .costs(vec![1_f64, 2_f64])
        .dense_matrix(&[vec![1_f64, 1_f64]])
        .row_bounds(vec![1_f64], vec![f64::INFINITY])
        .build()
        .unwrap();
    let first = solve(&lp, &Parameters::default()).unwrap();
    assert_eq!(first.status(), SolveStatus::Optimal);

    let extended = LinearProgram::builder(1, 3)
        .costs(vec![1_f64, 2_f64, 3_f64])
        .dense_matrix(&[vec![1_f64, 1_f64, 1_f64]])
        .row_bounds(vec![1_f64], vec![f64::INFINITY])
        .build()
        .unwrap();
    let mut basis = first.basis().clone();
    basis.append_nonbasic_columns(&[0_f64], &[f64::INFINITY]);

    let second = solve_with_basis(&extended, &basis, &Parameters::default()).unwrap();
    assert_eq!(second.status(), SolveStatus::Optimal);
    assert_eq!(second.statistics().iterations, 0);
    assert_relative_eq!(second.objective_value(), 1_f64, max_relative = 1e-12);
}

#[test]
fn warm_start_with_added_row() {
    let lp = LinearProgram::builder(1, 2)
        .costs(vec![1_f64, 2_f64])
        .dense_matrix(&[vec![1_f64, 1_f64]])
        .row_bounds(vec![1_f64], vec![f64::INFINITY])
        .build()
        .unwrap();
    let first = solve(&lp, &Parameters::default()).unwrap();

    // The new row x <= 0.5 cuts off the optimum
    let extended = LinearProgram::builder(2, 2)
        .costs(vec![1_f64, 2_f64])
        .dense_matrix(&[vec![1_f64, 1_f64], vec![1_f64, 0_f64]])
        .row_bounds(vec![1_f64, f64::NEG_INFINITY], vec![f64::INFINITY, 0.5])
        .build()
        .unwrap();
    let mut basis = first.basis().clone();
    basis.append_basic_rows(1);

    let second = solve_with_basis(&extended, &basis, &Parameters::default()).unwrap();
    assert_eq!(second.status(), SolveStatus::Optimal);
    assert_eq!(second.statistics().phase_one_iterations, 0);
    assert_eq!(second.statistics().iterations, 1);
    assert_relative_eq!(second.objective_value(), 1.5, max_relative = 1e-9);
}

#[test]
fn interrupt() {
    let lp = klee_minty_dual(3).build().unwrap();
    let flag = Arc::new(AtomicBool::new(true));
    let parameters = Parameters::default().with_interrupt(flag);

    let solution = solve(&lp, &parameters).unwrap();
    assert_eq!(solution.status(), SolveStatus::UserInterrupt);
    assert_eq!(solution.statistics().iterations, 0);
    assert_eq!(solution.column_values().len(), 3);
    assert_eq!(solution.basis().nr_basic(), 3);
}

#[test]
fn time_limit() {
    let lp = klee_minty_dual(3).build().unwrap();
    let parameters = Parameters::default().with_time_limit(Duration::ZERO);

    let solution = solve(&lp, &parameters).unwrap();
    assert_eq!(solution.status(), SolveStatus::TimeLimit);
}

#[test]
fn iteration_limit() {
    let lp = klee_minty_dual(5).build().unwrap();
    let parameters = Parameters::default()
        .with_pricing_rule(PricingRule::Dantzig)
        .with_perturbation(false)
        .with_iteration_limit(3);

    let solution = solve(&lp, &parameters).unwrap();
    assert_eq!(solution.status(), SolveStatus::IterationLimit);
    assert_eq!(solution.statistics().iterations, 3);
    assert_eq!(solution.infeasibilities().dual.count, 0);
}

#[test]
fn invalid_parameters() {
    let lp = klee_minty_dual(2).build().unwrap();
    let cases = [
        Parameters::default().with_dual_feasibility_tolerance(0_f64),
        Parameters::default().with_density_threshold(1.5),
        Parameters::default().with_pivot_threshold(0.9, 0.5),
        Parameters::default().with_refactor_frequency(0, 2_f64),
    ];
    for parameters in cases {
        assert!(matches!(solve(&lp, &parameters), Err(SolveError::Parameter(_))));
    }
    assert!(matches!(
        solve(&lp, &Parameters::default().with_pivot_threshold(0.9, 0.5)),
        Err(SolveError::Parameter(ParameterError::ThresholdCeiling { .. })),
    ));
}

#[test]
fn invalid_input() {
    let builder = LinearProgram::builder(1, 2)
        .costs(vec![1_f64, 1_f64])
        .dense_matrix(&[vec![1_f64, 1_f64]]);
    assert!(matches!(
        builder.clone().column_bounds(vec![1_f64, 0_f64], vec![0_f64, 1_f64]).build(),
        Err(InputError::NonMonotoneBounds { index: 0, .. }),
    ));
    assert!(matches!(
        builder.clone().costs(vec![f64::NAN, 1_f64]).build(),
        Err(InputError::NonFiniteCost { column: 0, .. }),
    ));
    assert!(matches!(
        builder.clone().matrix(vec![0, 1, 2], vec![0, 1], vec![1_f64, 1_f64]).build(),
        Err(InputError::IndexOutOfRange { column: 1, row: 1, nr_rows: 1 }),
    ));
    assert!(matches!(
        builder.clone().row_bounds(vec![f64::INFINITY], vec![f64::INFINITY]).build(),
        Err(InputError::InvalidBound { .. }),
    ));

    let lp = builder.build().unwrap();
    let basis = Basis::new(vec![VariableStatus::AtLower; 2], vec![VariableStatus::AtLower]);
    assert!(matches!(
        solve_with_basis(&lp, &basis, &Parameters::default()),
        Err(SolveError::Input(InputError::BasisCount { expected: 1, found: 0 })),
    ));
}

#[test]
fn finite_infinity() {
    init_logging();
    // Bounds of magnitude 1e6 and beyond are infinite
    let lp = LinearProgram::builder(1, 1)
        .costs(vec![1_f64])
        .dense_matrix(&[vec![1_f64]])
        .column_bounds(vec![-1e6], vec![1e6])
        .row_bounds(vec![2_f64], vec![1e7])
        .infinity(1e6)
        .build()
        .unwrap();
    assert_eq!(lp.column_lower(), &[f64::NEG_INFINITY]);
    assert_eq!(lp.row_upper(), &[f64::INFINITY]);

    let solution = solve(&lp, &Parameters::default()).unwrap();
    assert_eq!(solution.status(), SolveStatus::Optimal);
    assert_relative_eq!(solution.objective_value(), 2_f64, max_relative = 1e-12);
}
