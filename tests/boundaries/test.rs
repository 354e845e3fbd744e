use approx::assert_relative_eq;

use relp_dual::algorithm::{SolveStatus, solve, solve_with_basis};
use relp_dual::algorithm::dual_simplex::{NumericalEvent, Parameters};
use relp_dual::data::linear_program::{Basis, LinearProgram, VariableStatus};

use crate::{init_logging, klee_minty_dual};

#[test]
fn no_rows() {
    init_logging();
    let lp = LinearProgram::builder(0, 4)
        .costs(vec![-1_f64, 2_f64, 1_f64, 0_f64])
        .column_bounds(
            vec![0_f64, -2_f64, 1_f64, f64::NEG_INFINITY],
            vec![4_f64, 3_f64, f64::INFINITY, f64::INFINITY],
        )
        .build()
        .unwrap();

    let solution = solve(&lp, &Parameters::default()).unwrap();
    assert_eq!(solution.status(), SolveStatus::Optimal);
    assert_eq!(solution.statistics().iterations, 0);
    assert_eq!(solution.column_values(), &[4_f64, -2_f64, 1_f64, 0_f64]);
    assert_eq!(solution.objective_value(), -7_f64);
    assert_eq!(solution.column_duals(), &[-1_f64, 2_f64, 1_f64, 0_f64]);
    assert!(solution.row_values().is_empty());
    assert!(solution.basic_index().is_empty());
    assert_eq!(
        solution.basis().columns(),
        &[VariableStatus::AtUpper, VariableStatus::AtLower, VariableStatus::AtLower, VariableStatus::Free],
    );
}

#[test]
fn all_fixed() {
    init_logging();
    let lp = LinearProgram::builder(1, 2)
        .costs(vec![1_f64, -1_f64])
        .dense_matrix(&[vec![1_f64, 1_f64]])
        .column_bounds(vec![1_f64, 2_f64], vec![1_f64, 2_f64])
        .row_bounds(vec![0_f64], vec![5_f64])
        .build()
        .unwrap();

    let solution = solve(&lp, &Parameters::default()).unwrap();
    assert_eq!(solution.status(), SolveStatus::Optimal);
    assert_eq!(solution.statistics().iterations, 0);
    assert_eq!(solution.statistics().refactorizations, 1);
    assert_eq!(solution.objective_value(), -1_f64);
    assert_eq!(solution.row_values(), &[3_f64]);
    assert_eq!(solution.basis().columns(), &[VariableStatus::Fixed; 2]);
}

#[test]
fn reload_optimal_basis() {
    init_logging();
    let lp = klee_minty_dual(4).build().unwrap();
    let parameters = Parameters::default();

    let cold = solve(&lp, &parameters).unwrap();
    assert_eq!(cold.status(), SolveStatus::Optimal);
    assert!(cold.statistics().iterations > 0);

    let warm = solve_with_basis(&lp, cold.basis(), &parameters).unwrap();
    assert_eq!(warm.status(), SolveStatus::Optimal);
    assert_eq!(warm.statistics().iterations, 0);
    assert_eq!(warm.statistics().phase_one_iterations, 0);
    assert_relative_eq!(warm.objective_value(), cold.objective_value(), max_relative = 1e-12);
    assert_relative_eq!(warm.objective_value(), 625_f64, max_relative = 1e-9);
}

#[test]
fn nearly_dependent_columns() {
    init_logging();
    let lp = LinearProgram::builder(2, 2)
        .costs(vec![1_f64, 1_f64])
        .dense_matrix(&[vec![1_f64, 1_f64], vec![1_f64, 1_f64 + 1e-13]])
        .row_bounds(vec![1_f64, 1_f64], vec![10_f64, 10_f64])
        .build()
        .unwrap();
    let basis = Basis::new(vec![VariableStatus::Basic; 2], vec![VariableStatus::AtLower; 2]);

    let solution = solve_with_basis(&lp, &basis, &Parameters::default()).unwrap();
    assert_eq!(solution.status(), SolveStatus::Optimal);
    assert!(solution.statistics().event_count(NumericalEvent::SingularBasis) > 0);
    assert_relative_eq!(solution.objective_value(), 1_f64, max_relative = 1e-9);
    assert_eq!(solution.infeasibilities().primal.count, 0);
}
