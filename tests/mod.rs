//! # Integration tests
//!
//! Integration tests completely external from the crate. All code written in this module could be
//! written by an external user of the crate.
use relp_dual::data::linear_program::{LinearProgram, LinearProgramBuilder};

mod boundaries;
mod interface;
mod scenarios;

/// The dual of the Klee-Minty problem of dimension `n`.
///
/// The primal problem is `max Σ_j 2^(n - j) x_j` subject to
/// `Σ_(j < i) 2^(i - j + 1) x_j + x_i <= 5^i` and `x >= 0`, whose optimal value is `5^n`. On the
/// dual, Dantzig's rule visits `2^n - 1` bases from the all logical basis.
fn klee_minty_dual(n: usize) -> LinearProgramBuilder {
    let entry = |i: usize, j: usize| {
        if j < i {
            2_f64.powi((i - j + 1) as i32)
        } else if j == i {
            1_f64
        } else {
            0_f64
        }
    };
    // Row j of the dual is column j of the primal
    let rows = (0..n)
        .map(|j| (0..n).map(|i| entry(i, j)).collect())
        .collect::<Vec<Vec<_>>>();

    LinearProgram::builder(n, n)
        .costs((1..=n).map(|i| 5_f64.powi(i as i32)).collect())
        .dense_matrix(&rows)
        .row_bounds(
            (1..=n).map(|j| 2_f64.powi((n - j) as i32)).collect(),
            vec![f64::INFINITY; n],
        )
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
