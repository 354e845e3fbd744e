//! # Algorithms
//!
//! Entry points for solving a linear program with the dual simplex method.
use std::fmt;

use thiserror::Error;

use crate::algorithm::dual_simplex::Driver;
use crate::algorithm::dual_simplex::parameters::{ParameterError, Parameters};
use crate::data::linear_program::{Basis, InputError, LinearProgram, Solution};

pub mod dual_simplex;

/// How a solve terminated.
///
/// These are all regular outcomes of the algorithm, the final iterate is reported with each of
/// them.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum SolveStatus {
    /// An optimal basis was found.
    Optimal,
    /// No point satisfies all bounds, a dual ray proves it.
    PrimalInfeasible,
    /// The objective is unbounded (or no dual feasible basis exists), a primal ray proves it.
    DualInfeasible,
    /// The iteration limit was reached.
    IterationLimit,
    /// The time limit was reached.
    TimeLimit,
    /// The interrupt flag was raised.
    UserInterrupt,
    /// All recovery strategies failed.
    NumericalError,
    /// Memory for the factorization could not be allocated.
    OutOfMemory,
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::PrimalInfeasible => "primal infeasible",
            SolveStatus::DualInfeasible => "dual infeasible",
            SolveStatus::IterationLimit => "iteration limit",
            SolveStatus::TimeLimit => "time limit",
            SolveStatus::UserInterrupt => "user interrupt",
            SolveStatus::NumericalError => "numerical error",
            SolveStatus::OutOfMemory => "out of memory",
        })
    }
}

/// Rejection of the input of a solve.
#[derive(Error, Clone, Debug, PartialEq)]
pub enum SolveError {
    /// The problem or initial basis is invalid.
    #[error(transparent)]
    Input(#[from] InputError),
    /// A parameter is out of range.
    #[error(transparent)]
    Parameter(#[from] ParameterError),
}

/// Solve a linear program from the all logical basis.
///
/// # Return value
///
/// The final iterate with its status, or an error if the input was rejected before starting.
pub fn solve(lp: &LinearProgram, parameters: &Parameters) -> Result<Solution, SolveError> {
    solve_with_basis(lp, &Basis::slack(lp), parameters)
}

/// Solve a linear program starting from a given basis.
///
/// # Arguments
///
/// * `lp`: Problem to solve.
/// * `basis`: Initial basis, typically taken from an earlier `Solution`. If it turns out to be
/// singular, offending columns are replaced by logical variables.
/// * `parameters`: Tolerances, limits and strategy choices.
pub fn solve_with_basis(
    lp: &LinearProgram,
    basis: &Basis,
    parameters: &Parameters,
) -> Result<Solution, SolveError> {
    parameters.validate()?;
    basis.validate(lp)?;

    Ok(Driver::new(lp, basis, parameters).solve())
}
