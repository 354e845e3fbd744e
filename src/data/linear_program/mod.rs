//! # Representing linear programs
//!
//! Linear programs are given in bounded standard form: rows and columns both carry a lower and an
//! upper bound, either of which may be infinite.
pub mod elements;
pub mod error;
pub mod solution;
pub mod standard_form;

pub use elements::{BoundDirection, BoundType, ObjectiveSense, VariableStatus};
pub use error::InputError;
pub use solution::{Basis, Infeasibilities, InfeasibilitySummary, Solution};
pub use standard_form::{DEFAULT_INFINITY, LinearProgram, LinearProgramBuilder};
