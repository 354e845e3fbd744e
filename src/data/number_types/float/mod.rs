//! # Floating point numbers
//!
//! Correctness guarantees are impossible to give due to accumulating rounding errors, so every
//! comparison in the engine goes through a tolerance. The helpers here are shared by the
//! factorization and the simplex driver.
pub mod numerical_precision;
