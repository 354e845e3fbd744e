//! # A dual revised simplex engine
//!
//! Linear programs in bounded standard form are solved with the dual simplex method, using a
//! sparse LU factorization of the basis that is kept up to date with Forrest & Tomlin updates
//! between refactorizations.
//!
//! The entry points are [`algorithm::solve`] and [`algorithm::solve_with_basis`].
#![warn(missing_docs)]

pub mod algorithm;
pub mod data;
