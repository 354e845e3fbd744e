//! # Linear algebra primitives
//!
//! Linear algebra primitives used to represent data in either a dense or a sparse format.

pub mod matrix;
pub mod vector;

/// A single entry of a sparse vector or of a sparse matrix column or row.
pub type SparseTuple<F> = (usize, F);
