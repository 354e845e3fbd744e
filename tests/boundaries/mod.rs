//! # Degenerate shapes
//!
//! Problems without rows, without free variables and with nearly dependent columns.
#[allow(missing_docs)]
mod test;
