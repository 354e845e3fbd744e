//! # Strategies
//!
//! Decisions the dual simplex method can make in different ways.
pub mod pivot_rule;
