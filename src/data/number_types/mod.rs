//! # Number types
//!
//! The engine computes in `f64`. This module collects the helpers that decide when two floating
//! point values are "the same" and how infinite bounds are represented.
pub mod float;
