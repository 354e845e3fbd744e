//! # Input errors
//!
//! Problems and initial bases are validated once at entry. Beyond this point the engine assumes
//! well formed data.
use thiserror::Error;

use crate::data::linear_program::elements::{VariableKind, VariableStatus};

/// A problem or an initial basis was rejected.
#[allow(missing_docs)]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum InputError {
    #[error("{what} has length {found}, expected {expected}")]
    DimensionMismatch { what: &'static str, expected: usize, found: usize },
    #[error("column start {column} is smaller than its predecessor")]
    NonMonotoneStarts { column: usize },
    #[error("row index {row} in column {column} is out of range for {nr_rows} rows")]
    IndexOutOfRange { column: usize, row: usize, nr_rows: usize },
    #[error("duplicate entry for row {row} in column {column}")]
    DuplicateEntry { column: usize, row: usize },
    #[error("matrix value {value} at row {row}, column {column} is not finite")]
    NonFiniteValue { row: usize, column: usize, value: f64 },
    #[error("cost {value} of column {column} is not finite")]
    NonFiniteCost { column: usize, value: f64 },
    #[error("objective offset {0} is not finite")]
    NonFiniteOffset(f64),
    #[error("{kind} {index} has lower bound {lower} above its upper bound {upper}")]
    NonMonotoneBounds { kind: VariableKind, index: usize, lower: f64, upper: f64 },
    #[error("{kind} {index} has an unusable bound pair [{lower}, {upper}]")]
    InvalidBound { kind: VariableKind, index: usize, lower: f64, upper: f64 },
    #[error("basis has {found} statuses, expected {expected}")]
    BasisSize { expected: usize, found: usize },
    #[error("basis has {found} basic variables, expected {expected}")]
    BasisCount { expected: usize, found: usize },
    #[error("{kind} {index} has status {status:?}, which its bounds [{lower}, {upper}] don't allow")]
    BasisStatus { kind: VariableKind, index: usize, status: VariableStatus, lower: f64, upper: f64 },
}
