//! # Building blocks to describe linear programs.
use std::fmt;
use std::ops::Not;

/// Direction of optimization.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ObjectiveSense {
    #[default]
    Minimize,
    Maximize,
}

impl ObjectiveSense {
    /// Factor that normalizes the objective to minimization.
    pub fn sign(self) -> f64 {
        match self {
            ObjectiveSense::Minimize => 1_f64,
            ObjectiveSense::Maximize => -1_f64,
        }
    }
}

/// Direction of a bound.
///
/// Used to describe which bound a leaving basic variable moves to, and which bound a nonbasic
/// variable sits at.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum BoundDirection {
    /// The value is, or should become, the lower bound.
    Lower,
    /// The value is, or should become, the upper bound.
    Upper,
}

impl Not for BoundDirection {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            Self::Lower => Self::Upper,
            Self::Upper => Self::Lower,
        }
    }
}

/// Status of a single variable with respect to the basis.
///
/// For row variables, `AtLower` and `AtUpper` refer to the row activity being at its lower or
/// upper side.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum VariableStatus {
    /// In the basis, the value follows from the triangular solve.
    Basic,
    /// Nonbasic at its (finite) lower bound.
    AtLower,
    /// Nonbasic at its (finite) upper bound.
    AtUpper,
    /// Nonbasic with equal lower and upper bound.
    Fixed,
    /// Nonbasic without any finite bound, value zero.
    Free,
}

impl VariableStatus {
    /// Whether the variable is in the basis.
    pub fn is_basic(self) -> bool {
        self == VariableStatus::Basic
    }

    /// The natural nonbasic status for a variable with these bounds.
    ///
    /// Variables with a finite lower bound are placed there, then those with a finite upper bound.
    pub fn nonbasic_for_bounds(lower: f64, upper: f64) -> Self {
        match BoundType::from_bounds(lower, upper) {
            BoundType::Fixed => VariableStatus::Fixed,
            BoundType::Lower | BoundType::Boxed => VariableStatus::AtLower,
            BoundType::Upper => VariableStatus::AtUpper,
            BoundType::Free => VariableStatus::Free,
        }
    }

    /// Whether a nonbasic status can be taken by a variable with these bounds.
    ///
    /// Basic is compatible with any bounds.
    pub fn is_compatible_with(self, lower: f64, upper: f64) -> bool {
        match self {
            VariableStatus::Basic => true,
            VariableStatus::AtLower => lower.is_finite(),
            VariableStatus::AtUpper => upper.is_finite(),
            VariableStatus::Fixed => lower == upper,
            VariableStatus::Free => !lower.is_finite() && !upper.is_finite(),
        }
    }

    /// Status of a row variable seen from the logical variable, whose bounds are the negated
    /// row bounds.
    pub fn mirrored(self) -> Self {
        match self {
            VariableStatus::AtLower => VariableStatus::AtUpper,
            VariableStatus::AtUpper => VariableStatus::AtLower,
            other => other,
        }
    }
}

/// Classification of a pair of bounds.
#[allow(missing_docs)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BoundType {
    Free,
    Lower,
    Upper,
    Boxed,
    Fixed,
}

impl BoundType {
    /// Classify the bounds `lower <= x <= upper`, infinite values represent absent bounds.
    pub fn from_bounds(lower: f64, upper: f64) -> Self {
        match (lower.is_finite(), upper.is_finite()) {
            (false, false) => BoundType::Free,
            (true, false) => BoundType::Lower,
            (false, true) => BoundType::Upper,
            (true, true) if lower == upper => BoundType::Fixed,
            (true, true) => BoundType::Boxed,
        }
    }

    /// Both bounds finite.
    pub fn is_boxed(self) -> bool {
        matches!(self, BoundType::Boxed | BoundType::Fixed)
    }
}

/// Whether an index refers to a structural column or to a row.
#[allow(missing_docs)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum VariableKind {
    Column,
    Row,
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VariableKind::Column => "column",
            VariableKind::Row => "row",
        })
    }
}
