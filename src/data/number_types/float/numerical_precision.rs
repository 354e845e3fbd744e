//! Helper methods for the accuracy of floating point calculations.

/// Map a bound with magnitude at or beyond `infinity` to the corresponding IEEE infinity.
pub fn normalize_infinity(value: f64, infinity: f64) -> f64 {
    debug_assert!(infinity > 0_f64);

    if value >= infinity {
        f64::INFINITY
    } else if value <= -infinity {
        f64::NEG_INFINITY
    } else {
        value
    }
}

/// Relative difference between two values, scaled by the smaller magnitude.
///
/// Used to compare two computations of what should be the same number, for example the pivot
/// element computed from the column and from the row.
pub fn relative_difference(a: f64, b: f64) -> f64 {
    let scale = a.abs().min(b.abs());
    if scale == 0_f64 {
        if a == b { 0_f64 } else { f64::INFINITY }
    } else {
        (a - b).abs() / scale
    }
}

/// Infinity norm of a dense slice.
pub fn infinity_norm(values: &[f64]) -> f64 {
    values.iter().fold(0_f64, |max, &value| max.max(value.abs()))
}

/// Whether a value is zero within an absolute tolerance.
pub fn is_zero(value: f64, tolerance: f64) -> bool {
    value.abs() <= tolerance
}
