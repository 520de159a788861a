//! Floating-point helpers for score comparison.

/// Returns true when `a` and `b` differ by at most `tol`.
pub(crate) fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

/// Clamps a similarity score into `[-1, 1]`.
///
/// NaN maps to -1 so a degenerate score can never pass a threshold.
pub(crate) fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        return -1.0;
    }
    score.clamp(-1.0, 1.0)
}

/// Returns true for a finite value inside `[-1, 1]`.
pub(crate) fn in_score_range(value: f64) -> bool {
    value.is_finite() && (-1.0..=1.0).contains(&value)
}
