/// Clamps `v` into `[lo, hi]`. NaN collapses to `lo`.
pub fn clamp(v: f64, lo: f64, hi: f64) -> f64 {
    v.max(lo).min(hi)
}

pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Position of `v` between `a` and `b` as a fraction, clamped to `[0, 1]`.
///
/// A zero-width span yields 0.
pub fn inverse_lerp(a: f64, b: f64, v: f64) -> f64 {
    let span = b - a;
    if span == 0.0 || !span.is_finite() {
        return 0.0;
    }
    clamp((v - a) / span, 0.0, 1.0)
}
