//! Bounds clamping for percentages and scores.

/// Clamp `value` into `[min, max]`.
///
/// NaN collapses to `min`. Never panics, even when `min > max`
/// (the result is then `max`).
pub fn normalize(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        return min;
    }
    value.max(min).min(max)
}
