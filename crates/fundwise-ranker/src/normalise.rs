//! Score normalisation functions.
//! Every derived score the engine emits passes through one of these and lands in [0, 1].

/// Clamp into [0, 1]. NaN maps to 0.
pub fn clamp01(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

/// Linear share of the list maximum: `value / max`, clamped.
/// A non-positive maximum is treated as 1 so an all-zero list scores 0.
pub fn share_of_max(value: f64, max: f64) -> f64 {
    let denom = if max > 0.0 { max } else { 1.0 };
    clamp01(value / denom)
}

/// Log-compressed share of the list maximum: `ln(1+value) / ln(1+max)`, clamped.
/// `max` is floored at 1 so the denominator is never zero.
pub fn log_share_of_max(value: f64, max: f64) -> f64 {
    let denom = max.max(1.0).ln_1p();
    clamp01(value.max(0.0).ln_1p() / denom)
}

/// Map a distance onto proximity in [0, 1]: 1 at zero distance, 0 at or beyond `max_distance`.
pub fn proximity(distance: f64, max_distance: f64) -> f64 {
    if max_distance <= 0.0 {
        return 0.0;
    }
    (1.0 - distance / max_distance).max(0.0).min(1.0)
}

/// Rescale a [0, 1] composite into `[floor, floor + span]`.
pub fn rescale(raw: f64, floor: f64, span: f64) -> f64 {
    floor + span * clamp01(raw)
}
