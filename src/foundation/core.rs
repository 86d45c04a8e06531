/// Nudge applied when a finished animation is parked on a boundary.
///
/// A negative `animation-delay` of exactly one iteration makes CSS engines wrap to the next
/// iteration; staying this far inside the boundary keeps the last (or first) frame on screen.
pub const BOUNDARY_EPSILON_MS: f64 = 1e-4;

/// Format a number the way CSS text expects it: integral values have no fractional part and
/// negative zero prints as `0`.
///
/// Magnitudes below `1e-6` or from `1e21` up switch to exponent form (`1e-7`, `1.5e+21`), the
/// same cut-over script engines use when stringifying numbers.
pub fn css_number(v: f64) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    if v.is_nan() {
        return "NaN".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let magnitude = v.abs();
    if !(1e-6..1e21).contains(&magnitude) {
        let text = format!("{v:e}");
        return match text.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{mantissa}e+{exponent}")
            }
            _ => text,
        };
    }
    format!("{v}")
}

/// Format a millisecond value as a CSS `<time>`.
pub fn css_ms(v: f64) -> String {
    format!("{}ms", css_number(v))
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
