use std::collections::BTreeMap;

use crate::foundation::error::{MotionError, MotionResult};

/// One frame of a declarative keyframe list, in `Element.animate()` shape.
///
/// Property names are accepted in camelCase (`backgroundColor`) or already hyphenated
/// (`background-color`); the compiler normalizes them. Values may be strings, numbers,
/// booleans or `null` (dropped).
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Keyframe {
    /// Position within one iteration in `[0, 1]`; `None` means "distribute evenly".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<f64>,
    /// Timing function applied from this frame to the next.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub easing: Option<String>,
    /// Style properties set at this frame.
    #[serde(flatten)]
    pub properties: BTreeMap<String, serde_json::Value>,
}

impl Keyframe {
    /// Create an empty frame without an explicit offset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty frame at `offset`.
    pub fn at(offset: f64) -> Self {
        Self {
            offset: Some(offset),
            ..Self::default()
        }
    }

    /// Set the timing function used toward the next frame.
    pub fn easing(mut self, easing: impl Into<String>) -> Self {
        self.easing = Some(easing.into());
        self
    }

    /// Set one style property.
    pub fn set(mut self, property: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(property.into(), value.into());
        self
    }
}

/// Resolve the effective offset of every frame.
///
/// Explicit offsets must be finite, inside `[0, 1]` and non-decreasing in list order. Missing
/// offsets follow the Web Animations rules: a missing first offset is `0` (or `1` for a
/// single frame), a missing last offset is `1`, and interior gaps are spaced evenly between
/// the nearest explicit neighbours.
pub fn resolve_offsets(frames: &[Keyframe]) -> MotionResult<Vec<f64>> {
    let mut previous: Option<f64> = None;
    for (index, frame) in frames.iter().enumerate() {
        let Some(offset) = frame.offset else {
            continue;
        };
        if !offset.is_finite() || !(0.0..=1.0).contains(&offset) {
            return Err(MotionError::keyframe(format!(
                "keyframe {index} has offset {offset}, expected a number in [0, 1]"
            )));
        }
        if previous.is_some_and(|p| offset < p) {
            return Err(MotionError::keyframe(format!(
                "keyframe {index} offset {offset} is smaller than a preceding offset"
            )));
        }
        previous = Some(offset);
    }

    let n = frames.len();
    let mut offsets: Vec<Option<f64>> = frames.iter().map(|f| f.offset).collect();
    if n == 0 {
        return Ok(Vec::new());
    }
    if offsets[0].is_none() {
        offsets[0] = Some(if n == 1 { 1.0 } else { 0.0 });
    }
    if n > 1 && offsets[n - 1].is_none() {
        offsets[n - 1] = Some(1.0);
    }

    let mut anchor = 0usize;
    for index in 1..n {
        let Some(end) = offsets[index] else {
            continue;
        };
        let start = offsets[anchor].unwrap_or(0.0);
        let span = (index - anchor) as f64;
        for (step, slot) in offsets[anchor + 1..index].iter_mut().enumerate() {
            *slot = Some(start + (end - start) * (step + 1) as f64 / span);
        }
        anchor = index;
    }

    // `+ 0.0` folds a negative zero into positive zero.
    Ok(offsets
        .into_iter()
        .map(|o| o.unwrap_or(0.0) + 0.0)
        .collect())
}

#[cfg(test)]
#[path = "../../tests/unit/keyframes/model.rs"]
mod tests;
