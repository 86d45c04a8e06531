use std::fmt;

use crate::foundation::{
    core::css_number,
    error::{MotionError, MotionResult},
};

/// Direction of each iteration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlaybackDirection {
    /// Every iteration plays forward.
    #[default]
    Normal,
    /// Every iteration plays backward.
    Reverse,
    /// Even iterations forward, odd iterations backward.
    Alternate,
    /// Even iterations backward, odd iterations forward.
    AlternateReverse,
}

impl PlaybackDirection {
    /// CSS `animation-direction` keyword.
    pub fn css_name(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Reverse => "reverse",
            Self::Alternate => "alternate",
            Self::AlternateReverse => "alternate-reverse",
        }
    }

    /// Direction mentions `reverse`.
    pub fn is_reversed(self) -> bool {
        matches!(self, Self::Reverse | Self::AlternateReverse)
    }

    /// Direction mentions `alternate`.
    pub fn is_alternating(self) -> bool {
        matches!(self, Self::Alternate | Self::AlternateReverse)
    }
}

/// What an animation displays outside its active interval.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillMode {
    /// Nothing outside the active interval.
    #[default]
    None,
    /// Hold the last frame after the end.
    Forwards,
    /// Show the first frame during the delay.
    Backwards,
    /// Both of the above.
    Both,
}

impl FillMode {
    /// CSS `animation-fill-mode` keyword.
    pub fn css_name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Forwards => "forwards",
            Self::Backwards => "backwards",
            Self::Both => "both",
        }
    }

    /// `forwards` or `both`.
    pub fn fills_forward(self) -> bool {
        matches!(self, Self::Forwards | Self::Both)
    }

    /// `backwards` or `both`.
    pub fn fills_backward(self) -> bool {
        matches!(self, Self::Backwards | Self::Both)
    }
}

/// Iteration count; JSON accepts a number, `"infinite"` or `"Infinity"`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Iterations {
    /// A finite (possibly fractional) count.
    Count(f64),
    /// Repeat forever.
    Infinite,
}

impl Default for Iterations {
    fn default() -> Self {
        Self::Count(1.0)
    }
}

impl Iterations {
    /// Count as a float (`f64::INFINITY` for [`Iterations::Infinite`]).
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Count(n) => n,
            Self::Infinite => f64::INFINITY,
        }
    }

    /// CSS `animation-iteration-count` value.
    pub fn css_value(self) -> String {
        match self {
            Self::Infinite => "infinite".to_string(),
            Self::Count(n) if n.is_infinite() => "infinite".to_string(),
            Self::Count(n) => css_number(n),
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
enum IterationsRepr {
    Number(f64),
    Keyword(String),
}

impl serde::Serialize for Iterations {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Count(n) => IterationsRepr::Number(*n),
            Self::Infinite => IterationsRepr::Keyword("infinite".to_string()),
        }
        .serialize(serializer)
    }
}

impl<'de> serde::Deserialize<'de> for Iterations {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match IterationsRepr::deserialize(deserializer)? {
            IterationsRepr::Number(n) => Ok(Self::Count(n)),
            IterationsRepr::Keyword(k) if k == "infinite" || k == "Infinity" => Ok(Self::Infinite),
            IterationsRepr::Keyword(k) => Err(serde::de::Error::custom(format!(
                "unknown iteration count '{k}'"
            ))),
        }
    }
}

fn default_easing() -> String {
    "linear".to_string()
}

/// Timing options accepted by `animate`, mirroring `EffectTiming`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectTiming {
    /// Length of one iteration in milliseconds. Required.
    #[serde(default)]
    pub duration: Option<f64>,
    /// Milliseconds before the first iteration.
    #[serde(default)]
    pub delay: f64,
    /// Milliseconds after the last iteration.
    #[serde(default)]
    pub end_delay: f64,
    /// Number of iterations.
    #[serde(default)]
    pub iterations: Iterations,
    /// Per-iteration direction.
    #[serde(default)]
    pub direction: PlaybackDirection,
    /// CSS timing function for the whole effect.
    #[serde(default = "default_easing")]
    pub easing: String,
    /// Fill behaviour outside the active interval.
    #[serde(default)]
    pub fill: FillMode,
}

impl Default for EffectTiming {
    fn default() -> Self {
        Self {
            duration: None,
            delay: 0.0,
            end_delay: 0.0,
            iterations: Iterations::default(),
            direction: PlaybackDirection::default(),
            easing: default_easing(),
            fill: FillMode::default(),
        }
    }
}

impl EffectTiming {
    /// Timing with the given duration and every other option at its default.
    pub fn with_duration(duration_ms: f64) -> Self {
        Self {
            duration: Some(duration_ms),
            ..Self::default()
        }
    }

    /// Set the start delay.
    pub fn delay(mut self, ms: f64) -> Self {
        self.delay = ms;
        self
    }

    /// Set the end delay.
    pub fn end_delay(mut self, ms: f64) -> Self {
        self.end_delay = ms;
        self
    }

    /// Set the iteration count.
    pub fn iterations(mut self, iterations: Iterations) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the playback direction.
    pub fn direction(mut self, direction: PlaybackDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Set the timing function.
    pub fn easing(mut self, easing: impl Into<String>) -> Self {
        self.easing = easing.into();
        self
    }

    /// Set the fill mode.
    pub fn fill(mut self, fill: FillMode) -> Self {
        self.fill = fill;
        self
    }

    /// Validate the options and freeze them for a controller.
    pub fn resolve(&self) -> MotionResult<ResolvedTiming> {
        let duration = self
            .duration
            .ok_or_else(|| MotionError::timing("duration is required"))?;
        if !duration.is_finite() || duration < 0.0 {
            return Err(MotionError::timing(format!(
                "duration must be a finite number >= 0, got {duration}"
            )));
        }
        if !self.delay.is_finite() {
            return Err(MotionError::timing("delay must be finite"));
        }
        if !self.end_delay.is_finite() {
            return Err(MotionError::timing("endDelay must be finite"));
        }
        if let Iterations::Count(n) = self.iterations
            && (n.is_nan() || n < 0.0)
        {
            return Err(MotionError::timing(format!(
                "iterations must be >= 0, got {n}"
            )));
        }
        if self.easing.trim().is_empty() {
            return Err(MotionError::timing("easing must not be empty"));
        }

        let iterations = self.iterations.as_f64();
        let active = if duration == 0.0 {
            0.0
        } else {
            duration * iterations
        };

        Ok(ResolvedTiming {
            duration,
            delay: self.delay,
            end_delay: self.end_delay,
            iterations: self.iterations,
            direction: self.direction,
            easing: self.easing.clone(),
            fill: self.fill,
            total_time: self.delay + active + self.end_delay,
        })
    }
}

/// Either a bare duration or a full [`EffectTiming`], as `animate` accepts.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum TimingInput {
    /// `animate(el, frames, 300)`.
    Duration(f64),
    /// `animate(el, frames, { duration: 300, ... })`.
    Timing(EffectTiming),
}

// Branches on the JSON shape so errors inside a timing object surface as-is.
impl<'de> serde::Deserialize<'de> for TimingInput {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TimingVisitor;

        impl<'de> serde::de::Visitor<'de> for TimingVisitor {
            type Value = TimingInput;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a duration in milliseconds or an effect timing object")
            }

            fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<TimingInput, E> {
                Ok(TimingInput::Duration(v))
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<TimingInput, E> {
                Ok(TimingInput::Duration(v as f64))
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<TimingInput, E> {
                Ok(TimingInput::Duration(v as f64))
            }

            fn visit_map<A: serde::de::MapAccess<'de>>(self, map: A) -> Result<TimingInput, A::Error> {
                use serde::Deserialize as _;
                EffectTiming::deserialize(serde::de::value::MapAccessDeserializer::new(map))
                    .map(TimingInput::Timing)
            }
        }

        deserializer.deserialize_any(TimingVisitor)
    }
}

impl TimingInput {
    /// Normalize to an [`EffectTiming`].
    pub fn into_timing(self) -> EffectTiming {
        match self {
            Self::Duration(ms) => EffectTiming::with_duration(ms),
            Self::Timing(t) => t,
        }
    }
}

impl From<f64> for TimingInput {
    fn from(ms: f64) -> Self {
        Self::Duration(ms)
    }
}

impl From<i32> for TimingInput {
    fn from(ms: i32) -> Self {
        Self::Duration(f64::from(ms))
    }
}

impl From<u32> for TimingInput {
    fn from(ms: u32) -> Self {
        Self::Duration(f64::from(ms))
    }
}

impl From<EffectTiming> for TimingInput {
    fn from(t: EffectTiming) -> Self {
        Self::Timing(t)
    }
}

/// Validated, immutable timing owned by one controller.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedTiming {
    /// Iteration length in ms.
    pub duration: f64,
    /// Start delay in ms.
    pub delay: f64,
    /// End delay in ms.
    pub end_delay: f64,
    /// Iteration count.
    pub iterations: Iterations,
    /// Per-iteration direction.
    pub direction: PlaybackDirection,
    /// CSS timing function.
    pub easing: String,
    /// Fill behaviour.
    pub fill: FillMode,
    /// `delay + duration * iterations + end_delay`, fixed at construction.
    pub total_time: f64,
}

impl ResolvedTiming {
    /// Project a logical time onto the position inside the current iteration.
    ///
    /// The result is what the native CSS animation must be offset by (as a negative delay)
    /// to show the frame at `time`. Iteration index `i` plays backward when the direction is
    /// `reverse` xor (`alternate` and `i` is odd).
    pub fn local_time(&self, time: f64) -> f64 {
        if self.duration <= 0.0 {
            return 0.0;
        }
        let time_less_delay = time - (self.delay + self.end_delay);
        let mut local = time_less_delay % self.duration;
        if self.direction.is_reversed() {
            local = self.duration - local;
        }
        if self.direction.is_alternating() {
            let iteration = (time_less_delay.max(0.0) / self.duration).floor();
            if iteration.rem_euclid(2.0) == 1.0 {
                local = self.duration - local;
            }
        }
        if !local.is_finite() {
            return 0.0;
        }
        local.clamp(0.0, self.total_time.max(0.0))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timing/effect.rs"]
mod tests;
