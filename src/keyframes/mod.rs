//! Declarative keyframes and their compilation to CSS `@keyframes` bodies.

/// Keyframes to CSS text.
pub mod compile;
/// Keyframe model and offset resolution.
pub mod model;
