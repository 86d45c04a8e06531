/// Convenience result type used across cssmotion.
pub type MotionResult<T> = Result<T, MotionError>;

/// Top-level error taxonomy used by construction-time APIs.
///
/// Playback operations never fail; only building an animation from user input can.
#[derive(thiserror::Error, Debug)]
pub enum MotionError {
    /// Invalid user-provided data that does not belong to a more specific category.
    #[error("validation error: {0}")]
    Validation(String),

    /// Malformed keyframe list (bad offsets, unsupported property values).
    #[error("keyframe error: {0}")]
    Keyframe(String),

    /// Malformed effect timing (missing or non-finite duration, negative iterations).
    #[error("timing error: {0}")]
    Timing(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MotionError {
    /// Build a [`MotionError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`MotionError::Keyframe`] value.
    pub fn keyframe(msg: impl Into<String>) -> Self {
        Self::Keyframe(msg.into())
    }

    /// Build a [`MotionError::Timing`] value.
    pub fn timing(msg: impl Into<String>) -> Self {
        Self::Timing(msg.into())
    }

    /// Build a [`MotionError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for MotionError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
