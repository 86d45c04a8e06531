use std::path::Path;
use std::rc::Rc;

use crate::{
    animation::controller::Animation,
    foundation::error::{MotionError, MotionResult},
    host::{element::StyleTarget, timer::Scheduler},
    keyframes::{compile::compile_keyframes, model::Keyframe},
    style::{
        registry::{FlushStrategy, StyleRegistry},
        sheet::StyleSheet,
    },
    timing::effect::TimingInput,
};

/// A keyframe list plus its timing, as stored on disk.
///
/// ```json
/// { "keyframes": [{ "opacity": 0 }, { "opacity": 1 }], "timing": { "duration": 300 } }
/// ```
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnimationFile {
    /// Frames passed to `animate`.
    pub keyframes: Vec<Keyframe>,
    /// Duration in ms or a full timing object.
    pub timing: TimingInput,
}

impl AnimationFile {
    /// Parse from JSON text.
    pub fn from_json(text: &str) -> MotionResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read and parse a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> MotionResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            MotionError::validation(format!("read '{}': {e}", path.display()))
        })?;
        Self::from_json(&text)
    }
}

/// Entry point: the polyfilled `animate` bound to one style registry and one scheduler.
///
/// Cloning is cheap; clones share the registry.
#[derive(Clone)]
pub struct Engine {
    registry: StyleRegistry,
    scheduler: Rc<dyn Scheduler>,
}

impl Engine {
    /// Engine with an incrementally flushed registry writing into `sheet`.
    pub fn new(sheet: Rc<dyn StyleSheet>, scheduler: Rc<dyn Scheduler>) -> Self {
        let registry = StyleRegistry::new(sheet, scheduler.clone(), FlushStrategy::default());
        Self::with_registry(registry, scheduler)
    }

    /// Engine around an existing registry.
    pub fn with_registry(registry: StyleRegistry, scheduler: Rc<dyn Scheduler>) -> Self {
        Self {
            registry,
            scheduler,
        }
    }

    /// Animate `element` through `keyframes`, starting immediately.
    ///
    /// Timing is validated before anything is registered, so a failed call leaves both the
    /// registry and the element untouched.
    #[tracing::instrument(skip(self, element, keyframes, timing), fields(frames = keyframes.len()))]
    pub fn animate(
        &self,
        element: Rc<dyn StyleTarget>,
        keyframes: &[Keyframe],
        timing: impl Into<TimingInput>,
    ) -> MotionResult<Animation> {
        let timing = timing.into().into_timing().resolve()?;
        let rules = compile_keyframes(keyframes)?;
        let name = self.registry.insert(&rules);
        tracing::debug!(name = %name, total_time = timing.total_time, "animate");
        Ok(Animation::start(
            name,
            timing,
            element,
            self.scheduler.clone(),
        ))
    }

    /// [`Engine::animate`] with a loaded [`AnimationFile`].
    pub fn animate_file(
        &self,
        element: Rc<dyn StyleTarget>,
        file: &AnimationFile,
    ) -> MotionResult<Animation> {
        self.animate(element, &file.keyframes, file.timing.clone())
    }

    /// Write pending keyframes rules now.
    pub fn flush_styles(&self) {
        self.registry.flush();
    }

    /// The shared registry.
    pub fn registry(&self) -> &StyleRegistry {
        &self.registry
    }

    /// The scheduler controllers use.
    pub fn scheduler(&self) -> &Rc<dyn Scheduler> {
        &self.scheduler
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("registry", &self.registry)
            .field("pending_tasks", &self.scheduler.pending_tasks())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/engine.rs"]
mod tests;
