//! cssmotion drives native CSS keyframe animations through an `Element.animate()`-style
//! playback API.
//!
//! - Compile a keyframe list into a deterministic `@keyframes` body
//! - Register it once in a shared [`StyleRegistry`] under a content-hash name
//! - Control it through an [`Animation`] handle (`play`, `pause`, `reverse`, `finish`,
//!   `cancel`, seeking and rate changes)
//!
//! The browser side is abstracted behind [`StyleTarget`], [`StyleSheet`] and [`Scheduler`];
//! [`MemoryElement`], [`MemoryStyleSheet`] and [`TimerQueue`] implement them in memory.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod animation;
mod foundation;
mod host;
mod keyframes;
mod style;
mod timing;

pub use crate::animation::controller::{Animation, PlayState};
pub use crate::animation::engine::{AnimationFile, Engine};
pub use crate::foundation::core::{BOUNDARY_EPSILON_MS, css_ms, css_number};
pub use crate::foundation::error::{MotionError, MotionResult};
pub use crate::host::clock::{Clock, SystemClock, VirtualClock};
pub use crate::host::element::{AnimationProperty, MemoryElement, StyleTarget, StyleWrite};
pub use crate::host::install::{AnimateHost, install_if_missing, is_polyfilled, polyfill};
pub use crate::host::timer::{Scheduler, Task, TaskId, TimerQueue};
pub use crate::keyframes::compile::{CompiledRules, RuleBlock, compile_keyframes, hyphenate};
pub use crate::keyframes::model::{Keyframe, resolve_offsets};
pub use crate::style::registry::{
    DEFAULT_NAME_PREFIX, FlushStrategy, KeyframesName, StyleRegistry, string_hash,
};
pub use crate::style::sheet::{MemoryStyleSheet, StyleSheet};
pub use crate::timing::effect::{
    EffectTiming, FillMode, Iterations, PlaybackDirection, ResolvedTiming, TimingInput,
};
