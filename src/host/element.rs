use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

/// CSS animation longhands a controller writes on its element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AnimationProperty {
    /// `animation-name`
    Name,
    /// `animation-duration`
    Duration,
    /// `animation-delay`
    Delay,
    /// `animation-iteration-count`
    IterationCount,
    /// `animation-direction`
    Direction,
    /// `animation-fill-mode`
    FillMode,
    /// `animation-play-state`
    PlayState,
    /// `animation-timing-function`
    TimingFunction,
}

impl AnimationProperty {
    /// Every longhand, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::Name,
        Self::Duration,
        Self::Delay,
        Self::IterationCount,
        Self::Direction,
        Self::FillMode,
        Self::PlayState,
        Self::TimingFunction,
    ];

    /// Hyphenated CSS property name.
    pub fn css_name(self) -> &'static str {
        match self {
            Self::Name => "animation-name",
            Self::Duration => "animation-duration",
            Self::Delay => "animation-delay",
            Self::IterationCount => "animation-iteration-count",
            Self::Direction => "animation-direction",
            Self::FillMode => "animation-fill-mode",
            Self::PlayState => "animation-play-state",
            Self::TimingFunction => "animation-timing-function",
        }
    }
}

/// The element side of a controller: an inline style it can write and a layout it can force.
///
/// Writing an empty string removes the property, as with `element.style.x = ''`.
pub trait StyleTarget {
    /// Write one animation longhand.
    fn set_animation_property(&self, property: AnimationProperty, value: &str);

    /// Force a synchronous style/layout flush (reading `offsetWidth` in a browser).
    ///
    /// Clearing `animation-name`, forcing layout and setting it again is what makes the
    /// engine restart the native animation with a new delay.
    fn force_layout(&self);
}

/// One recorded write on a [`MemoryElement`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StyleWrite {
    /// A property assignment.
    Set(AnimationProperty, String),
    /// A forced layout.
    Layout,
}

/// In-memory element for tests, simulations and headless hosts.
#[derive(Debug, Default)]
pub struct MemoryElement {
    style: RefCell<BTreeMap<AnimationProperty, String>>,
    log: RefCell<Vec<StyleWrite>>,
    layouts: Cell<usize>,
}

impl MemoryElement {
    /// Element with an empty inline style.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of `property`, `None` when unset.
    pub fn get(&self, property: AnimationProperty) -> Option<String> {
        self.style.borrow().get(&property).cloned()
    }

    /// Inline style rendered as `name: value; ...` in property order.
    pub fn css_text(&self) -> String {
        self.style
            .borrow()
            .iter()
            .map(|(p, v)| format!("{}: {v};", p.css_name()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Every write so far, in order.
    pub fn writes(&self) -> Vec<StyleWrite> {
        self.log.borrow().clone()
    }

    /// Number of forced layouts so far.
    pub fn layout_count(&self) -> usize {
        self.layouts.get()
    }

    /// Forget the write log (current style is kept).
    pub fn clear_log(&self) {
        self.log.borrow_mut().clear();
    }
}

impl StyleTarget for MemoryElement {
    fn set_animation_property(&self, property: AnimationProperty, value: &str) {
        {
            let mut style = self.style.borrow_mut();
            if value.is_empty() {
                style.remove(&property);
            } else {
                style.insert(property, value.to_string());
            }
        }
        self.log
            .borrow_mut()
            .push(StyleWrite::Set(property, value.to_string()));
    }

    fn force_layout(&self) {
        self.layouts.set(self.layouts.get() + 1);
        self.log.borrow_mut().push(StyleWrite::Layout);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/host/element.rs"]
mod tests;
