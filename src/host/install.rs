use std::cell::Cell;

use crate::animation::engine::Engine;

/// A host that may or may not ship a native `animate` implementation.
pub trait AnimateHost {
    /// Whether the host already provides a native implementation.
    fn has_native_animate(&self) -> bool;

    /// Route the host's `animate` slot to `engine`.
    fn install_animate(&self, engine: Engine);
}

thread_local! {
    static POLYFILLED: Cell<bool> = const { Cell::new(false) };
}

/// Install `engine` unconditionally.
pub fn polyfill(host: &dyn AnimateHost, engine: Engine) {
    host.install_animate(engine);
    POLYFILLED.with(|p| p.set(true));
    tracing::debug!("animate polyfill installed");
}

/// Install `engine` only when the host lacks a native `animate`. Returns whether it did.
pub fn install_if_missing(host: &dyn AnimateHost, engine: Engine) -> bool {
    if host.has_native_animate() {
        return false;
    }
    polyfill(host, engine);
    true
}

/// Whether an install happened on this thread.
pub fn is_polyfilled() -> bool {
    POLYFILLED.with(Cell::get)
}

#[cfg(test)]
#[path = "../../tests/unit/host/install.rs"]
mod tests;
