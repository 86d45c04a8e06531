/// Content-addressed keyframes registry.
pub mod registry;
/// Style sheet seam.
pub mod sheet;
