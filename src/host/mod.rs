//! Host capabilities the engine runs against.
//!
//! A browser provides these natively; the in-memory implementations make the engine usable
//! headless and deterministic under test.

/// Time sources.
pub mod clock;
/// Element style seam.
pub mod element;
/// Global `animate` installation.
pub mod install;
/// Deferred task scheduling.
pub mod timer;
