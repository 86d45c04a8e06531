/// Playback controller and its state machine.
pub mod controller;
/// `animate` entry point.
pub mod engine;
