/// Number formatting and shared constants.
pub mod core;
/// Error taxonomy.
pub mod error;
