//! Shared primitives used by every stage of the engine.

/// Pixel geometry and color primitives.
pub mod core;
/// Error taxonomy and result alias.
pub mod error;
