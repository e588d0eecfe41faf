//! Collage geometry.

/// Band and cell planning.
pub mod planner;
