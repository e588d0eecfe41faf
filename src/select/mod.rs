//! Relevance scoring and per-category selection.

/// Item relevance scoring.
pub mod scorer;
/// Per-category top-K selection.
pub mod selector;
