//! Wardrobe data model and tag vocabulary.

/// Items, tag sets, selections and the inventory collaborator.
pub mod model;
/// Closed per-facet tag vocabulary.
pub mod vocab;
