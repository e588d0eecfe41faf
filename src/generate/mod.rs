//! Outfit generation: collage description and ordered image-backend fallback.

/// Concrete service adapters.
pub mod adapters;
/// Backend identities, errors and the adapter trait.
pub mod backends;
/// Vision description of a collage.
pub mod describe;
/// Describe-once, fallback-in-order dispatch.
pub mod dispatcher;
/// Shared blocking HTTP helpers.
pub mod http;
