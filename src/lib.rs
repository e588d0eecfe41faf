//! Senera turns a user's tagged wardrobe into an outfit picture.
//!
//! A request flows through four stages:
//!
//! - interpret a free-text style request into a [`TargetTagSet`]
//! - [`select`] the best-scoring items per requested garment category
//! - [`plan`] the collage geometry and [`compose`] the item photos into one canvas
//! - describe the collage and render an outfit through an ordered list of image backends
//!   ([`Dispatcher`])
//!
//! [`OutfitEngine`] wires the stages together against pluggable collaborators.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Collage raster, text, photo loading, composition and persistence.
pub mod collage;
pub mod config;
mod foundation;
/// Outfit generation backends and dispatch.
pub mod generate;
pub mod interpret;
/// Collage geometry.
pub mod layout;
pub mod pipeline;
/// Scoring and per-category selection.
pub mod select;
/// Wardrobe model and tag vocabulary.
pub mod wardrobe;

pub use crate::foundation::core::{CanvasSize, Color, Rect};
pub use crate::foundation::error::{FailureKind, SeneraError, SeneraResult};

pub use crate::collage::canvas::Canvas;
pub use crate::collage::compositor::{
    Composed, CompositionReport, SlotOutcome, SlotReport, compose,
};
pub use crate::collage::loader::{FsImageLoader, ItemImageLoader};
pub use crate::collage::store::{FsImageStore, ImageStore};
pub use crate::collage::text::TextRenderer;
pub use crate::config::EngineConfig;
pub use crate::generate::backends::{
    BackendError, BackendKind, ImageBackend, ImageReference, RenderRequest,
};
pub use crate::generate::describe::DescriptionBackend;
pub use crate::generate::dispatcher::{
    AttemptState, Dispatcher, GenerationAttempt, GenerationOutcome,
};
pub use crate::interpret::{FixedInterpreter, PromptInterpreter};
pub use crate::layout::planner::{GridShape, LayoutConfig, LayoutPlan, plan};
pub use crate::pipeline::{CollageResponse, EngineParts, OutfitEngine, OutfitResponse};
pub use crate::select::scorer::{ScoreWeights, score};
pub use crate::select::selector::select;
pub use crate::wardrobe::model::{
    CategorySelection, InventoryReader, ItemId, MemoryInventory, OwnerId, ScoredItem,
    SelectionSummary, TargetTagSet, WardrobeItem,
};
pub use crate::wardrobe::vocab::{Facet, TagVocabulary};
