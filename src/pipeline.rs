//! Request flows: prompt to collage, and prompt to collage to rendered outfit.

use std::{path::PathBuf, sync::Arc};

use crate::{
    collage::{
        compositor::{Composed, CompositionReport, compose},
        loader::{FsImageLoader, ItemImageLoader},
        store::{FsImageStore, ImageStore, timestamped_name_now},
        text::TextRenderer,
    },
    config::{EngineConfig, SelectionConfig},
    foundation::error::{SeneraError, SeneraResult},
    generate::{
        backends::{BackendKind, ImageReference},
        dispatcher::{Dispatcher, GenerationAttempt},
    },
    interpret::PromptInterpreter,
    layout::planner::{LayoutConfig, LayoutPlan, plan},
    select::selector::select,
    wardrobe::model::{
        CategorySelection, InventoryReader, OwnerId, SelectionSummary, TargetTagSet,
    },
};

/// Collaborators an [`OutfitEngine`] runs against.
pub struct EngineParts {
    /// Wardrobe read access.
    pub inventory: Box<dyn InventoryReader>,
    /// Prompt to tag set.
    pub interpreter: Box<dyn PromptInterpreter>,
    /// Item photo access.
    pub loader: Box<dyn ItemImageLoader>,
    /// Output persistence.
    pub store: Arc<dyn ImageStore + Send + Sync>,
    /// Collage text rasterizer.
    pub text: TextRenderer,
    /// Outfit generation.
    pub dispatcher: Dispatcher,
}

/// Selection, geometry and raster for one collage, before persistence.
#[derive(Clone, Debug)]
pub struct CollageBuild {
    /// Items picked per category.
    pub selection: CategorySelection,
    /// Geometry the collage was painted with.
    pub plan: LayoutPlan,
    /// The painted collage.
    pub composed: Composed,
}

/// Result of the collage-only flow.
#[derive(Clone, Debug, serde::Serialize)]
pub struct CollageResponse {
    /// Public URL of the saved collage.
    pub collage_url: String,
    /// Local path of the saved collage.
    pub collage_path: PathBuf,
    /// Tag set the prompt was interpreted as.
    pub target_tags: TargetTagSet,
    /// Selected items per category.
    pub selected_items: SelectionSummary,
    /// Human-readable summary.
    pub message: String,
    /// Per-slot paint outcomes.
    pub report: CompositionReport,
}

/// Result of the complete-outfit flow.
#[derive(Clone, Debug, serde::Serialize)]
pub struct OutfitResponse {
    /// Public URL of the saved collage.
    pub collage_url: String,
    /// Local path of the saved collage.
    pub collage_path: PathBuf,
    /// Rendered outfit.
    pub outfit_image: ImageReference,
    /// Backend that rendered it.
    pub backend: BackendKind,
    /// Garment description used for rendering.
    pub description: String,
    /// Fallback ledger.
    pub attempts: Vec<GenerationAttempt>,
    /// Tag set the prompt was interpreted as.
    pub target_tags: TargetTagSet,
    /// Selected items per category.
    pub selected_items: SelectionSummary,
    /// Human-readable summary.
    pub message: String,
}

/// Runs selection, layout, composition and generation for one user request at a time.
///
/// The engine holds no per-request state; every call reads the inventory afresh.
pub struct OutfitEngine {
    parts: EngineParts,
    layout: LayoutConfig,
    selection: SelectionConfig,
    preferred: Option<BackendKind>,
}

impl std::fmt::Debug for OutfitEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutfitEngine")
            .field("layout", &self.layout)
            .field("selection", &self.selection)
            .field("preferred", &self.preferred)
            .field("dispatcher", &self.parts.dispatcher)
            .finish_non_exhaustive()
    }
}

impl OutfitEngine {
    /// Engine over explicit collaborators.
    pub fn from_parts(config: &EngineConfig, parts: EngineParts) -> SeneraResult<Self> {
        config.validate()?;
        Ok(Self {
            parts,
            layout: config.layout,
            selection: config.selection,
            preferred: config.generation.preferred,
        })
    }

    /// Engine with filesystem photos and outputs under `config.uploads_dir` and network
    /// services built from `config.generation`.
    pub fn from_config(
        config: &EngineConfig,
        inventory: Box<dyn InventoryReader>,
    ) -> SeneraResult<Self> {
        config.validate()?;
        let store: Arc<dyn ImageStore + Send + Sync> =
            Arc::new(FsImageStore::new(config.uploads_dir.clone()));
        let backends = config.build_backends(Arc::clone(&store))?;
        let dispatcher = Dispatcher::new(config.build_describer()?, backends);
        let parts = EngineParts {
            inventory,
            interpreter: config.build_interpreter()?,
            loader: Box::new(FsImageLoader::new(config.uploads_dir.clone())),
            store,
            text: TextRenderer::with_system_fonts(config.fonts_dir.as_deref()),
            dispatcher,
        };
        Self::from_parts(config, parts)
    }

    /// Select, plan and paint a collage for `target` without saving it.
    #[tracing::instrument(skip(self, target))]
    pub fn build_collage(
        &self,
        target: &TargetTagSet,
        owner: OwnerId,
    ) -> SeneraResult<CollageBuild> {
        let selection = select(
            target,
            self.parts.inventory.as_ref(),
            owner,
            self.selection.max_per_category,
            &self.selection.weights,
        )?;
        let plan = plan(&selection, &self.layout)?;
        let composed = compose(
            &plan,
            &self.layout,
            self.parts.loader.as_ref(),
            &self.parts.text,
        )?;
        tracing::info!(
            categories = selection.len(),
            items = selection.total_items(),
            painted = composed.report.painted(),
            missing = composed.report.missing(),
            failed = composed.report.failed(),
            "collage composed"
        );
        Ok(CollageBuild {
            selection,
            plan,
            composed,
        })
    }

    /// Build and save a collage for an explicit tag set.
    pub fn collage_for_tags(
        &self,
        target: TargetTagSet,
        owner: OwnerId,
    ) -> SeneraResult<CollageResponse> {
        let build = self.build_collage(&target, owner)?;
        let (collage_url, collage_path) = self.save_collage(&build)?;
        let total = build.selection.total_items();
        Ok(CollageResponse {
            collage_url,
            collage_path,
            target_tags: target,
            selected_items: build.selection.summary(),
            message: format!("Collage generated with {total} items"),
            report: build.composed.report,
        })
    }

    /// Interpret `prompt`, then build and save a collage. An empty selection still yields a
    /// (message-only) collage.
    #[tracing::instrument(skip(self))]
    pub fn generate_collage(&self, prompt: &str, owner: OwnerId) -> SeneraResult<CollageResponse> {
        let target = self.interpret(prompt)?;
        self.collage_for_tags(target, owner)
    }

    /// Interpret `prompt`, build and save a collage, then render an outfit from it.
    ///
    /// `preferred` overrides the configured preferred backend for this call.
    #[tracing::instrument(skip(self))]
    pub fn generate_complete_outfit(
        &self,
        prompt: &str,
        owner: OwnerId,
        preferred: Option<BackendKind>,
    ) -> SeneraResult<OutfitResponse> {
        let target = self.interpret(prompt)?;
        let build = self.build_collage(&target, owner)?;
        if build.selection.is_empty() {
            return Err(SeneraError::NoMatchingItems);
        }
        let (collage_url, collage_path) = self.save_collage(&build)?;

        let outcome = self.parts.dispatcher.generate(
            &build.composed.canvas,
            prompt,
            preferred.or(self.preferred),
        )?;
        let total = build.selection.total_items();
        Ok(OutfitResponse {
            collage_url,
            collage_path,
            outfit_image: outcome.image,
            backend: outcome.backend,
            description: outcome.description,
            attempts: outcome.attempts,
            target_tags: target,
            selected_items: build.selection.summary(),
            message: format!("Complete outfit generated with {total} items"),
        })
    }

    fn interpret(&self, prompt: &str) -> SeneraResult<TargetTagSet> {
        if prompt.trim().is_empty() {
            return Err(SeneraError::validation("no prompt provided"));
        }
        let target = self.parts.interpreter.interpret(prompt)?;
        tracing::debug!(?target, "prompt interpreted");
        Ok(target)
    }

    fn save_collage(&self, build: &CollageBuild) -> SeneraResult<(String, PathBuf)> {
        let filename = timestamped_name_now("collage")?;
        let path = self.parts.store.save_canvas(&build.composed.canvas, &filename)?;
        Ok((self.parts.store.public_url(&filename), path))
    }
}
