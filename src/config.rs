//! Engine configuration: layout constants, selection tuning and generation services.
//!
//! Every section is optional in the JSON file. Secrets are read from the environment only.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::Context as _;

use crate::{
    collage::store::ImageStore,
    foundation::error::{SeneraError, SeneraResult},
    generate::{
        adapters::{DalleBackend, HuggingFaceBackend, PollinationsBackend, ReplicateBackend},
        backends::{BackendKind, ImageBackend},
        describe::{DescriptionBackend, OpenAiDescriber},
    },
    interpret::{FixedInterpreter, OpenAiPromptInterpreter, PromptInterpreter},
    layout::planner::LayoutConfig,
    select::{scorer::ScoreWeights, selector::DEFAULT_MAX_PER_CATEGORY},
    wardrobe::vocab::TagVocabulary,
};

/// OpenAI endpoints and models.
#[derive(Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OpenAiSettings {
    /// REST base, without trailing slash.
    pub api_base: String,
    /// API key; taken from `OPENAI_API_KEY`.
    #[serde(skip)]
    pub api_key: Option<String>,
    /// Model used to interpret prompts.
    pub chat_model: String,
    /// Vision model used to describe collages.
    pub vision_model: String,
    /// Image model.
    pub image_model: String,
    /// Requested image size.
    pub image_size: String,
    /// Requested image quality.
    pub image_quality: String,
    /// Token limit for descriptions.
    pub max_tokens: u32,
}

impl std::fmt::Debug for OpenAiSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiSettings")
            .field("api_base", &self.api_base)
            .field("api_key", &redacted(&self.api_key))
            .field("chat_model", &self.chat_model)
            .field("vision_model", &self.vision_model)
            .field("image_model", &self.image_model)
            .field("image_size", &self.image_size)
            .field("image_quality", &self.image_quality)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            api_key: None,
            chat_model: "gpt-4o".to_string(),
            vision_model: "gpt-4o".to_string(),
            image_model: "dall-e-3".to_string(),
            image_size: "1024x1024".to_string(),
            image_quality: "standard".to_string(),
            max_tokens: 250,
        }
    }
}

/// Pollinations endpoint.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PollinationsSettings {
    /// Base URL; images live under `/prompt/<text>`.
    pub base_url: String,
    /// Output width.
    pub width: u32,
    /// Output height.
    pub height: u32,
    /// Prompts are cut to this many characters to keep URLs short.
    pub max_prompt_chars: usize,
}

impl Default for PollinationsSettings {
    fn default() -> Self {
        Self {
            base_url: "https://image.pollinations.ai".to_string(),
            width: 1024,
            height: 1024,
            max_prompt_chars: 1500,
        }
    }
}

/// Hugging Face inference endpoint.
#[derive(Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct HuggingFaceSettings {
    /// Inference API base.
    pub api_base: String,
    /// Model repository id.
    pub model: String,
    /// Token; taken from `HUGGINGFACE_API_TOKEN` or `HF_TOKEN`.
    #[serde(skip)]
    pub token: Option<String>,
}

impl std::fmt::Debug for HuggingFaceSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HuggingFaceSettings")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("token", &redacted(&self.token))
            .finish()
    }
}

impl Default for HuggingFaceSettings {
    fn default() -> Self {
        Self {
            api_base: "https://api-inference.huggingface.co".to_string(),
            model: "stabilityai/stable-diffusion-xl-base-1.0".to_string(),
            token: None,
        }
    }
}

/// Replicate predictions endpoint.
#[derive(Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ReplicateSettings {
    /// REST base, without trailing slash.
    pub api_base: String,
    /// `owner/name` of the model.
    pub model: String,
    /// Token; taken from `REPLICATE_API_TOKEN`.
    #[serde(skip)]
    pub token: Option<String>,
}

impl std::fmt::Debug for ReplicateSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicateSettings")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("token", &redacted(&self.token))
            .finish()
    }
}

impl Default for ReplicateSettings {
    fn default() -> Self {
        Self {
            api_base: "https://api.replicate.com/v1".to_string(),
            model: "black-forest-labs/flux-schnell".to_string(),
            token: None,
        }
    }
}

/// Per-category selection tuning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Items kept per category.
    pub max_per_category: usize,
    /// Scoring weights.
    pub weights: ScoreWeights,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            max_per_category: DEFAULT_MAX_PER_CATEGORY,
            weights: ScoreWeights::default(),
        }
    }
}

/// Generation services and their fallback order.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Default fallback order.
    pub order: Vec<BackendKind>,
    /// Backend tried first when a request does not name one.
    pub preferred: Option<BackendKind>,
    /// Per-request network timeout in milliseconds.
    pub timeout_ms: u64,
    /// OpenAI (description, interpretation, DALL·E).
    pub openai: OpenAiSettings,
    /// Pollinations.
    pub pollinations: PollinationsSettings,
    /// Hugging Face.
    pub huggingface: HuggingFaceSettings,
    /// Replicate.
    pub replicate: ReplicateSettings,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            order: BackendKind::ALL.to_vec(),
            preferred: None,
            timeout_ms: 120_000,
            openai: OpenAiSettings::default(),
            pollinations: PollinationsSettings::default(),
            huggingface: HuggingFaceSettings::default(),
            replicate: ReplicateSettings::default(),
        }
    }
}

impl GenerationConfig {
    /// Network timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Top-level engine configuration.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Collage geometry and font sizes.
    pub layout: LayoutConfig,
    /// Selection tuning.
    pub selection: SelectionConfig,
    /// Directory item photos are read from and outputs are written to.
    pub uploads_dir: PathBuf,
    /// Extra font files for collage text.
    pub fonts_dir: Option<PathBuf>,
    /// Generation services.
    pub generation: GenerationConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            selection: SelectionConfig::default(),
            uploads_dir: PathBuf::from("uploads"),
            fonts_dir: None,
            generation: GenerationConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a JSON config file.
    pub fn from_json_file(path: &Path) -> SeneraResult<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("read config '{}'", path.display()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// File (or defaults), then process environment, then validation.
    pub fn load(path: Option<&Path>) -> SeneraResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_json_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read credentials and the preferred backend through `var`.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> SeneraResult<()> {
        let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("OPENAI_API_KEY") {
            self.generation.openai.api_key = Some(key);
        }
        if let Some(token) = non_empty("HUGGINGFACE_API_TOKEN").or_else(|| non_empty("HF_TOKEN")) {
            self.generation.huggingface.token = Some(token);
        }
        if let Some(token) = non_empty("REPLICATE_API_TOKEN") {
            self.generation.replicate.token = Some(token);
        }
        if let Some(service) = non_empty("IMAGE_GENERATION_SERVICE") {
            let kind = service
                .parse::<BackendKind>()
                .map_err(|e| SeneraError::validation(format!("IMAGE_GENERATION_SERVICE: {e}")))?;
            self.generation.preferred = Some(kind);
        }
        Ok(())
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> SeneraResult<()> {
        self.layout.validate()?;
        if self.selection.max_per_category == 0 {
            return Err(SeneraError::validation(
                "selection.max_per_category must be > 0",
            ));
        }
        if self.generation.timeout_ms == 0 {
            return Err(SeneraError::validation("generation.timeout_ms must be > 0"));
        }
        for (idx, kind) in self.generation.order.iter().enumerate() {
            if self.generation.order[..idx].contains(kind) {
                return Err(SeneraError::validation(format!(
                    "generation.order lists '{kind}' more than once"
                )));
            }
        }
        let pollinations = &self.generation.pollinations;
        if pollinations.width == 0 || pollinations.height == 0 {
            return Err(SeneraError::validation(
                "generation.pollinations width/height must be > 0",
            ));
        }
        Ok(())
    }

    /// Construct the image backends listed in `generation.order`.
    ///
    /// Backends whose credential is missing are skipped with a warning.
    pub fn build_backends(
        &self,
        store: Arc<dyn ImageStore + Send + Sync>,
    ) -> SeneraResult<Vec<Box<dyn ImageBackend>>> {
        let generation = &self.generation;
        let timeout = generation.timeout();
        let mut backends: Vec<Box<dyn ImageBackend>> = Vec::new();
        for kind in &generation.order {
            let backend: Box<dyn ImageBackend> = match kind {
                BackendKind::Dalle => match &generation.openai.api_key {
                    Some(key) => Box::new(DalleBackend::new(&generation.openai, key, timeout)?),
                    None => {
                        warn_disabled(*kind, "OPENAI_API_KEY");
                        continue;
                    }
                },
                BackendKind::Pollinations => {
                    Box::new(PollinationsBackend::new(&generation.pollinations, timeout)?)
                }
                BackendKind::HuggingFace => match &generation.huggingface.token {
                    Some(token) => Box::new(HuggingFaceBackend::new(
                        &generation.huggingface,
                        token,
                        timeout,
                        Arc::clone(&store),
                    )?),
                    None => {
                        warn_disabled(*kind, "HUGGINGFACE_API_TOKEN");
                        continue;
                    }
                },
                BackendKind::Replicate => match &generation.replicate.token {
                    Some(token) => Box::new(ReplicateBackend::new(
                        &generation.replicate,
                        token,
                        timeout,
                    )?),
                    None => {
                        warn_disabled(*kind, "REPLICATE_API_TOKEN");
                        continue;
                    }
                },
            };
            backends.push(backend);
        }
        Ok(backends)
    }

    /// Vision describer, if an OpenAI key is configured.
    pub fn build_describer(&self) -> SeneraResult<Option<Box<dyn DescriptionBackend>>> {
        let openai = &self.generation.openai;
        let Some(key) = &openai.api_key else {
            tracing::warn!("OPENAI_API_KEY not set, collage description disabled");
            return Ok(None);
        };
        let describer = OpenAiDescriber::new(openai, key, self.generation.timeout())?;
        Ok(Some(Box::new(describer)))
    }

    /// Prompt interpreter: OpenAI when a key is configured, the fallback tag set otherwise.
    pub fn build_interpreter(&self) -> SeneraResult<Box<dyn PromptInterpreter>> {
        let openai = &self.generation.openai;
        match &openai.api_key {
            Some(key) => Ok(Box::new(OpenAiPromptInterpreter::new(
                openai,
                key,
                self.generation.timeout(),
                TagVocabulary::standard(),
            )?)),
            None => {
                tracing::warn!("OPENAI_API_KEY not set, prompts map to the fallback tag set");
                Ok(Box::new(FixedInterpreter::fallback()))
            }
        }
    }
}

fn redacted(secret: &Option<String>) -> Option<&'static str> {
    secret.as_ref().map(|_| "<redacted>")
}

fn warn_disabled(kind: BackendKind, var: &str) {
    tracing::warn!(backend = %kind, "{var} not set, backend disabled");
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
