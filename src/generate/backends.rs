use std::path::PathBuf;

/// Identifies one image-generation service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// OpenAI image generation (DALL·E 3).
    Dalle,
    /// Pollinations public image endpoint.
    Pollinations,
    /// Hugging Face inference API.
    #[serde(rename = "huggingface")]
    HuggingFace,
    /// Replicate predictions API.
    Replicate,
}

impl BackendKind {
    /// Every backend in the default fallback order.
    pub const ALL: [BackendKind; 4] = [
        BackendKind::Dalle,
        BackendKind::Pollinations,
        BackendKind::HuggingFace,
        BackendKind::Replicate,
    ];

    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::Dalle => "dalle",
            BackendKind::Pollinations => "pollinations",
            BackendKind::HuggingFace => "huggingface",
            BackendKind::Replicate => "replicate",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dalle" | "dall-e" | "dall_e" | "openai" => Ok(BackendKind::Dalle),
            "pollinations" => Ok(BackendKind::Pollinations),
            "huggingface" | "hugging_face" | "hf" => Ok(BackendKind::HuggingFace),
            "replicate" => Ok(BackendKind::Replicate),
            other => Err(format!(
                "unknown image backend '{other}' (expected dalle, pollinations, huggingface or replicate)"
            )),
        }
    }
}

/// Recoverable failure of one remote call.
///
/// The dispatcher moves on to the next backend for every variant.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Non-success HTTP status.
    #[error("http status {status}")]
    Http {
        /// Response status code.
        status: u16,
        /// Response body, shortened.
        body: String,
    },

    /// Connection failure or timeout.
    #[error("transport error: {0}")]
    Transport(String),

    /// The service is still warming up or the job has not finished.
    #[error("backend still loading: {0}")]
    Loading(String),

    /// The service refused or failed the job.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// The response did not have the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The result could not be persisted locally.
    #[error("storage error: {0}")]
    Storage(String),
}

impl BackendError {
    /// Full diagnostic text, including the response body for HTTP failures.
    pub fn detail(&self) -> String {
        match self {
            BackendError::Http { status, body } if !body.is_empty() => {
                format!("http status {status}: {body}")
            }
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BackendError::Transport(format!("request timed out: {err}"))
        } else {
            BackendError::Transport(err.to_string())
        }
    }
}

/// Everything an adapter needs to render one outfit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderRequest {
    /// Garment description produced from the collage.
    pub description: String,
    /// The user's original style request.
    pub user_prompt: String,
}

impl RenderRequest {
    /// Render instruction shared by adapters that take a single text prompt.
    pub fn outfit_prompt(&self) -> String {
        format!(
            "Photo of one fashion model standing full-body, head to toe, in a neutral pose, \
             appearing only once in the image. The model is wearing: {}. White background. \
             Styled for: {}. High-quality studio lighting. No other people or props.",
            self.description.trim(),
            self.user_prompt.trim()
        )
    }
}

/// Where a generated image can be found.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", content = "location", rename_all = "snake_case")]
pub enum ImageReference {
    /// Remote URL returned by the service.
    Url(String),
    /// Local file written by the engine.
    Stored(PathBuf),
}

impl std::fmt::Display for ImageReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageReference::Url(url) => f.write_str(url),
            ImageReference::Stored(path) => write!(f, "{}", path.display()),
        }
    }
}

/// One interchangeable image-generation service.
pub trait ImageBackend: Send + Sync {
    /// Which service this adapter talks to.
    fn kind(&self) -> BackendKind;

    /// Render an outfit image.
    fn render(&self, request: &RenderRequest) -> Result<ImageReference, BackendError>;
}

#[cfg(test)]
#[path = "../../tests/unit/generate/backends.rs"]
mod tests;
