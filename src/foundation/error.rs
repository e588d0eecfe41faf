use crate::generate::backends::BackendKind;

/// Convenience result type used across Senera.
pub type SeneraResult<T> = Result<T, SeneraError>;

/// Stable, machine-readable failure kind for a [`SeneraError`].
///
/// Callers that surface errors to end users should key on this value rather than on the
/// display string, which may carry more context over time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Invalid caller-provided or configuration data.
    Validation,
    /// The selection came back empty.
    NoMatchingItems,
    /// The prompt interpreter could not produce a tag set.
    Interpretation,
    /// The vision description step failed.
    DescriptionFailed,
    /// Every configured generation backend failed.
    GenerationFailed,
    /// Serialization or deserialization failed.
    Serde,
    /// Lower-level failure (IO, image codec, ...).
    Other,
}

/// Top-level error taxonomy used by engine APIs.
///
/// Per-item image problems never show up here: the compositor absorbs them into placeholders.
/// Recoverable backend failures are [`crate::BackendError`] and only escape the dispatcher folded
/// into [`SeneraError::GenerationFailed`].
#[derive(thiserror::Error, Debug)]
pub enum SeneraError {
    /// Invalid user-provided or configuration data.
    #[error("validation error: {0}")]
    Validation(String),

    /// No wardrobe item matched the requested categories.
    #[error("no matching items found in the wardrobe")]
    NoMatchingItems,

    /// The prompt could not be interpreted into a tag set.
    #[error("interpretation error: {0}")]
    Interpretation(String),

    /// The garment description step failed; no backend can render without it.
    #[error("description failed")]
    DescriptionFailed {
        /// Underlying failure detail, kept out of the primary message.
        detail: Option<String>,
    },

    /// All generation backends were tried and none succeeded.
    #[error("generation failed after {attempts} attempt(s)")]
    GenerationFailed {
        /// Number of backends that were invoked.
        attempts: usize,
        /// Last backend that was tried, if any.
        last_backend: Option<BackendKind>,
        /// Failure detail reported by the last backend.
        detail: Option<String>,
    },

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SeneraError {
    /// Build a [`SeneraError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`SeneraError::Interpretation`] value.
    pub fn interpretation(msg: impl Into<String>) -> Self {
        Self::Interpretation(msg.into())
    }

    /// Build a [`SeneraError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Build a [`SeneraError::DescriptionFailed`] value carrying `detail`.
    pub fn description_failed(detail: impl Into<String>) -> Self {
        Self::DescriptionFailed {
            detail: Some(detail.into()),
        }
    }

    /// Stable failure kind for this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Validation(_) => FailureKind::Validation,
            Self::NoMatchingItems => FailureKind::NoMatchingItems,
            Self::Interpretation(_) => FailureKind::Interpretation,
            Self::DescriptionFailed { .. } => FailureKind::DescriptionFailed,
            Self::GenerationFailed { .. } => FailureKind::GenerationFailed,
            Self::Serde(_) => FailureKind::Serde,
            Self::Other(_) => FailureKind::Other,
        }
    }

    /// Optional diagnostic detail that is not part of the display message.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::DescriptionFailed { detail } | Self::GenerationFailed { detail, .. } => {
                detail.as_deref()
            }
            _ => None,
        }
    }
}

impl From<serde_json::Error> for SeneraError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
