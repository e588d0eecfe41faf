use crate::{
    collage::canvas::Canvas,
    foundation::error::{SeneraError, SeneraResult},
    generate::{
        backends::{BackendError, BackendKind, ImageBackend, ImageReference, RenderRequest},
        describe::{DescriptionBackend, describe_instruction},
    },
};

/// Per-backend state within one dispatch.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AttemptState {
    /// The backend was not reached.
    NotTried,
    /// The backend was invoked and failed.
    Failed {
        /// Failure detail.
        detail: String,
    },
    /// The backend produced the result.
    Succeeded {
        /// The rendered image.
        reference: ImageReference,
    },
}

/// One backend slot in the fallback order.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct GenerationAttempt {
    /// Backend in this slot.
    pub backend: BackendKind,
    /// 1-based position in the fallback order.
    pub rank: usize,
    /// What happened.
    #[serde(flatten)]
    pub state: AttemptState,
}

/// Successful dispatch.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct GenerationOutcome {
    /// The rendered outfit.
    pub image: ImageReference,
    /// Backend that produced it.
    pub backend: BackendKind,
    /// Garment description the backends rendered from.
    pub description: String,
    /// Every backend in fallback order with its final state.
    pub attempts: Vec<GenerationAttempt>,
}

impl GenerationOutcome {
    /// Number of backends that were actually invoked.
    pub fn tried(&self) -> usize {
        self.attempts
            .iter()
            .filter(|a| a.state != AttemptState::NotTried)
            .count()
    }
}

/// Describes a collage once, then walks image backends in order until one succeeds.
pub struct Dispatcher {
    describer: Option<Box<dyn DescriptionBackend>>,
    backends: Vec<Box<dyn ImageBackend>>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("describer", &self.describer.is_some())
            .field("backends", &self.kinds())
            .finish()
    }
}

impl Dispatcher {
    /// Dispatcher over `backends` in their default order.
    ///
    /// Without a describer every call fails with [`SeneraError::DescriptionFailed`].
    pub fn new(
        describer: Option<Box<dyn DescriptionBackend>>,
        backends: Vec<Box<dyn ImageBackend>>,
    ) -> Self {
        Self {
            describer,
            backends,
        }
    }

    /// Backend kinds in default order.
    pub fn kinds(&self) -> Vec<BackendKind> {
        self.backends.iter().map(|b| b.kind()).collect()
    }

    /// Fallback order for one call: `preferred` first when configured, the rest unchanged.
    pub fn order(&self, preferred: Option<BackendKind>) -> Vec<BackendKind> {
        self.ordered(preferred).iter().map(|b| b.kind()).collect()
    }

    fn ordered(&self, preferred: Option<BackendKind>) -> Vec<&dyn ImageBackend> {
        let mut ordered: Vec<&dyn ImageBackend> =
            self.backends.iter().map(|b| b.as_ref()).collect();
        if let Some(kind) = preferred {
            match ordered.iter().position(|b| b.kind() == kind) {
                Some(idx) => {
                    let backend = ordered.remove(idx);
                    ordered.insert(0, backend);
                }
                None => tracing::warn!(
                    backend = %kind,
                    "preferred backend is not configured, using default order"
                ),
            }
        }
        ordered
    }

    /// Render an outfit from `canvas` and the user's request.
    ///
    /// The description step runs once and is fatal on failure. Each backend is then invoked at
    /// most once; the first success ends the call.
    #[tracing::instrument(skip(self, canvas), fields(backends = self.backends.len()))]
    pub fn generate(
        &self,
        canvas: &Canvas,
        user_prompt: &str,
        preferred: Option<BackendKind>,
    ) -> SeneraResult<GenerationOutcome> {
        let description = self.describe(canvas, user_prompt)?;
        let request = RenderRequest {
            description: description.clone(),
            user_prompt: user_prompt.to_string(),
        };

        let ordered = self.ordered(preferred);
        let mut attempts: Vec<GenerationAttempt> = (1..)
            .zip(&ordered)
            .map(|(rank, backend)| GenerationAttempt {
                backend: backend.kind(),
                rank,
                state: AttemptState::NotTried,
            })
            .collect();

        let mut last_failure: Option<(BackendKind, BackendError)> = None;
        for (idx, backend) in ordered.iter().enumerate() {
            let kind = backend.kind();
            let rank = attempts[idx].rank;
            match backend.render(&request) {
                Ok(reference) => {
                    tracing::info!(backend = %kind, rank, "outfit generated");
                    attempts[idx].state = AttemptState::Succeeded {
                        reference: reference.clone(),
                    };
                    return Ok(GenerationOutcome {
                        image: reference,
                        backend: kind,
                        description,
                        attempts,
                    });
                }
                Err(err) => {
                    tracing::warn!(
                        backend = %kind,
                        rank,
                        error = %err,
                        "backend failed, trying next"
                    );
                    attempts[idx].state = AttemptState::Failed {
                        detail: err.detail(),
                    };
                    last_failure = Some((kind, err));
                }
            }
        }

        let detail = match &last_failure {
            Some((_, err)) => err.detail(),
            None => "no image backend configured".to_string(),
        };
        Err(SeneraError::GenerationFailed {
            attempts: attempts.len(),
            last_backend: last_failure.map(|(kind, _)| kind),
            detail: Some(detail),
        })
    }

    fn describe(&self, canvas: &Canvas, user_prompt: &str) -> SeneraResult<String> {
        let Some(describer) = &self.describer else {
            return Err(SeneraError::description_failed(
                "no description backend configured",
            ));
        };
        let png = canvas.encode_png()?;
        let description = describer
            .describe(&png, &describe_instruction(user_prompt))
            .map_err(|err| {
                tracing::warn!(error = %err, "collage description failed");
                SeneraError::description_failed(err.detail())
            })?;
        let description = description.trim();
        if description.is_empty() {
            return Err(SeneraError::description_failed("empty description"));
        }
        Ok(description.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/generate/dispatcher.rs"]
mod tests;
