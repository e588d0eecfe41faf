use std::{sync::Arc, time::Duration};

use reqwest::blocking::Client;

use crate::{
    collage::store::{ImageStore, timestamped_name_now},
    config::{HuggingFaceSettings, OpenAiSettings, PollinationsSettings, ReplicateSettings},
    foundation::error::SeneraResult,
    generate::{
        backends::{BackendError, BackendKind, ImageBackend, ImageReference, RenderRequest},
        http::{OpenAiClient, build_client, ensure_success, json_body},
    },
};

/// OpenAI image generation.
#[derive(Debug)]
pub struct DalleBackend {
    client: OpenAiClient,
    settings: OpenAiSettings,
}

impl DalleBackend {
    /// Adapter authenticated with `api_key`.
    pub fn new(
        settings: &OpenAiSettings,
        api_key: &str,
        timeout: Duration,
    ) -> SeneraResult<Self> {
        Ok(Self {
            client: OpenAiClient::new(&settings.api_base, api_key, timeout)?,
            settings: settings.clone(),
        })
    }
}

impl ImageBackend for DalleBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Dalle
    }

    fn render(&self, request: &RenderRequest) -> Result<ImageReference, BackendError> {
        let body = serde_json::json!({
            "model": self.settings.image_model,
            "prompt": request.outfit_prompt(),
            "size": self.settings.image_size,
            "quality": self.settings.image_quality,
            "n": 1,
        });
        let response = self.client.post_json("images/generations", &body)?;
        response
            .pointer("/data/0/url")
            .and_then(serde_json::Value::as_str)
            .map(|url| ImageReference::Url(url.to_string()))
            .ok_or_else(|| BackendError::InvalidResponse("missing data[0].url".to_string()))
    }
}

/// Pollinations public endpoint; the request URL itself is the image.
#[derive(Debug)]
pub struct PollinationsBackend {
    client: Client,
    settings: PollinationsSettings,
}

impl PollinationsBackend {
    /// Adapter for `settings.base_url`.
    pub fn new(settings: &PollinationsSettings, timeout: Duration) -> SeneraResult<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            settings: settings.clone(),
        })
    }

    /// Image URL for a prompt, shortened to the configured length.
    pub fn image_url(&self, prompt: &str) -> Result<reqwest::Url, BackendError> {
        let prompt: String = prompt.chars().take(self.settings.max_prompt_chars).collect();
        let mut url = reqwest::Url::parse(&self.settings.base_url).map_err(|err| {
            BackendError::InvalidResponse(format!("invalid pollinations base url: {err}"))
        })?;
        url.path_segments_mut()
            .map_err(|()| {
                BackendError::InvalidResponse("pollinations base url cannot be a base".to_string())
            })?
            .pop_if_empty()
            .push("prompt")
            .push(&prompt);
        url.query_pairs_mut()
            .append_pair("width", &self.settings.width.to_string())
            .append_pair("height", &self.settings.height.to_string())
            .append_pair("nologo", "true");
        Ok(url)
    }
}

impl ImageBackend for PollinationsBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Pollinations
    }

    fn render(&self, request: &RenderRequest) -> Result<ImageReference, BackendError> {
        let url = self.image_url(&request.outfit_prompt())?;
        let response = self.client.get(url.clone()).send()?;
        ensure_success(response)?;
        Ok(ImageReference::Url(url.to_string()))
    }
}

/// Hugging Face inference API; image bytes are stored locally.
pub struct HuggingFaceBackend {
    client: Client,
    settings: HuggingFaceSettings,
    token: String,
    store: Arc<dyn ImageStore + Send + Sync>,
}

impl std::fmt::Debug for HuggingFaceBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HuggingFaceBackend")
            .field("model", &self.settings.model)
            .finish_non_exhaustive()
    }
}

impl HuggingFaceBackend {
    /// Adapter writing results through `store`.
    pub fn new(
        settings: &HuggingFaceSettings,
        token: &str,
        timeout: Duration,
        store: Arc<dyn ImageStore + Send + Sync>,
    ) -> SeneraResult<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            settings: settings.clone(),
            token: token.to_string(),
            store,
        })
    }
}

impl ImageBackend for HuggingFaceBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::HuggingFace
    }

    fn render(&self, request: &RenderRequest) -> Result<ImageReference, BackendError> {
        let url = format!(
            "{}/models/{}",
            self.settings.api_base.trim_end_matches('/'),
            self.settings.model
        );
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "inputs": request.outfit_prompt() }))
            .send()?;
        if response.status().as_u16() == 503 {
            let body = response.text().unwrap_or_default();
            return Err(BackendError::Loading(format!("model unavailable: {}", body.trim())));
        }
        let bytes = ensure_success(response)?.bytes()?;

        if image::guess_format(&bytes).is_err() {
            let text = String::from_utf8_lossy(&bytes);
            if text.to_ascii_lowercase().contains("loading") {
                return Err(BackendError::Loading(text.trim().to_string()));
            }
            return Err(BackendError::InvalidResponse(
                "response is not an image".to_string(),
            ));
        }

        let filename =
            timestamped_name_now("outfit").map_err(|err| BackendError::Storage(err.to_string()))?;
        let path = self
            .store
            .save_bytes(&bytes, &filename)
            .map_err(|err| BackendError::Storage(err.to_string()))?;
        Ok(ImageReference::Stored(path))
    }
}

/// Replicate predictions API, waiting synchronously for the result.
pub struct ReplicateBackend {
    client: Client,
    settings: ReplicateSettings,
    token: String,
}

impl std::fmt::Debug for ReplicateBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicateBackend")
            .field("settings", &self.settings)
            .field("token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl ReplicateBackend {
    /// Adapter authenticated with `token`.
    pub fn new(
        settings: &ReplicateSettings,
        token: &str,
        timeout: Duration,
    ) -> SeneraResult<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            settings: settings.clone(),
            token: token.to_string(),
        })
    }
}

impl ImageBackend for ReplicateBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Replicate
    }

    fn render(&self, request: &RenderRequest) -> Result<ImageReference, BackendError> {
        let url = format!(
            "{}/models/{}/predictions",
            self.settings.api_base.trim_end_matches('/'),
            self.settings.model
        );
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .header("Prefer", "wait")
            .json(&serde_json::json!({ "input": { "prompt": request.outfit_prompt() } }))
            .send()?;
        let prediction = json_body(ensure_success(response)?)?;
        prediction_output(&prediction)
    }
}

/// Interpret a Replicate prediction object.
fn prediction_output(prediction: &serde_json::Value) -> Result<ImageReference, BackendError> {
    let status = prediction
        .get("status")
        .and_then(serde_json::Value::as_str)
        .unwrap_or("unknown");
    match status {
        "succeeded" => {
            let output = prediction.get("output");
            let url = output
                .and_then(serde_json::Value::as_str)
                .or_else(|| output.and_then(|o| o.get(0)).and_then(serde_json::Value::as_str));
            url.map(|u| ImageReference::Url(u.to_string())).ok_or_else(|| {
                BackendError::InvalidResponse("prediction has no output".to_string())
            })
        }
        "failed" | "canceled" => {
            let reason = prediction
                .get("error")
                .and_then(serde_json::Value::as_str)
                .unwrap_or(status);
            Err(BackendError::Rejected(reason.to_string()))
        }
        other => Err(BackendError::Loading(format!("prediction status '{other}'"))),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/generate/adapters.rs"]
mod tests;
