use std::time::Duration;

use base64::Engine as _;

use crate::{
    config::OpenAiSettings,
    foundation::error::SeneraResult,
    generate::{backends::BackendError, http::OpenAiClient},
};

/// Vision model that turns a collage into a garment description.
pub trait DescriptionBackend: Send + Sync {
    /// Describe the PNG-encoded collage following `instruction`.
    fn describe(&self, png: &[u8], instruction: &str) -> Result<String, BackendError>;
}

/// Instruction sent with the collage; the user's request picks the garments.
pub fn describe_instruction(user_prompt: &str) -> String {
    format!(
        "You are a fashion assistant. From this collage of wardrobe items, choose 3-4 clothing \
         items that best fit this style: '{}'. Only pick items that are visible in the image and \
         make sure they match in tone and form a cohesive outfit. Then briefly describe the \
         selected items.",
        user_prompt.trim()
    )
}

/// OpenAI chat completion with the collage attached as a base64 data URL.
#[derive(Debug)]
pub struct OpenAiDescriber {
    client: OpenAiClient,
    model: String,
    max_tokens: u32,
}

impl OpenAiDescriber {
    /// Describer authenticated with `api_key`.
    pub fn new(
        settings: &OpenAiSettings,
        api_key: &str,
        timeout: Duration,
    ) -> SeneraResult<Self> {
        Ok(Self {
            client: OpenAiClient::new(&settings.api_base, api_key, timeout)?,
            model: settings.vision_model.clone(),
            max_tokens: settings.max_tokens,
        })
    }
}

impl DescriptionBackend for OpenAiDescriber {
    fn describe(&self, png: &[u8], instruction: &str) -> Result<String, BackendError> {
        let data_url = format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(png)
        );
        let content = serde_json::json!([
            { "type": "text", "text": instruction },
            { "type": "image_url", "image_url": { "url": data_url } },
        ]);
        self.client.chat(&self.model, content, self.max_tokens)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/generate/describe.rs"]
mod tests;
