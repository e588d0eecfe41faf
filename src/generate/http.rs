use std::time::Duration;

use anyhow::Context as _;
use reqwest::blocking::{Client, Response};

use crate::{foundation::error::SeneraResult, generate::backends::BackendError};

const MAX_ERROR_BODY_CHARS: usize = 512;

/// Blocking client with the configured per-request timeout.
pub fn build_client(timeout: Duration) -> SeneraResult<Client> {
    let client = Client::builder()
        .timeout(timeout)
        .build()
        .context("build http client")?;
    Ok(client)
}

/// Pass through 2xx responses; turn everything else into [`BackendError::Http`].
pub fn ensure_success(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(BackendError::Http {
        status: status.as_u16(),
        body: shorten(&body),
    })
}

/// Parse a JSON response body.
pub fn json_body(response: Response) -> Result<serde_json::Value, BackendError> {
    response
        .json()
        .map_err(|err| BackendError::InvalidResponse(format!("response is not json: {err}")))
}

fn shorten(body: &str) -> String {
    let body = body.trim();
    if body.chars().count() <= MAX_ERROR_BODY_CHARS {
        return body.to_string();
    }
    let mut out: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
    out.push_str("...");
    out
}

/// Minimal OpenAI REST client shared by the describer, the interpreter and DALL·E.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_base: String,
    api_key: String,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("api_base", &self.api_base)
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl OpenAiClient {
    /// Client for `api_base` (for example `https://api.openai.com/v1`).
    pub fn new(
        api_base: &str,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> SeneraResult<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// POST a JSON body to `{api_base}/{path}` and return the JSON response.
    pub fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, BackendError> {
        let url = format!("{}/{}", self.api_base, path.trim_start_matches('/'));
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()?;
        json_body(ensure_success(response)?)
    }

    /// Single-turn chat completion; `content` is the user message content.
    pub fn chat(
        &self,
        model: &str,
        content: serde_json::Value,
        max_tokens: u32,
    ) -> Result<String, BackendError> {
        let messages = serde_json::json!([{ "role": "user", "content": content }]);
        self.complete(model, messages, max_tokens)
    }

    /// Chat completion over an explicit `messages` array; returns the first choice's text.
    pub fn complete(
        &self,
        model: &str,
        messages: serde_json::Value,
        max_tokens: u32,
    ) -> Result<String, BackendError> {
        let body = serde_json::json!({
            "model": model,
            "messages": messages,
            "max_tokens": max_tokens,
        });
        let response = self.post_json("chat/completions", &body)?;
        response
            .pointer("/choices/0/message/content")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                BackendError::InvalidResponse("missing choices[0].message.content".to_string())
            })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/generate/http.rs"]
mod tests;
