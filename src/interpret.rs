//! Turning a free-text style request into a [`TargetTagSet`].

use std::{fmt::Write as _, time::Duration};

use crate::{
    config::OpenAiSettings,
    foundation::error::{SeneraError, SeneraResult},
    generate::http::OpenAiClient,
    wardrobe::{
        model::TargetTagSet,
        vocab::{Facet, TagVocabulary},
    },
};

/// Produces the tag set a request is scored against.
pub trait PromptInterpreter: Send + Sync {
    /// Interpret `prompt`.
    fn interpret(&self, prompt: &str) -> SeneraResult<TargetTagSet>;
}

/// Returns the same tag set for every prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FixedInterpreter {
    tags: TargetTagSet,
}

impl FixedInterpreter {
    /// Interpreter that always answers `tags`.
    pub fn new(tags: TargetTagSet) -> Self {
        Self { tags }
    }

    /// Interpreter answering [`TargetTagSet::fallback`].
    pub fn fallback() -> Self {
        Self::new(TargetTagSet::fallback())
    }
}

impl PromptInterpreter for FixedInterpreter {
    fn interpret(&self, _prompt: &str) -> SeneraResult<TargetTagSet> {
        Ok(self.tags.clone())
    }
}

/// Chat-model interpreter constrained to the tag vocabulary.
#[derive(Debug)]
pub struct OpenAiPromptInterpreter {
    client: OpenAiClient,
    model: String,
    vocab: TagVocabulary,
}

const INTERPRET_MAX_TOKENS: u32 = 200;

impl OpenAiPromptInterpreter {
    /// Interpreter authenticated with `api_key`.
    pub fn new(
        settings: &OpenAiSettings,
        api_key: &str,
        timeout: Duration,
        vocab: TagVocabulary,
    ) -> SeneraResult<Self> {
        Ok(Self {
            client: OpenAiClient::new(&settings.api_base, api_key, timeout)?,
            model: settings.chat_model.clone(),
            vocab,
        })
    }
}

impl PromptInterpreter for OpenAiPromptInterpreter {
    #[tracing::instrument(skip(self))]
    fn interpret(&self, prompt: &str) -> SeneraResult<TargetTagSet> {
        if prompt.trim().is_empty() {
            return Err(SeneraError::validation("prompt must not be empty"));
        }
        let messages = serde_json::json!([
            { "role": "system", "content": system_instruction(&self.vocab) },
            { "role": "user", "content": prompt },
        ]);
        let content = self
            .client
            .complete(&self.model, messages, INTERPRET_MAX_TOKENS)
            .map_err(|err| SeneraError::interpretation(err.detail()))?;
        Ok(parse_interpretation(&content, &self.vocab))
    }
}

/// Instruction listing the JSON shape and every allowed value.
pub fn system_instruction(vocab: &TagVocabulary) -> String {
    let mut out = String::from(
        "You are a fashion stylist. Analyze the user's outfit request and return the clothing \
         tags that fit it as a JSON object with the keys \"type_categories\", \"styles\", \
         \"colors\", \"occasions\" and \"seasons\", each an array of strings. Use only these \
         values:\n",
    );
    for facet in Facet::ALL {
        let values: Vec<&str> = vocab.values(facet).collect();
        let _ = writeln!(out, "- {}: {}", plural_key(facet), values.join(", "));
    }
    out.push_str("Answer with the JSON object only.");
    out
}

fn plural_key(facet: Facet) -> &'static str {
    match facet {
        Facet::TypeCategory => "type_categories",
        Facet::Style => "styles",
        Facet::Color => "colors",
        Facet::Occasion => "occasions",
        Facet::Season => "seasons",
    }
}

/// Remove a surrounding markdown code fence (```` ```json ```` or ```` ``` ````).
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Parse a model answer, falling back to [`TargetTagSet::fallback`] when it is not a JSON object.
pub fn parse_interpretation(content: &str, vocab: &TagVocabulary) -> TargetTagSet {
    let parsed = serde_json::from_str::<serde_json::Value>(strip_code_fences(content))
        .map_err(SeneraError::from)
        .and_then(|value| TargetTagSet::from_payload(&value, vocab));
    match parsed {
        Ok(tags) => tags,
        Err(err) => {
            tracing::warn!(%err, "unparsable interpretation, using fallback tags");
            TargetTagSet::fallback()
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/interpret.rs"]
mod tests;
