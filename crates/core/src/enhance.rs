//! Slide enhancement engine.
//!
//! With an API key the slide is rewritten by the configured [`ChatModel`].
//! Without one, or when the model call fails for any reason, the result is
//! the deterministic [`mock_enhancement`].

use crate::directive::{mock_enhancement, EnhancementType};
use crate::model::{ChatModel, ChatRequest};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Model used when the request does not name one.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Tone intensity used when the request does not give one.
pub const DEFAULT_TONE_LEVEL: u8 = 5;

pub const SAMPLING_TEMPERATURE: f32 = 0.7;
pub const MAX_COMPLETION_TOKENS: u32 = 2000;

pub const SYSTEM_PROMPT: &str = "You are an expert presentation writer and editor. Your task is to enhance presentation slide content based on specific requirements.";

/// Client-supplied knobs for one enhancement. Keys are camelCase on the wire;
/// keys not listed here are kept in `extra` and otherwise ignored. Values of
/// any JSON type are accepted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancementOptions {
    #[serde(default, skip_serializing)]
    pub api_key: Option<Value>,
    #[serde(default)]
    pub model: Option<Value>,
    #[serde(default)]
    pub target_audience: Option<Value>,
    /// Usually a number on a 1-10 scale; rendered verbatim into the prompt.
    #[serde(default)]
    pub tone_level: Option<Value>,
    #[serde(default)]
    pub custom_instructions: Option<Value>,
    #[serde(default)]
    pub default_prompt: Option<Value>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl EnhancementOptions {
    /// The API key, if a non-empty string was supplied.
    pub fn api_key(&self) -> Option<&str> {
        match &self.api_key {
            Some(Value::String(key)) if !key.is_empty() => Some(key.as_str()),
            _ => None,
        }
    }

    /// The requested model, or [`DEFAULT_MODEL`].
    pub fn model(&self) -> String {
        rendered(&self.model).unwrap_or_else(|| DEFAULT_MODEL.to_string())
    }

    /// Tone level as it appears in the prompt.
    pub fn tone_level(&self) -> String {
        match &self.tone_level {
            None => DEFAULT_TONE_LEVEL.to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

/// A client value as it reads in a prompt. Null, `false`, zero and empty
/// strings, arrays or objects count as absent.
fn rendered(value: &Option<Value>) -> Option<String> {
    match value.as_ref()? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Array(items) if items.is_empty() => None,
        Value::Object(fields) if fields.is_empty() => None,
        other => Some(other.to_string()),
    }
}

/// Compose the user instruction sent to the model.
pub fn build_prompt(
    slide_text: &str,
    directive: Option<EnhancementType>,
    options: &EnhancementOptions,
) -> String {
    let clause = match directive {
        Some(kind) => kind.instruction(),
        None => "",
    };

    let mut prompt = format!("Enhance the following presentation slide content {}", clause);

    if let Some(audience) = rendered(&options.target_audience) {
        prompt.push_str(&format!(". The target audience is: {}", audience));
    }

    prompt.push_str(&format!(
        ". Use a tone intensity of {}/10 (where 10 is the strongest).",
        options.tone_level()
    ));

    if let Some(instructions) = rendered(&options.custom_instructions) {
        prompt.push_str(&format!(" Additional instructions: {}", instructions));
    }

    if let Some(default_prompt) = rendered(&options.default_prompt) {
        prompt.push_str(&format!(" {}", default_prompt));
    }

    prompt.push_str(&format!("\n\nSlide content:\n{}", slide_text));
    prompt.push_str("\n\nEnhanced version:");
    prompt
}

/// Where an enhanced text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnhancementSource {
    Model,
    Mock,
}

/// Result of one enhancement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enhancement {
    pub text: String,
    pub source: EnhancementSource,
}

/// Rewrites slide text, via a model when credentials are present.
#[derive(Clone)]
pub struct Enhancer {
    model: Arc<dyn ChatModel>,
}

impl Enhancer {
    /// Create an enhancer backed by the given model client.
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// Enhance `slide_text` according to the directive `tag`.
    ///
    /// Never fails: model errors are logged and replaced by the mock text.
    pub async fn enhance(
        &self,
        slide_text: &str,
        tag: &str,
        options: &EnhancementOptions,
    ) -> Enhancement {
        let directive = match tag.parse::<EnhancementType>() {
            Ok(kind) => Some(kind),
            Err(e) => {
                log::debug!("{}, using generic directive", e);
                None
            }
        };

        let Some(api_key) = options.api_key() else {
            return Self::mock(slide_text, directive);
        };

        let request = ChatRequest {
            api_key: api_key.to_string(),
            model: options.model(),
            system: SYSTEM_PROMPT.to_string(),
            prompt: build_prompt(slide_text, directive, options),
            temperature: SAMPLING_TEMPERATURE,
            max_tokens: MAX_COMPLETION_TOKENS,
        };

        log::debug!("Requesting '{}' enhancement from model {}", tag, request.model);

        match self.model.complete(request).await {
            Ok(text) => Enhancement {
                text: text.trim().to_string(),
                source: EnhancementSource::Model,
            },
            Err(e) => {
                log::warn!("Model enhancement failed, falling back to mock: {}", e);
                Self::mock(slide_text, directive)
            }
        }
    }

    fn mock(slide_text: &str, directive: Option<EnhancementType>) -> Enhancement {
        Enhancement {
            text: mock_enhancement(slide_text, directive),
            source: EnhancementSource::Mock,
        }
    }
}
