//! Chat Completions client.

use async_trait::async_trait;
use pitch_core::{ChatModel, ChatRequest, ModelError};
use serde::{Deserialize, Serialize};

/// Public API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
///
/// One POST per completion; no timeout and no retry. The API key comes with
/// each request, so a single client serves every caller.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    organization: Option<String>,
    project: Option<String>,
}

impl OpenAiClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            organization: None,
            project: None,
        }
    }

    /// Send `OpenAI-Organization` with every request.
    pub fn with_organization(mut self, organization: Option<String>) -> Self {
        self.organization = organization.filter(|o| !o.is_empty());
        self
    }

    /// Send `OpenAI-Project` with every request.
    pub fn with_project(mut self, project: Option<String>) -> Self {
        self.project = project.filter(|p| !p.is_empty());
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

impl Default for OpenAiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> CompletionBody<'a> {
    fn from_request(request: &'a ChatRequest) -> Self {
        Self {
            model: &request.model,
            messages: [
                Message {
                    role: "system",
                    content: &request.system,
                },
                Message {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Trimmed content of the first choice.
fn first_completion(body: &str) -> Result<String, ModelError> {
    let response: CompletionResponse =
        serde_json::from_str(body).map_err(|e| ModelError::MalformedResponse(e.to_string()))?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .ok_or(ModelError::EmptyCompletion)
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn complete(&self, request: ChatRequest) -> Result<String, ModelError> {
        let body = CompletionBody::from_request(&request);

        let mut req = self
            .http
            .post(self.endpoint())
            .bearer_auth(&request.api_key)
            .json(&body);
        if let Some(organization) = &self.organization {
            req = req.header("OpenAI-Organization", organization);
        }
        if let Some(project) = &self.project {
            req = req.header("OpenAI-Project", project);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| ModelError::Transport(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| ModelError::Transport(e.to_string()))?;

        log::debug!("Chat completion for model {} returned {}", request.model, status);

        if !status.is_success() {
            return Err(ModelError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        first_completion(&text)
    }
}
