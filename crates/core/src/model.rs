//! Interface to a hosted chat-completion model.

use async_trait::async_trait;
use thiserror::Error;

/// A single chat-completion call: one system message and one user message.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    /// Credential for the provider. Never logged.
    pub api_key: String,
    /// Provider model identifier.
    pub model: String,
    /// System-role framing.
    pub system: String,
    /// User-role instruction.
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Ways a model call can fail.
#[derive(Error, Debug)]
pub enum ModelError {
    /// The request never produced an HTTP response.
    #[error("request to model provider failed: {0}")]
    Transport(String),

    /// The provider answered with a non-success status.
    #[error("model provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("malformed completion response: {0}")]
    MalformedResponse(String),

    /// The response decoded but carried no completion text.
    #[error("completion response contained no message content")]
    EmptyCompletion,
}

/// Text in, text out. Implementations perform exactly one attempt.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, request: ChatRequest) -> Result<String, ModelError>;
}
