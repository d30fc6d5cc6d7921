//! OpenAI chat-completion backend for slide enhancement.

pub mod client;

pub use client::{OpenAiClient, DEFAULT_BASE_URL};
