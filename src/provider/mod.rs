//! Collaborator abstractions for the remote model services.
//!
//! The orchestration layer depends on the [`ChatModel`] and
//! [`Transcriber`] traits instead of concrete implementations, which
//! keeps chat-turn handling decoupled from any particular vendor API.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::AppConfig;
use crate::error::AppError;

pub mod openai;

/// Input payload for a chat completion.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// System prompt, possibly embedding filtered task context.
    pub system_prompt: String,
    /// The user's message for this turn.
    pub user_message: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Optional completion token budget.
    pub max_tokens: Option<u32>,
}

/// Language-generation contract. Returns the model's raw text reply;
/// envelope parsing is the orchestration layer's concern.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, req: ChatRequest) -> Result<String, AppError>;
}

/// Input payload for a transcription call.
#[derive(Debug, Clone)]
pub struct TranscribeRequest {
    /// Raw audio bytes as uploaded by the caller.
    pub audio: Vec<u8>,
    /// Original filename, used by the service for format detection.
    pub filename: String,
    /// Optional language hint such as `"en"` or `"en-US"`; the service
    /// auto-detects when absent.
    pub language: Option<String>,
}

/// Speech-transcription contract: raw audio bytes in, best-effort text out.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, req: TranscribeRequest) -> Result<String, AppError>;
}

/// Builds the configured collaborator implementations.
pub fn build_providers(
    cfg: &AppConfig,
) -> Result<(Arc<dyn ChatModel>, Arc<dyn Transcriber>), AppError> {
    let chat = Arc::new(openai::OpenAiChatModel::new(cfg)?);
    let transcriber = Arc::new(openai::OpenAiTranscriber::new(cfg)?);
    Ok((chat, transcriber))
}
