//! OpenAI-compatible collaborator implementations.
//!
//! Works against `api.openai.com` or any endpoint exposing the same
//! `/chat/completions` and `/audio/transcriptions` routes.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::error::AppError;
use crate::provider::{ChatModel, ChatRequest, TranscribeRequest, Transcriber};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

fn build_client() -> Result<reqwest::Client, AppError> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|err| AppError::internal(format!("failed to create HTTP client: {err}")))
}

/// Maps non-success HTTP statuses to provider errors.
async fn check_status(response: reqwest::Response, what: &str) -> Result<reqwest::Response, AppError> {
    let status = response.status().as_u16();
    match status {
        200 => Ok(response),
        401 | 403 => Err(AppError::provider(format!(
            "{what} rejected: invalid API key or insufficient permissions"
        ))),
        429 => Err(AppError::provider(format!("{what} rate limited"))),
        _ => {
            let body = response.text().await.unwrap_or_default();
            warn!(status, body = %body, "provider returned error");
            Err(AppError::provider(format!(
                "{what} failed with status {status}: {body}"
            )))
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ApiChoice>,
}

/// Chat-completion client for an OpenAI-compatible endpoint.
pub struct OpenAiChatModel {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiChatModel {
    pub fn new(cfg: &AppConfig) -> Result<Self, AppError> {
        Ok(Self {
            base_url: cfg.base_url.clone(),
            api_key: cfg.api_key.clone(),
            model: cfg.chat_model.clone(),
            client: build_client()?,
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn complete(&self, req: ChatRequest) -> Result<String, AppError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": req.system_prompt},
                {"role": "user", "content": req.user_message},
            ],
            "temperature": req.temperature,
        });
        if let Some(max_tokens) = req.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        debug!(model = %self.model, "sending chat completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|err| AppError::provider(format!("chat completion request failed: {err}")))?;

        let response = check_status(response, "chat completion").await?;

        let parsed: ChatCompletionResponse = response.json().await.map_err(|err| {
            AppError::provider(format!("failed to parse chat completion response: {err}"))
        })?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::provider("no choices in chat completion response"))?;

        Ok(choice.message.content.unwrap_or_default().trim().to_string())
    }
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Audio-transcription client for an OpenAI-compatible endpoint.
pub struct OpenAiTranscriber {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiTranscriber {
    pub fn new(cfg: &AppConfig) -> Result<Self, AppError> {
        Ok(Self {
            base_url: cfg.base_url.clone(),
            api_key: cfg.api_key.clone(),
            model: cfg.transcribe_model.clone(),
            client: build_client()?,
        })
    }
}

#[async_trait]
impl Transcriber for OpenAiTranscriber {
    async fn transcribe(&self, req: TranscribeRequest) -> Result<String, AppError> {
        let url = format!("{}/audio/transcriptions", self.base_url);

        let file_part = reqwest::multipart::Part::bytes(req.audio)
            .file_name(req.filename)
            .mime_str("application/octet-stream")
            .map_err(|err| AppError::internal(format!("invalid upload part: {err}")))?;

        let mut form = reqwest::multipart::Form::new()
            .text("model", self.model.clone())
            .part("file", file_part);

        if let Some(language) = req.language {
            // The service expects a bare language code, not a locale tag.
            let code = language
                .split('-')
                .next()
                .unwrap_or(language.as_str())
                .to_string();
            form = form.text("language", code);
        }

        debug!(model = %self.model, "sending transcription request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|err| AppError::provider(format!("transcription request failed: {err}")))?;

        let response = check_status(response, "transcription").await?;

        let parsed: TranscriptionResponse = response.json().await.map_err(|err| {
            AppError::provider(format!("failed to parse transcription response: {err}"))
        })?;

        Ok(parsed.text)
    }
}
