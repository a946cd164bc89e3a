//! Chat-turn and task-extraction orchestration.
//!
//! A turn runs the relevance filter exactly once over the caller-supplied
//! task collection, embeds the result into the system prompt, and forwards
//! to the language-model collaborator. Everything is request-scoped: the
//! current moment is an explicit parameter and nothing is cached between
//! calls.

use std::sync::Arc;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::prompt::{build_chat_system_prompt, build_extraction_prompt, EXTRACTION_SYSTEM_PROMPT};
use crate::provider::{build_providers, ChatModel, ChatRequest, TranscribeRequest, Transcriber};
use crate::relevance::filter_relevant;
use crate::task::Task;
use crate::temporal::parse_instant;

/// Extraction asks for a near-deterministic reply.
const EXTRACTION_TEMPERATURE: f32 = 0.3;

/// First JSON object in a model reply, spanning newlines.
static JSON_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("valid JSON-object pattern"));

/// Structured reply recovered from a chat turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    /// The assistant's natural-language response.
    pub response: String,
    /// The user's message, corrected by the model when it spotted
    /// transcription errors.
    pub user_msg: String,
}

/// Result of extracting a task from voice input.
#[derive(Debug, Clone)]
pub struct TaskExtraction {
    pub task: Task,
    /// Transcript the task was extracted from.
    pub transcript: String,
}

#[derive(Debug, Deserialize)]
struct ReplyEnvelope {
    response: Option<String>,
    user_msg: Option<String>,
}

/// Task-assistant facade over the model collaborators.
pub struct Assistant {
    cfg: AppConfig,
    chat_model: Arc<dyn ChatModel>,
    transcriber: Arc<dyn Transcriber>,
}

impl Assistant {
    /// Constructs an assistant with explicit collaborators.
    pub fn new(
        cfg: AppConfig,
        chat_model: Arc<dyn ChatModel>,
        transcriber: Arc<dyn Transcriber>,
    ) -> Self {
        Self {
            cfg,
            chat_model,
            transcriber,
        }
    }

    /// Constructs an assistant from environment configuration with the
    /// OpenAI-compatible collaborators.
    pub fn from_env() -> Result<Self, AppError> {
        let cfg = AppConfig::from_env()?;
        let (chat_model, transcriber) = build_providers(&cfg)?;
        Ok(Self::new(cfg, chat_model, transcriber))
    }

    /// Runs one chat turn: narrows `task_context` to the records relevant
    /// to `message`, builds the system prompt, and queries the model.
    ///
    /// `date_time` is the caller's current moment (ISO-8601) and
    /// `time_zone` a GMT offset such as `"+05:30"`, used only for display
    /// instructions in the prompt.
    pub async fn chat(
        &self,
        message: &str,
        time_zone: &str,
        date_time: &str,
        task_context: &[Task],
    ) -> Result<ChatReply, AppError> {
        let now = parse_instant(date_time)?;
        let filtered = filter_relevant(task_context, message, now.date_naive());
        let system_prompt = build_chat_system_prompt(&filtered, now, time_zone);

        let raw = self
            .chat_model
            .complete(ChatRequest {
                system_prompt,
                user_message: message.to_string(),
                temperature: self.cfg.chat_temperature,
                max_tokens: Some(self.cfg.chat_max_tokens),
            })
            .await?;

        Ok(parse_chat_reply(&raw, message))
    }

    /// Transcribes an audio clip and runs the transcript through [`chat`].
    ///
    /// [`chat`]: Assistant::chat
    pub async fn chat_voice(
        &self,
        audio: Vec<u8>,
        filename: &str,
        time_zone: &str,
        date_time: &str,
        task_context: &[Task],
    ) -> Result<ChatReply, AppError> {
        let transcript = self
            .transcriber
            .transcribe(TranscribeRequest {
                audio,
                filename: filename.to_string(),
                language: None,
            })
            .await?;

        debug!(transcript = %transcript, "transcribed voice chat message");
        self.chat(&transcript, time_zone, date_time, task_context)
            .await
    }

    /// Extracts a structured task record from natural-language text,
    /// anchored at the caller's current moment. The returned task carries
    /// a freshly assigned id and `pending` status, and has been run
    /// through [`Task::normalized`].
    pub async fn extract_task(&self, text: &str, date_time: &str) -> Result<Task, AppError> {
        if text.trim().is_empty() {
            return Err(AppError::invalid_request("text must not be empty"));
        }
        let now = parse_instant(date_time)?;
        let prompt = build_extraction_prompt(text, now);

        let raw = self
            .chat_model
            .complete(ChatRequest {
                system_prompt: EXTRACTION_SYSTEM_PROMPT.to_string(),
                user_message: prompt,
                temperature: EXTRACTION_TEMPERATURE,
                max_tokens: None,
            })
            .await?;

        let json_str = JSON_OBJECT
            .find(&raw)
            .map(|m| m.as_str())
            .ok_or_else(|| AppError::model_response("no JSON object found in model reply"))?;

        let mut task: Task = serde_json::from_str(json_str).map_err(|err| {
            AppError::model_response(format!("model reply is not a valid task: {err}"))
        })?;

        task.id = Uuid::new_v4().to_string();
        task.status = Some("pending".to_string());
        Ok(task.normalized())
    }

    /// Transcribes an audio clip and extracts a task from the transcript.
    pub async fn extract_task_from_voice(
        &self,
        audio: Vec<u8>,
        filename: &str,
        date_time: &str,
    ) -> Result<TaskExtraction, AppError> {
        let transcript = self
            .transcriber
            .transcribe(TranscribeRequest {
                audio,
                filename: filename.to_string(),
                language: None,
            })
            .await?;

        let task = self.extract_task(&transcript, date_time).await?;
        Ok(TaskExtraction { task, transcript })
    }
}

/// Recovers the `{response, user_msg}` envelope from a model reply,
/// falling back to the raw text when the model ignored the contract.
fn parse_chat_reply(raw: &str, original_message: &str) -> ChatReply {
    let trimmed = raw.trim();
    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        if let Ok(envelope) = serde_json::from_str::<ReplyEnvelope>(trimmed) {
            return ChatReply {
                response: envelope.response.unwrap_or_else(|| trimmed.to_string()),
                user_msg: envelope
                    .user_msg
                    .unwrap_or_else(|| original_message.to_string()),
            };
        }
    }
    ChatReply {
        response: trimmed.to_string(),
        user_msg: original_message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    struct MockChatModel {
        reply: String,
        last_request: Mutex<Option<ChatRequest>>,
    }

    impl MockChatModel {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                last_request: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl ChatModel for MockChatModel {
        async fn complete(&self, req: ChatRequest) -> Result<String, AppError> {
            *self.last_request.lock().expect("lock") = Some(req);
            Ok(self.reply.clone())
        }
    }

    struct MockTranscriber {
        transcript: String,
    }

    #[async_trait]
    impl Transcriber for MockTranscriber {
        async fn transcribe(&self, _req: TranscribeRequest) -> Result<String, AppError> {
            Ok(self.transcript.clone())
        }
    }

    fn test_cfg() -> AppConfig {
        AppConfig {
            api_key: "test".to_string(),
            base_url: "http://localhost:0/v1".to_string(),
            chat_model: "gpt-3.5-turbo".to_string(),
            transcribe_model: "whisper-1".to_string(),
            chat_temperature: 0.7,
            chat_max_tokens: 500,
        }
    }

    fn assistant(chat: Arc<MockChatModel>, transcript: &str) -> Assistant {
        Assistant::new(
            test_cfg(),
            chat,
            Arc::new(MockTranscriber {
                transcript: transcript.to_string(),
            }),
        )
    }

    fn task(id: &str, date: &str, title: &str) -> Task {
        serde_json::from_value(serde_json::json!({
            "id": id, "title": title, "description": "", "date": date
        }))
        .expect("task")
    }

    #[tokio::test]
    async fn chat_parses_reply_envelope() {
        let chat = Arc::new(MockChatModel::new(
            r#"{"response": "You have one task today.", "user_msg": "What's my schedule for today?"}"#,
        ));
        let assistant = assistant(Arc::clone(&chat), "");

        let reply = assistant
            .chat(
                "whats my schedule for today",
                "+00:00",
                "2025-07-24T09:00:00Z",
                &[task("t1", "2025-07-24", "Fix minor bugs")],
            )
            .await
            .expect("reply");

        assert_eq!(reply.response, "You have one task today.");
        assert_eq!(reply.user_msg, "What's my schedule for today?");
    }

    #[tokio::test]
    async fn chat_embeds_only_relevant_tasks_in_prompt() {
        let chat = Arc::new(MockChatModel::new(r#"{"response": "ok", "user_msg": "ok"}"#));
        let assistant = assistant(Arc::clone(&chat), "");

        assistant
            .chat(
                "what's due today",
                "+00:00",
                "2025-07-24T09:00:00Z",
                &[
                    task("t1", "2025-07-24", "Fix minor bugs"),
                    task("t2", "2025-09-01", "Plan offsite"),
                ],
            )
            .await
            .expect("reply");

        let req = chat.last_request.lock().expect("lock").take().expect("request");
        assert!(req.system_prompt.contains("Fix minor bugs"));
        assert!(!req.system_prompt.contains("Plan offsite"));
        assert_eq!(req.max_tokens, Some(500));
    }

    #[tokio::test]
    async fn chat_falls_back_to_raw_text_reply() {
        let chat = Arc::new(MockChatModel::new("Sure, here is your schedule."));
        let assistant = assistant(chat, "");

        let reply = assistant
            .chat("hello", "+00:00", "2025-07-24T09:00:00Z", &[])
            .await
            .expect("reply");

        assert_eq!(reply.response, "Sure, here is your schedule.");
        assert_eq!(reply.user_msg, "hello");
    }

    #[tokio::test]
    async fn chat_rejects_invalid_timestamp() {
        let chat = Arc::new(MockChatModel::new("irrelevant"));
        let assistant = assistant(chat, "");

        let err = assistant
            .chat("hello", "+00:00", "yesterday-ish", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTimestamp(_)));
    }

    #[tokio::test]
    async fn chat_voice_runs_the_transcript_through_chat() {
        let chat = Arc::new(MockChatModel::new(
            r#"{"response": "done", "user_msg": "what's pending"}"#,
        ));
        let assistant = assistant(Arc::clone(&chat), "what's pending");

        let reply = assistant
            .chat_voice(
                vec![1, 2, 3],
                "clip.wav",
                "+00:00",
                "2025-07-24T09:00:00Z",
                &[],
            )
            .await
            .expect("reply");

        assert_eq!(reply.response, "done");
        let req = chat.last_request.lock().expect("lock").take().expect("request");
        assert_eq!(req.user_message, "what's pending");
    }

    #[tokio::test]
    async fn extract_task_assigns_id_status_and_normalizes() {
        let chat = Arc::new(MockChatModel::new(
            r#"Here you go:
{"title": "Call John", "description": "Discuss the project", "priority": "critical", "date": "2025-07-25", "time": "14:00", "tags": ["call"]}"#,
        ));
        let assistant = assistant(chat, "");

        let task = assistant
            .extract_task("call John tomorrow at 2pm", "2025-07-24T09:00:00Z")
            .await
            .expect("task");

        assert!(!task.id.is_empty());
        assert_eq!(task.status.as_deref(), Some("pending"));
        // Unrecognized priority coerced by normalization.
        assert_eq!(task.priority.as_deref(), Some("medium"));
        assert_eq!(task.date.as_deref(), Some("2025-07-25"));
        assert_eq!(task.category.as_deref(), Some("general"));
    }

    #[tokio::test]
    async fn extract_task_rejects_replies_without_json() {
        let chat = Arc::new(MockChatModel::new("I could not find a task in that."));
        let assistant = assistant(chat, "");

        let err = assistant
            .extract_task("mumble", "2025-07-24T09:00:00Z")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ModelResponse(_)));
    }

    #[tokio::test]
    async fn extract_task_rejects_empty_text() {
        let chat = Arc::new(MockChatModel::new("irrelevant"));
        let assistant = assistant(chat, "");

        let err = assistant
            .extract_task("   ", "2025-07-24T09:00:00Z")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn extract_task_from_voice_carries_the_transcript() {
        let chat = Arc::new(MockChatModel::new(
            r#"{"title": "Buy milk", "description": "Two liters", "priority": "low"}"#,
        ));
        let assistant = assistant(chat, "buy milk today");

        let extraction = assistant
            .extract_task_from_voice(vec![0u8; 16], "note.m4a", "2025-07-24T09:00:00Z")
            .await
            .expect("extraction");

        assert_eq!(extraction.transcript, "buy milk today");
        assert_eq!(extraction.task.title, "Buy milk");
        assert_eq!(extraction.task.status.as_deref(), Some("pending"));
    }
}
