//! Prompt assembly for the language-model collaborator.
//!
//! The filtered task context is serialized into the system prompt as
//! pretty-printed JSON; the model is instructed to answer with a small
//! JSON envelope so the orchestration layer can recover structured fields.

use chrono::{DateTime, Utc};

use crate::task::Task;

/// Reply-format contract repeated to the model on every chat turn.
pub const REPLY_ENVELOPE: &str =
    r#"{"response": "Your helpful response here", "user_msg": "The corrected user message (fix any errors or keep as-is)"}"#;

/// System role content sent with task-extraction requests.
pub const EXTRACTION_SYSTEM_PROMPT: &str =
    "You are a helpful assistant that extracts task information from text and returns it as JSON.";

/// Builds the chat-turn system prompt: current GMT moment, the user's
/// timezone, and the filtered task context when there is any.
pub fn build_chat_system_prompt(
    filtered: &[Task],
    now: DateTime<Utc>,
    time_zone: &str,
) -> String {
    let mut prompt = format!(
        "You are a helpful AI assistant with task management capabilities.\n\
         Current date and time (GMT): {} ({})\n\
         User's timezone: GMT{time_zone}\n\
         Note: Convert all times to the user's timezone (GMT{time_zone}) when displaying times or dates to the user.\n\
         \n\
         You help users manage their tasks and answer questions about their schedule, priorities, and workload.\n\
         \n\
         IMPORTANT: Always respond in the following JSON format:\n\
         {REPLY_ENVELOPE}",
        now.format("%Y-%m-%d %H:%M:%S"),
        now.format("%A, %B %d, %Y at %H:%M"),
    );

    if filtered.is_empty() {
        prompt.push_str(
            "\n\nNo tasks match the current query, but you can still help with \
             general questions and task management advice.",
        );
        return prompt;
    }

    let context = serde_json::to_string_pretty(filtered).unwrap_or_else(|_| "[]".to_string());
    prompt.push_str(&format!(
        "\n\nYou have access to the following relevant tasks:\n\
         {context}\n\
         \n\
         Use this task information to provide relevant and contextual responses. You can \
         reference specific tasks, help with scheduling, provide reminders, or answer \
         questions related to the tasks.\n\
         \n\
         Guidelines:\n\
         - All times in the system are in GMT; convert to the user's timezone (GMT{time_zone}) when displaying them\n\
         - The date field in tasks is the date when the task should be done\n\
         - The time field in tasks is in 24-hour format (GMT)\n\
         - Be concise, reference specific tasks when relevant, and provide actionable insights\n\
         - IMPORTANT: Always respond in the following JSON format:\n\
         \n\
         {REPLY_ENVELOPE}"
    ));
    prompt
}

/// Builds the task-extraction prompt sent as the user message: two-step
/// transcription cleanup plus structured extraction, anchored on today's
/// and tomorrow's dates so relative phrases resolve deterministically.
pub fn build_extraction_prompt(text: &str, now: DateTime<Utc>) -> String {
    let today = now.date_naive();
    let tomorrow = today + chrono::Days::new(1);

    format!(
        "Be prepared for multilingual input. Your task has two steps.\n\
         \n\
         STEP 1: FIX ANY TRANSCRIPTION ERRORS IN THE INPUT TEXT\n\
         - Keep the same language as the input; do not translate\n\
         - Fix obvious transcription errors, especially numbers, dates, and times\n\
         - Maintain the original meaning and intent\n\
         \n\
         STEP 2: EXTRACT TASK INFORMATION FROM THE CORRECTED TEXT\n\
         The JSON structure and field names are in English. The values for 'title' and \
         'description' must stay in the input language; all other values (priority, date, \
         time, category, tags) are in English. Never use relative words like tomorrow, \
         today, or next week in the title or description.\n\
         \n\
         Current date and time: {}\n\
         Today's date: {} ({})\n\
         Tomorrow's date: {} ({})\n\
         \n\
         Text to analyze: \"{text}\"\n\
         \n\
         Extract and structure this into a task with the following fields:\n\
         - title: a clear, concise title for the task\n\
         - description: detailed description of what needs to be done\n\
         - priority: \"high\", \"medium\", or \"low\" based on urgency keywords\n\
         - date: any date mention converted to YYYY-MM-DD (\"today\" = {}, \"tomorrow\" = {}, \
         \"next week\" = about 7 days from today); null when no date is mentioned\n\
         - time: any time mention in 24-hour HH:MM format; null when no time is mentioned \
         (never words like morning or evening)\n\
         - category: one of work, personal, health, shopping, meeting, reminder, or similar\n\
         - tags: relevant keywords, in English\n\
         \n\
         Respond with a JSON object only, no additional text. Example:\n\
         {{\n\
         \x20   \"title\": \"Call John about project meeting\",\n\
         \x20   \"description\": \"Need to call John to discuss the upcoming project meeting details\",\n\
         \x20   \"priority\": \"medium\",\n\
         \x20   \"date\": \"{}\",\n\
         \x20   \"time\": \"14:00\",\n\
         \x20   \"category\": \"work\",\n\
         \x20   \"tags\": [\"call\", \"meeting\", \"john\", \"project\"]\n\
         }}",
        now.format("%Y-%m-%dT%H:%M:%SZ"),
        today.format("%Y-%m-%d"),
        today.format("%A, %B %d, %Y"),
        tomorrow.format("%Y-%m-%d"),
        tomorrow.format("%A, %B %d, %Y"),
        today.format("%Y-%m-%d"),
        tomorrow.format("%Y-%m-%d"),
        today.format("%Y-%m-%d"),
    )
}
