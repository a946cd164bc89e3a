//! Task-relevance filtering and context windowing for an LLM-backed task
//! assistant.
//!
//! The heart of the crate is [`relevance::filter_relevant`]: given a
//! free-text query, an externally supplied collection of task records, and
//! the caller's current date, it narrows the collection to a prioritized,
//! size-bounded subset ready to embed into a language-model prompt. A
//! rule-based intent classifier picks the filter (date windows, priority,
//! status, overdue, keyword search), context-sensitive fallbacks cover
//! queries no rule answers, and a final cap keeps the result at fifteen
//! records.
//!
//! Around the core, [`assistant::Assistant`] orchestrates chat turns and
//! task extraction against the remote model collaborators defined in
//! [`provider`]. The filter itself is pure and synchronous: the current
//! moment is always an explicit parameter, and records are selected and
//! reordered but never mutated.

pub mod assistant;
pub mod config;
pub mod error;
pub mod prompt;
pub mod provider;
pub mod relevance;
pub mod task;
pub mod temporal;

pub use assistant::{Assistant, ChatReply, TaskExtraction};
pub use config::AppConfig;
pub use error::AppError;
pub use relevance::{filter_relevant, MAX_CONTEXT_TASKS};
pub use task::Task;
