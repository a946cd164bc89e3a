//! Rule-based task-relevance filtering and context windowing.
//!
//! Given a free-text query, an arbitrary-size task collection, and the
//! caller's current date, this narrows the collection to the subset most
//! relevant to the query, bounded to at most [`MAX_CONTEXT_TASKS`] records
//! ready to embed into a downstream language-model prompt.
//!
//! The classifier is an ordered cascade of rule categories over the
//! lower-cased query; the first category whose trigger keywords appear
//! wins and no later category is evaluated. A query containing both
//! "urgent" and "today" always resolves via the today rule because it is
//! checked first. The rules live in an explicit table so the precedence
//! is data, not branching syntax.
//!
//! Records are only selected and reordered, never mutated.

use chrono::{Datelike, Days, NaiveDate};
use tracing::info;

use crate::task::Task;

/// Hard cap on records injected into a prompt.
pub const MAX_CONTEXT_TASKS: usize = 15;
/// Cap applied to the schedule-intent fallback selection.
const MAX_SCHEDULE_TASKS: usize = 10;
/// Per-day cap in the generic default context (today + tomorrow).
const DEFAULT_CONTEXT_PER_DAY: usize = 3;
/// Words taken as search keywords after an "about"-style phrase.
const MAX_SEARCH_KEYWORDS: usize = 3;
/// Query length kept in the observability log line.
const LOG_QUERY_CHARS: usize = 50;

/// Filter applied once a rule's trigger keywords match.
#[derive(Debug, Clone, Copy)]
enum Rule {
    Today,
    Tomorrow,
    NextSevenDays,
    ThisWeek,
    HighPriority,
    LowPriority,
    Pending,
    InProgress,
    Completed,
    Overdue,
    KeywordSearch,
}

/// The ordered cascade: first trigger match wins.
const RULES: &[(&[&str], Rule)] = &[
    (&["today", "today's"], Rule::Today),
    (&["tomorrow", "tomorrow's"], Rule::Tomorrow),
    (
        &["next week", "next 7 days", "upcoming week"],
        Rule::NextSevenDays,
    ),
    (&["this week", "week"], Rule::ThisWeek),
    (&["urgent", "high priority", "important"], Rule::HighPriority),
    (&["low priority", "least important"], Rule::LowPriority),
    (&["pending", "not started", "todo"], Rule::Pending),
    (&["in progress", "working on", "current"], Rule::InProgress),
    (&["completed", "done", "finished"], Rule::Completed),
    (&["overdue", "late", "past due"], Rule::Overdue),
    (&["about", "regarding", "related to"], Rule::KeywordSearch),
];

/// Phrases whose trailing words become search keywords.
const SEARCH_PHRASES: &[&str] = &["about", "regarding", "related to"];

/// Queries with schedule intent get the windowed fallback.
const SCHEDULE_TRIGGERS: &[&str] = &[
    "schedule",
    "agenda",
    "calendar",
    "tasks",
    "what do i have",
    "meeting",
    "meetings",
    "appointments",
];

/// Within schedule intent, these widen the window into the recent past.
const MEETING_TRIGGERS: &[&str] = &["meeting", "meetings", "appointment", "appointments"];

/// Title/description keywords that mark a task as meeting-domain.
const MEETING_DOMAIN_KEYWORDS: &[&str] = &[
    "meeting",
    "conference",
    "call",
    "appointment",
    "attendance",
    "conferencia",
];

/// Narrows `tasks` to the records most relevant to `query`, anchored at
/// `today`. Output is an ordered subset of the input, cloned unmodified,
/// with length `0..=15`.
pub fn filter_relevant(tasks: &[Task], query: &str, today: NaiveDate) -> Vec<Task> {
    if tasks.is_empty() {
        return Vec::new();
    }

    let lowered = query.to_lowercase();

    let mut selected = match RULES
        .iter()
        .find(|(triggers, _)| triggers.iter().any(|t| lowered.contains(t)))
    {
        Some((_, rule)) => apply_rule(*rule, tasks, &lowered, today),
        None => Vec::new(),
    };

    // Fallback only when no rule matched or the matched rule came up empty.
    if selected.is_empty() {
        selected = fallback(tasks, &lowered, today);
    }

    if selected.len() > MAX_CONTEXT_TASKS {
        // Date-first here, priority-first in the fallback sort. The
        // original system uses both orders; both are pinned by tests.
        selected.sort_by(|a, b| {
            (a.sort_date(), a.priority_rank()).cmp(&(b.sort_date(), b.priority_rank()))
        });
        selected.truncate(MAX_CONTEXT_TASKS);
    }

    info!(
        input = tasks.len(),
        output = selected.len(),
        query = %truncate_chars(query, LOG_QUERY_CHARS),
        "narrowed task context"
    );

    selected
}

fn apply_rule(rule: Rule, tasks: &[Task], lowered_query: &str, today: NaiveDate) -> Vec<Task> {
    match rule {
        Rule::Today => with_date(tasks, &iso(today)),
        Rule::Tomorrow => with_date(tasks, &iso(today + Days::new(1))),
        Rule::NextSevenDays => within(tasks, &iso(today), &iso(today + Days::new(7))),
        Rule::ThisWeek => {
            // Monday-Sunday window containing today.
            let monday = today - Days::new(u64::from(today.weekday().num_days_from_monday()));
            within(tasks, &iso(monday), &iso(monday + Days::new(6)))
        }
        Rule::HighPriority => with_priority(tasks, "high"),
        Rule::LowPriority => with_priority(tasks, "low"),
        Rule::Pending => with_status(tasks, "pending"),
        Rule::InProgress => with_status(tasks, "in progress"),
        Rule::Completed => with_status(tasks, "completed"),
        Rule::Overdue => {
            let today = iso(today);
            tasks
                .iter()
                .filter(|t| {
                    t.scheduled_date().is_some_and(|d| d < today.as_str())
                        && t.status.as_deref() != Some("completed")
                })
                .cloned()
                .collect()
        }
        Rule::KeywordSearch => keyword_search(tasks, lowered_query),
    }
}

/// Extracts up to three words following each matched search phrase and
/// keeps tasks whose title or description contains any of them.
fn keyword_search(tasks: &[Task], lowered_query: &str) -> Vec<Task> {
    let mut keywords: Vec<&str> = Vec::new();
    for phrase in SEARCH_PHRASES {
        if let Some(idx) = lowered_query.find(phrase) {
            let remainder = &lowered_query[idx + phrase.len()..];
            keywords.extend(remainder.split_whitespace().take(MAX_SEARCH_KEYWORDS));
        }
    }

    if keywords.is_empty() {
        return Vec::new();
    }

    tasks
        .iter()
        .filter(|t| {
            let title = t.title.to_lowercase();
            let description = t.description.to_lowercase();
            keywords
                .iter()
                .any(|kw| title.contains(kw) || description.contains(kw))
        })
        .cloned()
        .collect()
}

/// Context-sensitive defaults for queries no rule answered.
fn fallback(tasks: &[Task], lowered_query: &str, today: NaiveDate) -> Vec<Task> {
    if SCHEDULE_TRIGGERS.iter().any(|t| lowered_query.contains(t)) {
        let mut windowed = if MEETING_TRIGGERS.iter().any(|t| lowered_query.contains(t)) {
            meeting_window(tasks, today)
        } else {
            within(tasks, &iso(today), &iso(today + Days::new(7)))
        };

        windowed.sort_by(|a, b| {
            (a.priority_rank(), a.sort_date()).cmp(&(b.priority_rank(), b.sort_date()))
        });
        windowed.truncate(MAX_SCHEDULE_TASKS);
        return windowed;
    }

    // Generic default context: a few of today's and tomorrow's tasks, in
    // their original relative order.
    let today_str = iso(today);
    let tomorrow_str = iso(today + Days::new(1));

    let mut out: Vec<Task> = tasks
        .iter()
        .filter(|t| t.scheduled_date() == Some(today_str.as_str()))
        .take(DEFAULT_CONTEXT_PER_DAY)
        .cloned()
        .collect();
    out.extend(
        tasks
            .iter()
            .filter(|t| t.scheduled_date() == Some(tomorrow_str.as_str()))
            .take(DEFAULT_CONTEXT_PER_DAY)
            .cloned(),
    );
    out
}

/// Meeting queries look from yesterday through next week, narrowed to
/// meeting-domain tasks when any exist in that window.
fn meeting_window(tasks: &[Task], today: NaiveDate) -> Vec<Task> {
    let windowed = within(
        tasks,
        &iso(today - Days::new(1)),
        &iso(today + Days::new(7)),
    );

    let meeting_tasks: Vec<Task> = windowed
        .iter()
        .filter(|t| {
            let title = t.title.to_lowercase();
            let description = t.description.to_lowercase();
            MEETING_DOMAIN_KEYWORDS
                .iter()
                .any(|kw| title.contains(kw) || description.contains(kw))
        })
        .cloned()
        .collect();

    if meeting_tasks.is_empty() {
        windowed
    } else {
        meeting_tasks
    }
}

fn with_date(tasks: &[Task], date: &str) -> Vec<Task> {
    tasks
        .iter()
        .filter(|t| t.scheduled_date() == Some(date))
        .cloned()
        .collect()
}

fn within(tasks: &[Task], start: &str, end: &str) -> Vec<Task> {
    tasks
        .iter()
        .filter(|t| {
            t.scheduled_date()
                .is_some_and(|d| start <= d && d <= end)
        })
        .cloned()
        .collect()
}

fn with_priority(tasks: &[Task], priority: &str) -> Vec<Task> {
    tasks
        .iter()
        .filter(|t| t.priority.as_deref() == Some(priority))
        .cloned()
        .collect()
}

fn with_status(tasks: &[Task], status: &str) -> Vec<Task> {
    tasks
        .iter()
        .filter(|t| t.status.as_deref() == Some(status))
        .cloned()
        .collect()
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
