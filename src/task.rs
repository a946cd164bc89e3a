//! Task record model.
//!
//! Tasks arrive from an external store on every request; this crate never
//! persists them. Recognized fields are typed, everything else is carried
//! through untouched in `extra`. Dates are kept as `YYYY-MM-DD` strings:
//! the format is fixed-width and zero-padded, so lexical order equals
//! chronological order and range tests are plain string comparisons.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

/// Sort key substitute for records without a scheduled date, so they
/// order after every real date.
pub const MISSING_DATE_SENTINEL: &str = "9999-12-31";

/// A unit of user-manageable work, as supplied by the task store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Opaque identifier assigned by the task's origin.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// One of `high`, `medium`, `low`; anything else ranks lowest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    /// One of `pending`, `in progress`, `completed` in practice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Scheduled calendar date as `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Legacy name for `date`, still honored when `date` is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    /// Scheduled time as `HH:MM`, 24-hour.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Unrecognized keys, passed through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Task {
    /// Returns the record's scheduled date, preferring `date` over the
    /// legacy `due_date`. Empty strings count as absent. A `None` here
    /// means the record is dateless: excluded from any date-range test
    /// but still eligible for non-date filters.
    pub fn scheduled_date(&self) -> Option<&str> {
        self.date
            .as_deref()
            .filter(|d| !d.is_empty())
            .or_else(|| self.due_date.as_deref().filter(|d| !d.is_empty()))
    }

    /// Scheduled date, or the sentinel that sorts after all real dates.
    pub fn sort_date(&self) -> &str {
        self.scheduled_date().unwrap_or(MISSING_DATE_SENTINEL)
    }

    /// Numeric priority encoding for sorting: 0 = high, 1 = medium,
    /// 2 = everything else (including absent or unrecognized values).
    pub fn priority_rank(&self) -> u8 {
        match self.priority.as_deref() {
            Some("high") => 0,
            Some("medium") => 1,
            _ => 2,
        }
    }

    /// Cleans up a model-extracted task: fills required fields with
    /// defaults, coerces unrecognized priorities to `medium`, validates
    /// the date as `YYYY-MM-DD` (ISO datetimes are reduced to their date,
    /// garbage is dropped), and migrates a legacy `due_date` into `date`.
    pub fn normalized(mut self) -> Self {
        if self.title.trim().is_empty() {
            self.title = "Untitled Task".to_string();
        }
        if self.description.trim().is_empty() {
            self.description = self.title.clone();
        }
        match self.priority.as_deref() {
            Some("high" | "medium" | "low") => {}
            _ => self.priority = Some("medium".to_string()),
        }
        if self.category.as_deref().map_or(true, |c| c.trim().is_empty()) {
            self.category = Some("general".to_string());
        }
        if self.tags.is_none() {
            self.tags = Some(Vec::new());
        }

        self.date = self.date.take().and_then(|raw| coerce_iso_date(&raw));
        if self.date.is_none() {
            if let Some(due) = self.due_date.take() {
                self.date = coerce_iso_date(&due);
            }
        }
        self.due_date = None;
        self
    }
}

/// Best-effort coercion of a date value into `YYYY-MM-DD`.
fn coerce_iso_date(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").is_ok() {
        return Some(trimmed.to_string());
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.date_naive().format("%Y-%m-%d").to_string())
}
