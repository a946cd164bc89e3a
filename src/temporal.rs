//! Temporal resolution for natural-language date references.
//!
//! Resolution is anchored to a caller-supplied current moment; nothing in
//! this module reads the process clock. Parsing is best-effort assistance
//! for a ranking heuristic, not a contract requiring caller validation,
//! so it never fails: the worst case is falling back to today's date. The
//! one exception is [`parse_instant`], where every downstream date
//! computation depends on the result and a clear failure beats a silent
//! guess.

use std::sync::LazyLock;

use chrono::{DateTime, Days, NaiveDate, Utc};
use regex::Regex;

use crate::error::AppError;

/// `D/M/YYYY` or `DD/MM/YYYY`: day first, then month, then 4-digit year.
static ABSOLUTE_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})/(\d{1,2})/(\d{4})").expect("valid date pattern"));

/// Parses the caller-supplied current moment (RFC 3339 / ISO-8601, `Z`
/// accepted) into a UTC instant.
pub fn parse_instant(raw: &str) -> Result<DateTime<Utc>, AppError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| {
            AppError::invalid_timestamp(format!(
                "invalid date_time={raw:?}; expected an ISO-8601 instant: {err}"
            ))
        })
}

/// Resolves a relative date phrase found anywhere in `text`, anchored at
/// `now`. Checked in priority order: "today", "tomorrow", "next week"
/// (+7 days), "next month" (a fixed 30-day offset, not month-aware).
/// Falls through to absolute-pattern extraction, then defaults to `now`.
pub fn resolve_relative_phrase(text: &str, now: NaiveDate) -> NaiveDate {
    let lowered = text.to_lowercase();

    if lowered.contains("today") {
        return now;
    }
    if lowered.contains("tomorrow") {
        return now + Days::new(1);
    }
    if lowered.contains("next week") {
        return now + Days::new(7);
    }
    if lowered.contains("next month") {
        return now + Days::new(30);
    }

    extract_absolute_date(text).unwrap_or(now)
}

/// Extracts the first `D/M/YYYY` pattern from `text` that forms a valid
/// calendar date. Invalid triples (month 13, day 32, ...) are discarded
/// silently.
pub fn extract_absolute_date(text: &str) -> Option<NaiveDate> {
    let caps = ABSOLUTE_DATE.captures(text)?;
    let day = caps[1].parse::<u32>().ok()?;
    let month = caps[2].parse::<u32>().ok()?;
    let year = caps[3].parse::<i32>().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("date")
    }

    #[test]
    fn resolves_relative_phrases() {
        let now = d("2025-07-24");
        assert_eq!(resolve_relative_phrase("do it today", now), d("2025-07-24"));
        assert_eq!(
            resolve_relative_phrase("Call John TOMORROW", now),
            d("2025-07-25")
        );
        assert_eq!(
            resolve_relative_phrase("ship next week", now),
            d("2025-07-31")
        );
        assert_eq!(
            resolve_relative_phrase("renew next month", now),
            d("2025-08-23")
        );
    }

    #[test]
    fn tomorrow_is_stable_under_repetition() {
        let now = d("2025-12-31");
        for _ in 0..3 {
            assert_eq!(resolve_relative_phrase("tomorrow", now), d("2026-01-01"));
        }
    }

    #[test]
    fn relative_phrase_wins_over_absolute_pattern() {
        let now = d("2025-07-24");
        assert_eq!(
            resolve_relative_phrase("today, not 1/1/2030", now),
            d("2025-07-24")
        );
    }

    #[test]
    fn extracts_valid_absolute_dates() {
        assert_eq!(
            extract_absolute_date("meet on 5/8/2025 at noon"),
            Some(d("2025-08-05"))
        );
        assert_eq!(
            extract_absolute_date("deadline 24/12/2025"),
            Some(d("2025-12-24"))
        );
    }

    #[test]
    fn invalid_absolute_dates_fall_through_to_now() {
        let now = d("2025-07-24");
        assert_eq!(extract_absolute_date("on 5/13/2025"), None);
        assert_eq!(resolve_relative_phrase("on 5/13/2025", now), now);
        assert_eq!(resolve_relative_phrase("no date here", now), now);
    }

    #[test]
    fn parse_instant_accepts_zulu_and_offsets() {
        assert!(parse_instant("2025-07-24T14:18:36.514Z").is_ok());
        assert!(parse_instant("2025-07-24T14:18:36+05:30").is_ok());
    }

    #[test]
    fn parse_instant_rejects_garbage() {
        let err = parse_instant("not-a-timestamp").unwrap_err();
        assert!(matches!(err, AppError::InvalidTimestamp(_)));
        assert!(parse_instant("2025-07-24").is_err());
    }
}
