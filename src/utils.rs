//! Helpers for timezone display, string truncation, and logging.
//!
//! Timestamps are persisted in UTC; everything user-facing is shown in
//! Brasília time. Brasília has been a fixed UTC-3 offset since 2019, so a
//! `FixedOffset` is enough and no tz database is needed.

use chrono::{DateTime, Duration, FixedOffset, Utc};

/// Brasília offset (UTC-3, no DST).
pub fn brasilia() -> FixedOffset {
    FixedOffset::west_opt(3 * 3600).unwrap()
}

/// Format a UTC timestamp for display in Brasília: `18/02/2026 às 16:23`.
pub fn fmt_brasilia(dt: DateTime<Utc>) -> String {
    dt.with_timezone(&brasilia())
        .format("%d/%m/%Y às %H:%M")
        .to_string()
}

/// Compact Brasília time relative to `now`: `16:38` on the same day,
/// `ontem 14:30` for yesterday, `17/02 10:00` otherwise.
pub fn fmt_brasilia_relative(dt: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let tz = brasilia();
    let local = dt.with_timezone(&tz);
    let today = now.with_timezone(&tz).date_naive();

    if local.date_naive() == today {
        local.format("%H:%M").to_string()
    } else if local.date_naive() == today - Duration::days(1) {
        format!("ontem {}", local.format("%H:%M"))
    } else {
        local.format("%d/%m %H:%M").to_string()
    }
}

/// Truncate to at most `max` characters, appending an ellipsis when cut.
/// Counts chars rather than bytes so multi-byte text never splits mid-char.
pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max).collect();
        out.push('…');
        out
    }
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut at `max` characters with a byte-count indicator
/// appended, so warning lines stay readable when a response body misbehaves.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let cut = s
            .char_indices()
            .take(max)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn fmt_brasilia_shifts_three_hours_back() {
        let dt = Utc.with_ymd_and_hms(2026, 2, 18, 19, 23, 0).unwrap();
        assert_eq!(fmt_brasilia(dt), "18/02/2026 às 16:23");
    }

    #[test]
    fn fmt_brasilia_crosses_midnight() {
        // 01:30 UTC is still 22:30 of the previous day in Brasília.
        let dt = Utc.with_ymd_and_hms(2026, 2, 18, 1, 30, 0).unwrap();
        assert_eq!(fmt_brasilia(dt), "17/02/2026 às 22:30");
    }

    #[test]
    fn relative_same_day_shows_time_only() {
        let now = Utc.with_ymd_and_hms(2026, 2, 18, 22, 0, 0).unwrap();
        let dt = Utc.with_ymd_and_hms(2026, 2, 18, 19, 38, 0).unwrap();
        assert_eq!(fmt_brasilia_relative(dt, now), "16:38");
    }

    #[test]
    fn relative_yesterday_is_prefixed() {
        let now = Utc.with_ymd_and_hms(2026, 2, 18, 22, 0, 0).unwrap();
        let dt = Utc.with_ymd_and_hms(2026, 2, 17, 17, 30, 0).unwrap();
        assert_eq!(fmt_brasilia_relative(dt, now), "ontem 14:30");
    }

    #[test]
    fn relative_older_shows_short_date() {
        let now = Utc.with_ymd_and_hms(2026, 2, 18, 22, 0, 0).unwrap();
        let dt = Utc.with_ymd_and_hms(2026, 2, 10, 13, 0, 0).unwrap();
        assert_eq!(fmt_brasilia_relative(dt, now), "10/02 10:00");
    }

    #[test]
    fn truncate_chars_respects_multibyte() {
        assert_eq!(truncate_chars("políticas", 100), "políticas");
        assert_eq!(truncate_chars("políticas", 4), "polí…");
    }

    #[test]
    fn truncate_for_log_short_string_passes_through() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn truncate_for_log_long_string_reports_remainder() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }
}
