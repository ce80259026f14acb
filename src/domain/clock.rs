//! Timestamp encoding shared by every table.
//!
//! Timestamps are stored as RFC 3339 UTC strings with millisecond precision and
//! a `Z` suffix. The format is fixed-width, so string comparison in SQL gives
//! the same ordering as time comparison.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

#[must_use]
pub fn stamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[must_use]
pub fn now_stamp() -> String {
    stamp(Utc::now())
}

/// Parses any RFC 3339 timestamp (any offset) and normalises it to UTC.
///
/// A bare `YYYY-MM-DDTHH:MM` or `YYYY-MM-DDTHH:MM:SS` value, as produced by
/// `datetime-local` form inputs, is accepted and treated as UTC.
pub fn parse(value: &str) -> Result<DateTime<Utc>, String> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(naive.and_utc());
        }
    }

    Err(format!("Invalid timestamp: '{value}'"))
}

/// Parses a stored value, falling back to the Unix epoch for corrupt rows.
#[must_use]
pub fn parse_stored(value: &str) -> DateTime<Utc> {
    parse(value).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Parses a date (`YYYY-MM-DD`) or a full timestamp into a normalised stamp.
///
/// Dates are kept as plain dates; they are only compared against other dates
/// or against stamps by prefix.
pub fn normalise_date_or_stamp(value: &str) -> Result<String, String> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date.format("%Y-%m-%d").to_string());
    }
    parse(value).map(stamp)
}

/// Reads back a value written by [`normalise_date_or_stamp`]; dates become midnight UTC.
#[must_use]
pub fn parse_date_or_stamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    parse(value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_stamp_is_fixed_width_utc() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        assert_eq!(stamp(at), "2024-01-01T10:00:00.000Z");
    }

    #[test]
    fn test_parse_normalises_offsets() {
        let parsed = parse("2024-01-01T12:00:00+02:00").unwrap();
        assert_eq!(stamp(parsed), "2024-01-01T10:00:00.000Z");
    }

    #[test]
    fn test_parse_accepts_form_input() {
        let parsed = parse("2024-01-01T10:00").unwrap();
        assert_eq!(stamp(parsed), "2024-01-01T10:00:00.000Z");
        assert!(parse("yesterday").is_err());
    }

    #[test]
    fn test_stamps_sort_like_times() {
        let early = stamp(Utc.with_ymd_and_hms(2024, 1, 1, 9, 59, 59).unwrap());
        let late = stamp(Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap());
        assert!(early < late);
    }

    #[test]
    fn test_normalise_date_or_stamp() {
        assert_eq!(normalise_date_or_stamp("2025-06-30").unwrap(), "2025-06-30");
        assert_eq!(
            normalise_date_or_stamp("2025-06-30T08:00:00Z").unwrap(),
            "2025-06-30T08:00:00.000Z"
        );
        assert!(normalise_date_or_stamp("30/06/2025").is_err());
    }
}
