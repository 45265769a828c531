//! Time and date parsing utilities.

use crate::error::{Result, TrackerError};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

/// Earliest year accepted from tracker data. Older values are placeholders.
const MIN_YEAR: i32 = 1970;

/// Parse a date as found in a tracker export.
///
/// Supports:
/// - RFC 2822: `Mon, 15 Jan 2024 10:30:00 +0100` (RSS item dates)
/// - RFC 3339: `2024-01-15T10:30:00Z`
/// - `2024-01-15 10:30:00` and `2024-01-15` (UTC)
/// - `15/Jan/24` (tracker short form)
///
/// Returns `None` when nothing matches or the year is before 1970.
#[must_use]
pub fn parse_tracker_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let parsed = DateTime::parse_from_rfc2822(s)
        .or_else(|_| DateTime::parse_from_rfc3339(s))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|naive| Utc.from_utc_datetime(&naive))
        })
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .or_else(|_| NaiveDate::parse_from_str(s, "%d/%b/%y"))
                .ok()
                .map(|date| Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
        })?;

    if parsed.year() < MIN_YEAR {
        tracing::debug!(value = s, "Ignoring pre-epoch placeholder date");
        return None;
    }

    Some(parsed)
}

/// Parse a user-supplied due date for a CLI argument.
///
/// Accepts everything [`parse_tracker_date`] does.
///
/// # Errors
///
/// Returns a validation error naming `field_name` if the value is not a date.
pub fn parse_user_date(s: &str, field_name: &str) -> Result<DateTime<Utc>> {
    parse_tracker_date(s).ok_or_else(|| {
        TrackerError::validation(
            field_name,
            format!("invalid date '{}' (try 2025-01-15 or an RFC 3339 timestamp)", s.trim()),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_rfc2822() {
        let dt = parse_tracker_date("Mon, 15 Jan 2024 10:30:00 +0100").unwrap();
        assert_eq!(dt.year(), 2024);
        assert_eq!(dt.hour(), 9);
    }

    #[test]
    fn test_parse_rfc3339() {
        let dt = parse_tracker_date("2025-01-15T12:00:00Z").unwrap();
        assert_eq!(dt.month(), 1);
        assert_eq!(dt.day(), 15);
    }

    #[test]
    fn test_parse_plain_formats() {
        assert!(parse_tracker_date("2024-03-01 08:00:00").is_some());
        let date = parse_tracker_date("2024-03-01").unwrap();
        assert_eq!(date.hour(), 0);
        let short = parse_tracker_date("05/Feb/24").unwrap();
        assert_eq!((short.year(), short.month(), short.day()), (2024, 2, 5));
    }

    #[test]
    fn test_pre_epoch_rejected() {
        assert!(parse_tracker_date("1900-01-01").is_none());
        assert!(parse_tracker_date("0001-01-01T00:00:00Z").is_none());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(parse_tracker_date("").is_none());
        assert!(parse_tracker_date("not a date").is_none());
        assert!(parse_tracker_date("2024-13-45").is_none());
    }

    #[test]
    fn test_parse_user_date_error() {
        let err = parse_user_date("soon", "due").unwrap_err();
        assert!(err.to_string().contains("due"));
    }
}
