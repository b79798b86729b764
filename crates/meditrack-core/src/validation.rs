//! Input validation shared by the save path and the analytics path.
//!
//! Everything here is pure: bad input comes back as a named failure,
//! never as a panic.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::{PayloadError, RangeError};
use crate::session::NewSession;

/// Default upper bound for an analytics date range.
pub const MAX_DATE_RANGE_DAYS: u32 = 365;

const MS_PER_DAY: f64 = 86_400_000.0;

/// Parses an ISO-8601 date or date-time.
///
/// Accepts RFC 3339 (`2023-01-02T10:00:00Z`, with offset or fraction),
/// a date-time without offset (read as UTC), and a bare `YYYY-MM-DD`
/// (UTC midnight).
pub fn parse_iso_date(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Non-empty string that parses to a valid date.
pub fn is_valid_iso_date_string(s: &str) -> bool {
    parse_iso_date(s).is_some()
}

/// Finite and strictly greater than zero.
pub fn is_positive_number(n: f64) -> bool {
    n.is_finite() && n > 0.0
}

/// A validated analytics date range.
#[derive(Debug, Clone, PartialEq)]
pub struct DateRange {
    /// The start date as the caller wrote it.
    pub start_raw: String,
    /// The end date as the caller wrote it.
    pub end_raw: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Length of the range in days, fractional for partial days.
    ///
    /// `2023-01-01` to `2023-01-08` is 7.
    pub fn total_days(&self) -> f64 {
        (self.end - self.start).num_milliseconds() as f64 / MS_PER_DAY
    }
}

/// Validates an analytics range. Checks run in order and the first
/// failure wins: start, end, ordering, size.
pub fn validate_date_range(
    start: Option<&str>,
    end: Option<&str>,
    max_days: u32,
) -> Result<DateRange, RangeError> {
    let start_raw = start
        .filter(|s| !s.is_empty())
        .ok_or(RangeError::StartDateMissing)?;
    let start_at = parse_iso_date(start_raw).ok_or(RangeError::StartDateInvalid)?;

    let end_raw = end
        .filter(|s| !s.is_empty())
        .ok_or(RangeError::EndDateMissing)?;
    let end_at = parse_iso_date(end_raw).ok_or(RangeError::EndDateInvalid)?;

    if end_at <= start_at {
        return Err(RangeError::EndDateBeforeStartDate);
    }

    let range = DateRange {
        start_raw: start_raw.to_string(),
        end_raw: end_raw.to_string(),
        start: start_at,
        end: end_at,
    };
    if range.total_days() > f64::from(max_days) {
        return Err(RangeError::DateRangeTooLarge { max_days });
    }
    Ok(range)
}

/// Validates a raw `{session_start_time, duration_seconds}` body.
///
/// The duration must be a positive whole number of seconds.
pub fn validate_session_payload(raw: &serde_json::Value) -> Result<NewSession, PayloadError> {
    let start = raw
        .get("session_start_time")
        .and_then(|v| v.as_str())
        .and_then(parse_iso_date)
        .ok_or(PayloadError::StartTimeInvalid)?;

    let duration = raw
        .get("duration_seconds")
        .and_then(|v| v.as_f64())
        .filter(|n| is_positive_number(*n))
        .ok_or(PayloadError::DurationInvalid)?;
    if duration.fract() != 0.0 || duration > u32::MAX as f64 {
        return Err(PayloadError::DurationInvalid);
    }

    Ok(NewSession::new(start, duration as u64))
}
