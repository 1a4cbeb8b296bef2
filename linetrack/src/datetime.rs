//! Parsing of the date and time values clients send.
//!
//! Interval bounds arrive in several shapes depending on the client: RFC 3339 from API
//! consumers, `YYYY-MM-DD HH:MM:SS` from the admin tooling and `MM/DD/YYYY, h:mm AM` from the
//! floor UI's date picker. Values without an offset are taken as UTC.
//!
//! Durations such as a controller family's production time and shift boundaries are
//! time-of-day values in strict `HH:MM:SS`.

use chrono::{DateTime, NaiveDateTime, NaiveTime, Timelike, Utc};

use crate::errors::Error;

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%m/%d/%Y, %I:%M %p", "%m/%d/%Y %I:%M %p"];

/// Parse an interval bound. `field` names the request field for the error message.
pub fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>, Error> {
    let value = value.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| Error::BadRequest {
            message: format!("Invalid {field} format. Please use a valid date format (e.g., YYYY-MM-DD HH:mm:ss)"),
        })
}

/// Parse an optional interval bound, treating empty strings as absent
pub fn parse_optional_timestamp(field: &str, value: Option<&str>) -> Result<Option<DateTime<Utc>>, Error> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => parse_timestamp(field, v).map(Some),
    }
}

/// Parse a strict `HH:MM:SS` time-of-day value
pub fn parse_clock_time(field: &str, value: &str) -> Result<NaiveTime, Error> {
    let value = value.trim();
    let well_formed = value.len() == 8 && value.as_bytes()[2] == b':' && value.as_bytes()[5] == b':';

    well_formed
        .then(|| NaiveTime::parse_from_str(value, "%H:%M:%S").ok())
        .flatten()
        .ok_or_else(|| Error::BadRequest {
            message: format!("Invalid {field} format. Please use HH:mm:ss"),
        })
}

/// A time-of-day value read as an elapsed duration, e.g. `01:30:00` → 5400
pub fn clock_time_seconds(time: NaiveTime) -> i64 {
    i64::from(time.num_seconds_from_midnight())
}
