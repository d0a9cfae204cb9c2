//! Renderers turning a classified GitLab payload into a [`Notification`]
//!
//! Every renderer is a pure function of the payload and the time the request
//! was received. Missing optional fields leave the matching notification
//! attribute empty; missing required fields fail with
//! [`RelayError::MissingField`].

pub mod pipeline;
pub mod push;
pub mod tag_push;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use crate::error::{RelayError, Result};
use crate::event::EventKind;
use crate::notification::Notification;
use crate::payload::Field;

/// Render the notification for an already resolved event
pub fn render(kind: EventKind, body: &Value, received_at: DateTime<Utc>) -> Result<Notification> {
    let root = Field::root(body);
    match kind {
        EventKind::Push => push::render(&root, received_at),
        EventKind::TagPush => tag_push::render(&root, received_at),
        EventKind::Pipeline(status) => pipeline::render(&root, status),
    }
}

/// Parse a GitLab timestamp field.
///
/// GitLab has sent RFC 3339 (`2024-05-01T10:00:00Z`), offset
/// (`2024-05-01 10:00:00 +0200`) and `UTC`-suffixed forms over the years.
/// Values without an offset are taken as UTC, with either a `T` or a space
/// between date and time and optional fractional seconds.
pub(crate) fn parse_timestamp(field: &Field<'_>) -> Result<DateTime<Utc>> {
    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    let raw = field.str()?.trim();
    let malformed = || RelayError::MalformedTimestamp {
        path: field.path().to_string(),
        value: raw.to_string(),
    };

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f %z") {
        return Ok(ts.with_timezone(&Utc));
    }
    let naive = raw
        .strip_suffix("UTC")
        .or_else(|| raw.strip_suffix('Z'))
        .map(str::trim_end)
        .unwrap_or(raw);
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(naive, format).ok())
        .map(|ts| ts.and_utc())
        .ok_or_else(malformed)
}

/// First line of a commit message
pub(crate) fn first_line(message: &str) -> &str {
    message.lines().next().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn parse(value: Value) -> Result<DateTime<Utc>> {
        let body = json!({ "created_at": value });
        parse_timestamp(&Field::root(&body).get("created_at"))
    }

    #[test]
    fn parses_gitlab_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();

        assert_eq!(parse(json!("2024-05-01T10:00:00Z")).unwrap(), expected);
        assert_eq!(parse(json!("2024-05-01T12:00:00+02:00")).unwrap(), expected);
        assert_eq!(parse(json!("2024-05-01 12:00:00 +0200")).unwrap(), expected);
        assert_eq!(parse(json!("2024-05-01 10:00:00 UTC")).unwrap(), expected);
        assert_eq!(parse(json!("2024-05-01 10:00:00")).unwrap(), expected);
    }

    #[test]
    fn parses_offsetless_iso_timestamps() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        assert_eq!(parse(json!("2024-05-01T10:00:00")).unwrap(), expected);

        let millis = parse(json!("2024-05-01T10:00:00.123")).unwrap();
        assert_eq!(millis, expected + chrono::Duration::milliseconds(123));

        let half = parse(json!("2024-05-01 10:00:00.5 UTC")).unwrap();
        assert_eq!(half, expected + chrono::Duration::milliseconds(500));

        let offset = parse(json!("2024-05-01 12:00:00.25 +0200")).unwrap();
        assert_eq!(offset, expected + chrono::Duration::milliseconds(250));
    }

    #[test]
    fn malformed_timestamp_names_the_field() {
        let err = parse(json!("yesterday at noon")).unwrap_err();
        assert!(matches!(
            err,
            RelayError::MalformedTimestamp { ref path, ref value }
                if path == "created_at" && value == "yesterday at noon"
        ));
    }

    #[test]
    fn null_timestamp_is_missing() {
        let err = parse(Value::Null).unwrap_err();
        assert!(matches!(err, RelayError::MissingField { ref path } if path == "created_at"));
    }

    #[test]
    fn first_line_of_message() {
        assert_eq!(first_line("Fix bug\n\nLonger description"), "Fix bug");
        assert_eq!(first_line(""), "");
    }
}
