//! GitLab webhook timestamp format: `2020-02-15 15:23:28 UTC`

use chrono::{DateTime, Duration, NaiveDateTime, Utc};

/// Date and time part of the wire format; the zone abbreviation follows
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Shape of the date and time part, `0` standing for any ASCII digit
const LAYOUT: &[u8; 19] = b"0000-00-00 00:00:00";

/// Parse a webhook timestamp.
///
/// The date and time must match `YYYY-MM-DD HH:MM:SS` exactly, followed by a
/// single space and a zone abbreviation: three uppercase letters, four ending
/// in `T` (or `WITA`, `ChST`, `MeST`), five ending in `T`, `UTC`, or `GMT`
/// with an optional whole-hour offset such as `GMT+2`. Only the `GMT` form
/// carries an offset; every other abbreviation is read as UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, TimestampError> {
    if value.is_empty() {
        return Err(TimestampError::Empty);
    }

    let (datetime, zone) = split_zone(value)?;
    let offset_hours =
        zone_offset_hours(zone).ok_or_else(|| TimestampError::InvalidZone(zone.to_string()))?;

    let naive = NaiveDateTime::parse_from_str(datetime, TIME_FORMAT).map_err(|source| {
        TimestampError::Malformed {
            value: value.to_string(),
            source,
        }
    })?;

    let utc = naive
        .checked_sub_signed(Duration::hours(offset_hours))
        .map(|naive| naive.and_utc())
        .filter(|time| time.timestamp_nanos_opt().is_some())
        .ok_or_else(|| TimestampError::OutOfRange(value.to_string()))?;

    Ok(utc)
}

fn split_zone(value: &str) -> Result<(&str, &str), TimestampError> {
    let bytes = value.as_bytes();
    let date_matches = bytes.len() >= LAYOUT.len()
        && LAYOUT.iter().zip(bytes).all(|(&expected, &actual)| match expected {
            b'0' => actual.is_ascii_digit(),
            separator => actual == separator,
        });
    if !date_matches {
        return Err(TimestampError::Layout(value.to_string()));
    }

    // The first bytes are ASCII from here on, so slicing stays on char boundaries
    match bytes.get(LAYOUT.len()) {
        None => Err(TimestampError::MissingZone(value.to_string())),
        Some(b' ') if bytes.len() > LAYOUT.len() + 1 => {
            Ok((&value[..LAYOUT.len()], &value[LAYOUT.len() + 1..]))
        }
        Some(b' ') => Err(TimestampError::MissingZone(value.to_string())),
        Some(_) => Err(TimestampError::Layout(value.to_string())),
    }
}

/// Offset in hours east of UTC for an accepted zone, `None` if the zone is rejected
fn zone_offset_hours(zone: &str) -> Option<i64> {
    match zone {
        "UTC" | "GMT" | "ChST" | "MeST" | "WITA" => return Some(0),
        _ => {}
    }

    if let Some(offset) = zone.strip_prefix("GMT") {
        return gmt_offset_hours(offset);
    }

    let bytes = zone.as_bytes();
    if !bytes.iter().all(u8::is_ascii_uppercase) {
        return None;
    }
    match bytes.len() {
        3 => Some(0),
        4 if bytes[3] == b'T' => Some(0),
        5 if bytes[4] == b'T' => Some(0),
        _ => None,
    }
}

/// `+H`, `-H`, `+HH` or `-HH` with the hour at most 23
fn gmt_offset_hours(offset: &str) -> Option<i64> {
    let (sign, digits) = match offset.as_bytes().first()? {
        b'+' => (1, &offset[1..]),
        b'-' => (-1, &offset[1..]),
        _ => return None,
    };
    if digits.is_empty() || digits.len() > 2 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: i64 = digits.parse().ok()?;
    (hours <= 23).then_some(sign * hours)
}

#[derive(Debug, thiserror::Error)]
pub enum TimestampError {
    #[error("Empty timestamp")]
    Empty,

    #[error("Timestamp '{0}' does not match YYYY-MM-DD HH:MM:SS ZONE")]
    Layout(String),

    #[error("Timestamp '{0}' has no time zone")]
    MissingZone(String),

    #[error("Invalid time zone '{0}'")]
    InvalidZone(String),

    #[error("Malformed timestamp '{value}': {source}")]
    Malformed {
        value: String,
        source: chrono::ParseError,
    },

    #[error("Timestamp '{0}' is outside the representable span range")]
    OutOfRange(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_utc() {
        let parsed = parse_timestamp("2020-02-15 15:23:28 UTC").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2020, 2, 15, 15, 23, 28).unwrap());
    }

    #[test]
    fn test_other_abbreviation_has_zero_offset() {
        let expected = Utc.with_ymd_and_hms(2020, 2, 15, 15, 23, 28).unwrap();
        for zone in ["CET", "GMT", "CEST", "ChST", "WITA", "NZDST"] {
            let parsed = parse_timestamp(&format!("2020-02-15 15:23:28 {}", zone)).unwrap();
            assert_eq!(parsed, expected, "zone {}", zone);
        }
    }

    #[test]
    fn test_gmt_hour_offset() {
        let parsed = parse_timestamp("2020-02-15 15:23:28 GMT+2").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2020, 2, 15, 13, 23, 28).unwrap());

        let parsed = parse_timestamp("2020-02-15 15:23:28 GMT-11").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2020, 2, 16, 2, 23, 28).unwrap());

        assert!(matches!(
            parse_timestamp("2020-02-15 15:23:28 GMT+24"),
            Err(TimestampError::InvalidZone(_))
        ));
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(parse_timestamp(""), Err(TimestampError::Empty)));
        assert!(matches!(
            parse_timestamp("2020-02-15T15:23:28Z"),
            Err(TimestampError::Layout(_))
        ));
        assert!(matches!(
            parse_timestamp("2020-02-15 15:23:28"),
            Err(TimestampError::MissingZone(_))
        ));
        assert!(matches!(
            parse_timestamp("2020-02-15 15:23:28 +0100"),
            Err(TimestampError::InvalidZone(_))
        ));
        assert!(matches!(
            parse_timestamp("2020-02-30 15:23:28 UTC"),
            Err(TimestampError::Malformed { .. })
        ));
        assert!(matches!(
            parse_timestamp("yesterday at noon UTC"),
            Err(TimestampError::Layout(_))
        ));
    }

    #[test]
    fn test_rejects_loose_layouts() {
        for value in [
            "2020-02-1515:23:28 UTC",
            "2020-2-5 1:2:3 UTC",
            "  2020-02-15 15:23:28 UTC",
            "2020-02-15  15:23:28 UTC",
        ] {
            assert!(
                matches!(parse_timestamp(value), Err(TimestampError::Layout(_))),
                "accepted {:?}",
                value
            );
        }
    }

    #[test]
    fn test_rejects_non_abbreviation_zones() {
        for value in [
            "2020-02-15 15:23:28 utc",
            "2020-02-15 15:23:28 ABCD",
            "2020-02-15 15:23:28 UTC  ",
            "2020-02-15 15:23:28  UTC",
            "2020-02-15 15:23:28 UT",
            "2020-02-15 15:23:28 ABCDEF",
            "2020-02-15 15:23:28 ABCDE",
            "2020-02-15 15:23:28 UTCX",
        ] {
            assert!(
                matches!(parse_timestamp(value), Err(TimestampError::InvalidZone(_))),
                "accepted {:?}",
                value
            );
        }
    }

    #[test]
    fn test_rejects_instant_beyond_nanosecond_range() {
        assert!(matches!(
            parse_timestamp("9999-12-31 23:59:59 UTC"),
            Err(TimestampError::OutOfRange(_))
        ));
        assert!(matches!(
            parse_timestamp("1600-01-01 00:00:00 UTC"),
            Err(TimestampError::OutOfRange(_))
        ));
    }
}
