//! Game duration from PGN header tags
//!
//! The elapsed wall-clock time of a game is the distance between
//! `UTCDate`+`StartTime` and `EndDate`+`EndTime`. Dates use dots as
//! separators (`2024.01.01`) and are normalized to dashes before parsing.

use chrono::NaiveDateTime;

use crate::pgn::error::{PgnError, PgnResult};
use crate::pgn::tags::parse_tags;

const TAG_START_DATE: &str = "UTCDate";
const TAG_START_TIME: &str = "StartTime";
const TAG_END_DATE: &str = "EndDate";
const TAG_END_TIME: &str = "EndTime";

const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

/// Elapsed seconds of a game, or 0 when the header does not allow computing it
///
/// Failures are logged and never returned; use [`try_extract`] to see why a
/// value could not be computed.
pub fn extract(pgn: &str) -> i64 {
    match try_extract(pgn) {
        Ok(seconds) => seconds,
        Err(e) => {
            tracing::warn!(error = %e, "Could not extract game duration, using 0");
            0
        }
    }
}

/// Elapsed seconds of a game
pub fn try_extract(pgn: &str) -> PgnResult<i64> {
    let tags = parse_tags(pgn)?;

    let start = parse_instant(
        tags.require(TAG_START_DATE)?,
        tags.require(TAG_START_TIME)?,
    )?;
    let end = parse_instant(tags.require(TAG_END_DATE)?, tags.require(TAG_END_TIME)?)?;

    let seconds = end - start;
    if seconds < 0 {
        return Err(PgnError::NegativeDuration(seconds));
    }

    Ok(seconds)
}

/// Epoch seconds of a `date time` pair, taken as UTC
fn parse_instant(date: &str, time: &str) -> PgnResult<i64> {
    let text = format!("{} {}", date.trim(), time.trim()).replace('.', "-");

    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&text, fmt).ok())
        .map(|dt| dt.and_utc().timestamp())
        .ok_or(PgnError::InvalidTimestamp(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(start_date: &str, start: &str, end_date: &str, end: &str) -> String {
        format!(
            "[Event \"Live Chess\"]\n[UTCDate \"{}\"]\n[StartTime \"{}\"]\n[EndDate \"{}\"]\n[EndTime \"{}\"]\n\n1. e4 e5 *\n",
            start_date, start, end_date, end
        )
    }

    #[test]
    fn test_duration_same_day() {
        let pgn = header("2024.01.01", "10:00:00", "2024.01.01", "10:05:30");
        assert_eq!(try_extract(&pgn), Ok(330));
        assert_eq!(extract(&pgn), 330);
    }

    #[test]
    fn test_duration_across_midnight() {
        let pgn = header("2023.12.31", "23:59:00", "2024.01.01", "00:01:00");
        assert_eq!(extract(&pgn), 120);
    }

    #[test]
    fn test_negative_duration_is_zero() {
        let pgn = header("2024.01.01", "10:05:30", "2024.01.01", "10:00:00");
        assert_eq!(try_extract(&pgn), Err(PgnError::NegativeDuration(-330)));
        assert_eq!(extract(&pgn), 0);
    }

    #[test]
    fn test_missing_tag_is_zero() {
        let pgn = "[UTCDate \"2024.01.01\"]\n[StartTime \"10:00:00\"]\n[EndDate \"2024.01.01\"]";
        assert_eq!(try_extract(pgn), Err(PgnError::MissingTag("EndTime")));
        assert_eq!(extract(pgn), 0);
    }

    #[test]
    fn test_invalid_timestamp_is_zero() {
        let pgn = header("2024.13.45", "10:00:00", "2024.01.01", "10:05:30");
        assert!(matches!(try_extract(&pgn), Err(PgnError::InvalidTimestamp(_))));
        assert_eq!(extract(&pgn), 0);
    }

    #[test]
    fn test_malformed_header_is_zero() {
        assert_eq!(extract("[UTCDate 2024.01.01]"), 0);
        assert_eq!(extract(""), 0);
    }
}
