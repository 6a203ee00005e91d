use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone};

const KEY_FORMAT: &str = "%Y-%m-%d";

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum DateKeyError {
    #[error("invalid date key (use YYYY-MM-DD): {0}")]
    Malformed(String),
}

/// Canonical key for a calendar day, e.g. `2024-05-01`.
pub fn encode(date: NaiveDate) -> String {
    date.format(KEY_FORMAT).to_string()
}

/// Keys the calendar day a datetime names in its own timezone.
///
/// `23:30` local on May 1st stays `2024-05-01` even when the UTC instant has
/// already rolled over to May 2nd.
pub fn encode_datetime<Tz: TimeZone>(dt: &DateTime<Tz>) -> String {
    encode(dt.date_naive())
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn decode(key: &str) -> Result<NaiveDate, DateKeyError> {
    let raw = key.trim();
    let date = NaiveDate::parse_from_str(raw, KEY_FORMAT)
        .map_err(|_| DateKeyError::Malformed(raw.to_string()))?;
    // chrono accepts unpadded fields; keys must round-trip exactly
    if encode(date) != raw {
        return Err(DateKeyError::Malformed(raw.to_string()));
    }
    Ok(date)
}

/// Parses a user supplied date: `today`, `tomorrow`, `yesterday` or a key.
pub fn parse_date_arg(input: &str, today: NaiveDate) -> Result<NaiveDate, DateKeyError> {
    match input.trim().to_lowercase().as_str() {
        "today" => Ok(today),
        "tomorrow" => Ok(today + Duration::days(1)),
        "yesterday" => Ok(today - Duration::days(1)),
        _ => decode(input),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveTime, Utc};

    #[test]
    fn encodes_zero_padded() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(encode(date), "2024-05-01");
        assert_eq!(encode(date), encode(date));
    }

    #[test]
    fn datetime_keys_follow_local_day_near_midnight() {
        let west = FixedOffset::west_opt(7 * 3600).unwrap();
        let late = west.with_ymd_and_hms(2024, 5, 1, 23, 30, 0).unwrap();
        assert_eq!(encode_datetime(&late), "2024-05-01");
        // the same instant in UTC is already the next day
        assert_eq!(encode_datetime(&late.with_timezone(&Utc)), "2024-05-02");

        let east = FixedOffset::east_opt(9 * 3600).unwrap();
        let early = east.with_ymd_and_hms(2024, 5, 1, 0, 15, 0).unwrap();
        assert_eq!(encode_datetime(&early), "2024-05-01");
    }

    #[test]
    fn time_of_day_does_not_change_key() {
        let date = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        for (h, m) in [(0, 0), (6, 30), (12, 0), (23, 59)] {
            let naive = date.and_time(NaiveTime::from_hms_opt(h, m, 0).unwrap());
            let dt = offset.from_local_datetime(&naive).unwrap();
            assert_eq!(encode_datetime(&dt), "2023-12-31");
        }
    }

    #[test]
    fn decode_is_strict_inverse() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(decode("2024-02-29"), Ok(date));
        assert!(decode("2024-2-29").is_err());
        assert!(decode("2023-02-29").is_err());
        assert!(decode("tomorrow-ish").is_err());
    }

    #[test]
    fn parses_relative_keywords() {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(parse_date_arg("today", base), Ok(base));
        assert_eq!(
            parse_date_arg("Yesterday", base),
            Ok(NaiveDate::from_ymd_opt(2023, 12, 31).unwrap())
        );
        assert_eq!(
            parse_date_arg("tomorrow", base),
            Ok(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap())
        );
        assert_eq!(
            parse_date_arg("2024-05-01", base),
            Ok(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())
        );
    }
}
