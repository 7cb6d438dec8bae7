// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Lunch dates.
//!
//! A lunch is dated in the configured time zone, not in UTC: a tick shortly
//! after midnight UTC may still belong to the previous day locally.

use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;
use time::{Date, Month, format_description::BorrowedFormatItem, macros::format_description};

use crate::error::DomainError;

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Parses an IANA time zone name.
///
/// # Errors
///
/// Returns [`DomainError::InvalidTimezone`] for unknown names.
pub fn parse_timezone(name: &str) -> Result<Tz, DomainError> {
    name.parse::<Tz>()
        .map_err(|_| DomainError::InvalidTimezone(name.to_string()))
}

/// Returns the calendar date of `now` in `tz`.
///
/// # Errors
///
/// Returns an error if the local date cannot be represented.
pub fn local_date(tz: Tz, now: DateTime<Utc>) -> Result<Date, DomainError> {
    let local = now.with_timezone(&tz).date_naive();

    let month: Month = u8::try_from(local.month())
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .ok_or_else(|| DomainError::DateConversion {
            reason: format!("month {} out of range", local.month()),
        })?;
    let day: u8 = u8::try_from(local.day()).map_err(|_| DomainError::DateConversion {
        reason: format!("day {} out of range", local.day()),
    })?;

    Date::from_calendar_date(local.year(), month, day).map_err(|e| DomainError::DateConversion {
        reason: e.to_string(),
    })
}

/// Formats a date as `YYYY-MM-DD`.
///
/// # Errors
///
/// Returns an error if the date cannot be formatted.
pub fn format_date(date: Date) -> Result<String, DomainError> {
    date.format(DATE_FORMAT)
        .map_err(|e| DomainError::DateConversion {
            reason: e.to_string(),
        })
}

/// Parses a `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns an error if the text is not a valid date.
pub fn parse_date(text: &str) -> Result<Date, DomainError> {
    Date::parse(text, DATE_FORMAT).map_err(|e| DomainError::DateConversion {
        reason: format!("'{text}': {e}"),
    })
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use time::macros::date;

    #[test]
    fn test_local_date_follows_timezone_not_utc() {
        let now: DateTime<Utc> = Utc.with_ymd_and_hms(2026, 3, 2, 22, 30, 0).unwrap();
        let moscow: Tz = parse_timezone("Europe/Moscow").unwrap();
        let new_york: Tz = parse_timezone("America/New_York").unwrap();

        assert_eq!(local_date(moscow, now).unwrap(), date!(2026 - 03 - 03));
        assert_eq!(local_date(new_york, now).unwrap(), date!(2026 - 03 - 02));
    }

    #[test]
    fn test_parse_timezone_rejects_unknown_name() {
        let result: Result<Tz, DomainError> = parse_timezone("Mars/Olympus_Mons");
        assert!(matches!(result, Err(DomainError::InvalidTimezone(_))));
    }

    #[test]
    fn test_date_text_round_trip() {
        let text: String = format_date(date!(2026 - 01 - 09)).unwrap();
        assert_eq!(text, "2026-01-09");
        assert_eq!(parse_date(&text).unwrap(), date!(2026 - 01 - 09));
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert!(matches!(
            parse_date("09/01/2026"),
            Err(DomainError::DateConversion { .. })
        ));
    }
}
