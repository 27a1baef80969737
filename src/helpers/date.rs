//! Date helper functions

use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Format a timestamp the way en-US `toLocaleString` does
///
/// # Examples
/// ```ignore
/// locale_datetime(&date, chrono_tz::UTC) // -> "1/15/2024, 3:04:05 PM"
/// ```
pub fn locale_datetime(date: &DateTime<Utc>, tz: Tz) -> String {
    tz.from_utc_datetime(&date.naive_utc())
        .format("%-m/%-d/%Y, %-I:%M:%S %p")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_datetime_utc() {
        let date: DateTime<Utc> = "2024-01-15T15:04:05Z".parse().unwrap();
        assert_eq!(locale_datetime(&date, chrono_tz::UTC), "1/15/2024, 3:04:05 PM");
    }

    #[test]
    fn test_locale_datetime_zone() {
        let date: DateTime<Utc> = "2024-07-01T00:30:00Z".parse().unwrap();
        assert_eq!(
            locale_datetime(&date, chrono_tz::America::New_York),
            "6/30/2024, 8:30:00 PM"
        );
    }
}
