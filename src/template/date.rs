//! Date formatting with the `DD MM YYYY HH mm ss` token set.

use chrono::{DateTime, Datelike, TimeZone, Timelike};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static DATE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new("DD|MM|YYYY|HH|mm|ss").expect("valid date token pattern"));

/// Replace each date token in `format`, leaving every other character alone.
/// All numeric fields are zero-padded to two digits; the year is four digits.
pub fn format_date<Tz: TimeZone>(format: &str, now: &DateTime<Tz>) -> String {
    DATE_TOKEN
        .replace_all(format, |caps: &Captures<'_>| match &caps[0] {
            "DD" => format!("{:02}", now.day()),
            "MM" => format!("{:02}", now.month()),
            "YYYY" => format!("{:04}", now.year()),
            "HH" => format!("{:02}", now.hour()),
            "mm" => format!("{:02}", now.minute()),
            "ss" => format!("{:02}", now.second()),
            other => other.to_string(),
        })
        .into_owned()
}

/// `HH:MM:SS` in 24-hour time
pub fn format_time<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    now.format("%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 9, 7, 3).unwrap()
    }

    #[test]
    fn iso_style_format() {
        assert_eq!(format_date("YYYY-MM-DD", &sample()), "2024-03-05");
    }

    #[test]
    fn time_tokens_are_padded() {
        assert_eq!(format_date("HH:mm:ss", &sample()), "09:07:03");
        assert_eq!(format_time(&sample()), "09:07:03");
    }

    #[test]
    fn other_characters_pass_through() {
        assert_eq!(format_date("Day DD of MM!", &sample()), "Day 05 of 03!");
        assert_eq!(format_date("", &sample()), "");
        assert_eq!(format_date("YY", &sample()), "YY");
    }
}
