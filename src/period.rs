//! Garden periods and period keys
//!
//! A period key names one concrete day, ISO week, month or year:
//! `2024-03-01`, `2024-W09`, `2024-03`, `2024`.

use chrono::{Datelike, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Time span covered by a garden
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Period {
    Day,
    Week,
    Month,
    Year,
}

impl Period {
    /// GraphQL enum value
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Day => "DAY",
            Period::Week => "WEEK",
            Period::Month => "MONTH",
            Period::Year => "YEAR",
        }
    }

    /// Period key for the period containing `date`
    pub fn key_for(&self, date: NaiveDate) -> String {
        period_key_for(*self, date)
    }

    /// Period key for the current UTC date
    pub fn current_key(&self) -> String {
        self.key_for(Utc::now().date_naive())
    }

    /// Check that `key` has the shape this period expects
    pub fn validate_key(&self, key: &str) -> Result<(), PeriodError> {
        let valid = match self {
            Period::Day => NaiveDate::parse_from_str(key, "%Y-%m-%d").is_ok() && key.len() == 10,
            Period::Week => key_number(r"^\d{4}-W(\d{2})$", key)
                .map(|w| (1..=53).contains(&w))
                .unwrap_or(false),
            Period::Month => key_number(r"^\d{4}-(\d{2})$", key)
                .map(|m| (1..=12).contains(&m))
                .unwrap_or(false),
            Period::Year => key_number(r"^(\d{4})$", key).is_some(),
        };

        if valid {
            Ok(())
        } else {
            Err(PeriodError::InvalidKey {
                period: *self,
                key: key.to_string(),
            })
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Period {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DAY" => Ok(Period::Day),
            "WEEK" => Ok(Period::Week),
            "MONTH" => Ok(Period::Month),
            "YEAR" => Ok(Period::Year),
            _ => Err(PeriodError::UnknownPeriod(s.to_string())),
        }
    }
}

/// Period parsing errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PeriodError {
    #[error("Unknown period: {0} (expected day, week, month or year)")]
    UnknownPeriod(String),

    #[error("Invalid {period} key: {key}")]
    InvalidKey { period: Period, key: String },
}

/// Number captured by `pattern`, if the whole key matches it
fn key_number(pattern: &str, key: &str) -> Option<u32> {
    let re = Regex::new(pattern).ok()?;
    re.captures(key)?.get(1)?.as_str().parse().ok()
}

/// Build the period key for `date`
///
/// Weeks use ISO-8601 numbering, so the year part is the ISO week-year and
/// can differ from the calendar year around new year.
pub fn period_key_for(period: Period, date: NaiveDate) -> String {
    match period {
        Period::Day => date.format("%Y-%m-%d").to_string(),
        Period::Month => date.format("%Y-%m").to_string(),
        Period::Year => date.format("%Y").to_string(),
        Period::Week => {
            let week = date.iso_week();
            format!("{}-W{:02}", week.year(), week.week())
        }
    }
}

/// Today's day key (UTC)
pub fn today_key() -> String {
    period_key_for(Period::Day, Utc::now().date_naive())
}

/// Human readable day key, e.g. "Friday 1st of March 2024"
///
/// Keys that are not `YYYY-MM-DD` dates come back unchanged.
pub fn format_day_key(day_key: &str) -> String {
    let date = match NaiveDate::parse_from_str(day_key, "%Y-%m-%d") {
        Ok(d) => d,
        Err(_) => return day_key.to_string(),
    };

    let day = date.day();
    let suffix = match (day % 10, day) {
        (1, d) if d != 11 => "st",
        (2, d) if d != 12 => "nd",
        (3, d) if d != 13 => "rd",
        _ => "th",
    };

    format!(
        "{} {}{} of {} {}",
        date.format("%A"),
        day,
        suffix,
        date.format("%B"),
        date.year()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_period_keys() {
        let d = date(2024, 3, 1);
        assert_eq!(period_key_for(Period::Day, d), "2024-03-01");
        assert_eq!(period_key_for(Period::Month, d), "2024-03");
        assert_eq!(period_key_for(Period::Year, d), "2024");
        assert_eq!(period_key_for(Period::Week, d), "2024-W09");
    }

    #[test]
    fn test_week_key_uses_iso_year() {
        // 2021-01-03 is a Sunday belonging to the last ISO week of 2020
        assert_eq!(period_key_for(Period::Week, date(2021, 1, 3)), "2020-W53");
        // 2024-12-30 is a Monday in week 1 of 2025
        assert_eq!(period_key_for(Period::Week, date(2024, 12, 30)), "2025-W01");
    }

    #[test]
    fn test_parse_period() {
        assert_eq!("day".parse::<Period>().unwrap(), Period::Day);
        assert_eq!("WEEK".parse::<Period>().unwrap(), Period::Week);
        assert!("fortnight".parse::<Period>().is_err());
    }

    #[test]
    fn test_validate_key() {
        assert!(Period::Day.validate_key("2024-02-29").is_ok());
        assert!(Period::Day.validate_key("2023-02-29").is_err());
        assert!(Period::Week.validate_key("2024-W09").is_ok());
        assert!(Period::Week.validate_key("2024-W54").is_err());
        assert!(Period::Month.validate_key("2024-12").is_ok());
        assert!(Period::Month.validate_key("2024-13").is_err());
        assert!(Period::Year.validate_key("2024").is_ok());
        assert!(Period::Year.validate_key("24").is_err());
    }

    #[test]
    fn test_format_day_key() {
        assert_eq!(format_day_key("2024-03-01"), "Friday 1st of March 2024");
        assert_eq!(format_day_key("2024-03-11"), "Monday 11th of March 2024");
        assert_eq!(format_day_key("2024-03-22"), "Friday 22nd of March 2024");
        assert_eq!(format_day_key("2024-03-13"), "Wednesday 13th of March 2024");
        assert_eq!(format_day_key("not-a-date"), "not-a-date");
    }

    #[test]
    fn test_serde_uppercase() {
        assert_eq!(serde_json::to_string(&Period::Month).unwrap(), "\"MONTH\"");
        let p: Period = serde_json::from_str("\"YEAR\"").unwrap();
        assert_eq!(p, Period::Year);
    }
}
