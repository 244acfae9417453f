//! Month-end calendar helpers.
//!
//! All tables are aligned on the last calendar day of each month.

use crate::error::{DataError, Result};
use chrono::{Datelike, NaiveDate};

/// Last day of the given year and month.
pub fn month_end_of(year: i32, month: u32) -> Result<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .filter(|_| (1..=12).contains(&month))
        .ok_or_else(|| DataError::Parse(format!("invalid year/month {year}-{month:02}")))
}

/// Roll a date forward to the end of its month.
pub fn month_end(date: NaiveDate) -> Result<NaiveDate> {
    month_end_of(date.year(), date.month())
}

/// Last day of the month preceding `date`'s month.
pub fn previous_month_end(date: NaiveDate) -> Result<NaiveDate> {
    date.with_day(1)
        .and_then(|first| first.pred_opt())
        .ok_or_else(|| DataError::Parse(format!("no month precedes {date}")))
}

/// Whether the date is the last day of its month.
pub fn is_month_end(date: NaiveDate) -> bool {
    date.succ_opt().is_none_or(|next| next.month() != date.month())
}

/// Consecutive month number, used to measure distances in months.
pub fn month_index(date: NaiveDate) -> i64 {
    i64::from(date.year()) * 12 + i64::from(date.month0())
}

/// Month-end date for a consecutive month number.
pub fn month_end_from_index(index: i64) -> Result<NaiveDate> {
    let year = i32::try_from(index.div_euclid(12))
        .map_err(|_| DataError::Parse(format!("month index {index} out of range")))?;
    let month0 = u32::try_from(index.rem_euclid(12))
        .map_err(|_| DataError::Parse(format!("month index {index} out of range")))?;
    month_end_of(year, month0 + 1)
}

/// Parse an ISO `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| DataError::Parse(format!("invalid date '{value}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case(date(2016, 2, 3), date(2016, 2, 29))]
    #[case(date(2017, 2, 28), date(2017, 2, 28))]
    #[case(date(2018, 12, 1), date(2018, 12, 31))]
    fn test_month_end(#[case] input: NaiveDate, #[case] expected: NaiveDate) {
        assert_eq!(month_end(input).unwrap(), expected);
    }

    #[test]
    fn test_previous_month_end() {
        assert_eq!(previous_month_end(date(2017, 10, 1)).unwrap(), date(2017, 9, 30));
        assert_eq!(previous_month_end(date(2017, 10, 31)).unwrap(), date(2017, 9, 30));
        assert_eq!(previous_month_end(date(2018, 1, 15)).unwrap(), date(2017, 12, 31));
    }

    #[test]
    fn test_month_index_round_trip() {
        let d = date(2015, 7, 31);
        assert_eq!(month_end_from_index(month_index(d)).unwrap(), d);
        assert_eq!(month_index(date(2015, 8, 1)) - month_index(d), 1);
    }

    #[test]
    fn test_is_month_end() {
        assert!(is_month_end(date(2020, 2, 29)));
        assert!(!is_month_end(date(2020, 2, 28)));
    }

    #[test]
    fn test_invalid_month() {
        assert!(month_end_of(2020, 13).is_err());
        assert!(parse_date("2020-13-01").is_err());
    }
}
