//! Lenient date parsing for board cells.
//!
//! Board date columns are free text. Each cell is tried against a fixed,
//! ordered list of layouts; the first layout that parses wins. A cell that
//! matches nothing yields `None`, never a placeholder date.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Full timestamp layouts, tried after RFC 3339.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Calendar date layouts. Month-first slash dates are tried before
/// day-first ones, so `03/04/2024` reads as March 4th.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

/// Parse a board cell into a timestamp.
pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    parse_month(s)
}

/// Month-granular values ("2024-01", "Jan 2024", "January 2024") land on
/// the first of the month.
fn parse_month(s: &str) -> Option<NaiveDateTime> {
    NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("1 {}", s), "%d %b %Y"))
        .or_else(|_| NaiveDate::parse_from_str(&format!("1 {}", s), "%d %B %Y"))
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_iso_and_rfc3339() {
        assert_eq!(parse_date("2024-01-15"), Some(ymd(2024, 1, 15)));
        assert_eq!(
            parse_date("2024-01-15T10:30:00Z"),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap().and_hms_opt(10, 30, 0)
        );
        assert_eq!(
            parse_date(" 2024-01-15 08:05 "),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap().and_hms_opt(8, 5, 0)
        );
    }

    #[test]
    fn test_slash_dates_prefer_month_first() {
        assert_eq!(parse_date("03/04/2024"), Some(ymd(2024, 3, 4)));
        // Day 25 cannot be a month, so the day-first layout applies.
        assert_eq!(parse_date("25/04/2024"), Some(ymd(2024, 4, 25)));
    }

    #[test]
    fn test_named_months() {
        assert_eq!(parse_date("15 Jan 2024"), Some(ymd(2024, 1, 15)));
        assert_eq!(parse_date("Jan 15, 2024"), Some(ymd(2024, 1, 15)));
        assert_eq!(parse_date("March 2024"), Some(ymd(2024, 3, 1)));
        assert_eq!(parse_date("January 2024"), Some(ymd(2024, 1, 1)));
        assert_eq!(parse_date("Mar 2024"), Some(ymd(2024, 3, 1)));
        assert_eq!(parse_date("15 January 2024"), Some(ymd(2024, 1, 15)));
        assert_eq!(parse_date("September 3, 2024"), Some(ymd(2024, 9, 3)));
        assert_eq!(parse_date("2024-07"), Some(ymd(2024, 7, 1)));
    }

    #[test]
    fn test_unparseable_is_none() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("   "), None);
        assert_eq!(parse_date("TBD"), None);
        assert_eq!(parse_date("Not Provided"), None);
        assert_eq!(parse_date("2024-13-45"), None);
        assert_eq!(parse_date("2024-01-01 - 2024-02-01"), None);
    }
}
