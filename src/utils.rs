use crate::error::{KpiError, Result};
use crate::schema::DateRange;
use chrono::{Datelike, Days, NaiveDate, NaiveDateTime};

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Canonical "YYYY-MM" bucket. Lexicographic order is chronological order.
pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Display label for a month bucket, e.g. "Mar 2024".
pub fn month_label(date: NaiveDate) -> String {
    date.format("%b %Y").to_string()
}

/// Converts a "YYYY-MM" key back into the first day of that month.
pub fn month_key_to_date(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", key.trim()), "%Y-%m-%d").ok()
}

pub fn label_for_month_key(key: &str) -> String {
    month_key_to_date(key)
        .map(month_label)
        .unwrap_or_else(|| key.to_string())
}

/// Most recent Monday on or before `date`. A Monday maps to itself and a
/// Sunday rolls back six days.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = date.weekday().num_days_from_monday() as u64;
    date.checked_sub_days(Days::new(offset)).unwrap_or(date)
}

/// Canonical "YYYY-MM-DD" key of the Monday starting the ISO week of `date`.
pub fn week_key(date: NaiveDate) -> String {
    week_start(date).format("%Y-%m-%d").to_string()
}

/// The `n` week keys ending with the week containing `anchor`, oldest first.
pub fn last_n_weeks(n: usize, anchor: NaiveDate) -> Vec<String> {
    let anchor_monday = week_start(anchor);
    (0..n)
        .map(|i| {
            let back = 7 * (n - 1 - i) as u64;
            let monday = anchor_monday
                .checked_sub_days(Days::new(back))
                .unwrap_or(NaiveDate::MIN);
            week_key(monday)
        })
        .collect()
}

/// Inclusive on both bounds. A reversed range contains nothing.
pub fn in_range(date: NaiveDate, range: &DateRange) -> bool {
    range.start <= date && date <= range.end
}

/// Parses the date formats found in the exported record files. Time of day,
/// when present, is dropped.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(date);
        }
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }

    None
}

pub fn parse_required_date(raw: &str) -> Result<NaiveDate> {
    parse_date(raw).ok_or_else(|| {
        KpiError::DateError(format!(
            "Invalid date '{}'. Expected YYYY-MM-DD or MM/DD/YYYY",
            raw
        ))
    })
}

/// Abbreviated names of the twelve calendar months, "Jan" through "Dec".
pub fn month_abbreviations() -> Vec<String> {
    (1..=12)
        .filter_map(|m| NaiveDate::from_ymd_opt(2000, m, 1))
        .map(|d| d.format("%b").to_string())
        .collect()
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_month_key() {
        assert_eq!(month_key(d(2024, 3, 15)), "2024-03");
        assert_eq!(month_key(d(2023, 12, 31)), "2023-12");
        assert!(month_key(d(2023, 12, 31)) < month_key(d(2024, 1, 1)));
    }

    #[test]
    fn test_week_key_rolls_back_to_monday() {
        // 2024-03-11 is a Monday
        assert_eq!(week_key(d(2024, 3, 11)), "2024-03-11");
        assert_eq!(week_key(d(2024, 3, 13)), "2024-03-11");
        // Sunday belongs to the week that started six days earlier
        assert_eq!(week_key(d(2024, 3, 17)), "2024-03-11");
        assert_eq!(week_key(d(2024, 3, 18)), "2024-03-18");
        // across a year boundary
        assert_eq!(week_key(d(2025, 1, 1)), "2024-12-30");
    }

    #[test]
    fn test_week_key_idempotent() {
        for day in 11..=17 {
            let key = week_key(d(2024, 3, day));
            let as_date = parse_date(&key).unwrap();
            assert_eq!(week_key(as_date), key);
        }
    }

    #[test]
    fn test_last_n_weeks() {
        let weeks = last_n_weeks(3, d(2024, 3, 17));
        assert_eq!(weeks, vec!["2024-02-26", "2024-03-04", "2024-03-11"]);
        assert!(last_n_weeks(0, d(2024, 3, 17)).is_empty());
    }

    #[test]
    fn test_in_range_inclusive() {
        let range = DateRange::new(d(2024, 1, 1), d(2024, 1, 31));
        assert!(in_range(d(2024, 1, 1), &range));
        assert!(in_range(d(2024, 1, 31), &range));
        assert!(!in_range(d(2024, 2, 1), &range));

        let reversed = DateRange::new(d(2024, 1, 31), d(2024, 1, 1));
        assert!(!in_range(d(2024, 1, 15), &reversed));
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2024-03-15"), Some(d(2024, 3, 15)));
        assert_eq!(parse_date("2024-03-15 13:45:00"), Some(d(2024, 3, 15)));
        assert_eq!(parse_date("2024-03-15T08:00:00"), Some(d(2024, 3, 15)));
        assert_eq!(parse_date("03/15/2024"), Some(d(2024, 3, 15)));
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("not a date"), None);
        assert!(parse_required_date("2024-13-01").is_err());
    }

    #[test]
    fn test_month_labels() {
        assert_eq!(label_for_month_key("2024-03"), "Mar 2024");
        let months = month_abbreviations();
        assert_eq!(months.len(), 12);
        assert_eq!(months[0], "Jan");
        assert_eq!(months[11], "Dec");
    }
}
