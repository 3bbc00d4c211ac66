//! Date-range and staff allow-list filtering, applied to each record stream
//! independently and always before aggregation.

use crate::schema::{DateRange, HoursEntry, MatterEntry, RevenueEntry, TimeEntry};
use chrono::NaiveDate;

/// A record that can be placed on the calendar and attributed to one staff
/// member.
pub trait StaffRecord {
    fn record_date(&self) -> Option<NaiveDate>;
    fn staff_id(&self) -> Option<&str>;
}

impl StaffRecord for RevenueEntry {
    fn record_date(&self) -> Option<NaiveDate> {
        self.date
    }

    fn staff_id(&self) -> Option<&str> {
        self.staff.as_deref()
    }
}

impl StaffRecord for HoursEntry {
    fn record_date(&self) -> Option<NaiveDate> {
        self.date
    }

    fn staff_id(&self) -> Option<&str> {
        self.staff_abbreviation.as_deref()
    }
}

impl StaffRecord for TimeEntry {
    fn record_date(&self) -> Option<NaiveDate> {
        self.date
    }

    fn staff_id(&self) -> Option<&str> {
        self.staff.as_deref()
    }
}

pub fn is_allowed(staff: Option<&str>, allow_list: &[String]) -> bool {
    staff.is_some_and(|s| allow_list.iter().any(|a| a == s))
}

/// Keeps records dated inside `range` whose staff is a listed member.
pub fn filter_by_range_and_staff<'a, T: StaffRecord>(
    records: &'a [T],
    range: &DateRange,
    allow_list: &[String],
) -> Vec<&'a T> {
    records
        .iter()
        .filter(|r| range.contains(r.record_date()))
        .filter(|r| is_allowed(r.staff_id(), allow_list))
        .collect()
}

/// Keeps records dated inside `range` belonging to exactly `staff`.
pub fn filter_by_range_and_single_staff<'a, T: StaffRecord>(
    records: &'a [T],
    range: &DateRange,
    staff: &str,
) -> Vec<&'a T> {
    records
        .iter()
        .filter(|r| range.contains(r.record_date()))
        .filter(|r| r.staff_id() == Some(staff))
        .collect()
}

/// Matters are filtered on date only. Their staff slots are checked one by
/// one during accumulation, since a single matter may credit several staff.
pub fn filter_matters_by_range<'a>(
    matters: &'a [MatterEntry],
    range: &DateRange,
) -> Vec<&'a MatterEntry> {
    matters
        .iter()
        .filter(|m| range.contains(m.creation_date))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hours(date: Option<(i32, u32, u32)>, staff: Option<&str>, amount: f64) -> HoursEntry {
        HoursEntry {
            date: date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            staff_abbreviation: staff.map(str::to_string),
            hours_amount: amount,
        }
    }

    fn range() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        )
    }

    #[test]
    fn test_filters_date_and_staff() {
        let records = vec![
            hours(Some((2024, 3, 1)), Some("AB"), 1.0),
            hours(Some((2024, 3, 31)), Some("CD"), 2.0),
            hours(Some((2024, 4, 1)), Some("AB"), 3.0),
            hours(Some((2024, 3, 15)), Some("ZZ"), 4.0),
            hours(Some((2024, 3, 15)), None, 5.0),
            hours(None, Some("AB"), 6.0),
        ];
        let allow = vec!["AB".to_string(), "CD".to_string()];

        let kept = filter_by_range_and_staff(&records, &range(), &allow);
        let amounts: Vec<f64> = kept.iter().map(|h| h.hours_amount).collect();
        assert_eq!(amounts, vec![1.0, 2.0]);
    }

    #[test]
    fn test_reversed_range_keeps_nothing() {
        let records = vec![hours(Some((2024, 3, 15)), Some("AB"), 1.0)];
        let r = range();
        let reversed = DateRange::new(r.end, r.start);
        let allow = vec!["AB".to_string()];
        assert!(filter_by_range_and_staff(&records, &reversed, &allow).is_empty());
    }

    #[test]
    fn test_single_staff_filter() {
        let records = vec![
            hours(Some((2024, 3, 2)), Some("AB"), 1.0),
            hours(Some((2024, 3, 2)), Some("CD"), 2.0),
        ];
        let kept = filter_by_range_and_single_staff(&records, &range(), "CD");
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].hours_amount, 2.0);
    }
}
