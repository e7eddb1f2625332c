//! Calendar bucketing helpers.
//!
//! All comparisons work on (year, month, day) fields of dates that were
//! converted once, with a single fixed offset, from stored UTC timestamps.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Offset, Utc};

use crate::domain::SalesWindow;

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Builds the offset used for calendar fields. Out-of-range values fall back to UTC.
pub fn offset_from_minutes(minutes: i32) -> FixedOffset {
    FixedOffset::east_opt(minutes.saturating_mul(60)).unwrap_or_else(|| Utc.fix())
}

pub fn to_calendar_date(timestamp: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    timestamp.with_timezone(&offset).date_naive()
}

pub fn same_day(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month() && a.day() == b.day()
}

pub fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}

/// Same month and day one year earlier; Feb 29 maps to Feb 28.
pub fn one_year_before(date: NaiveDate) -> NaiveDate {
    let year = date.year() - 1;
    NaiveDate::from_ymd_opt(year, date.month(), date.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, date.month(), days_in_month(year, date.month())))
        .unwrap_or(date)
}

/// Short English label for a 1-based month.
pub fn month_label(month: u32) -> &'static str {
    MONTH_LABELS
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("?")
}

pub fn in_window(date: NaiveDate, window: SalesWindow) -> bool {
    match window {
        SalesWindow::Today(reference) | SalesWindow::Day(reference) => same_day(date, reference),
        SalesWindow::ThisMonth(reference) => same_month(date, reference),
        SalesWindow::AllTime => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn days_in_month_handles_leap_years() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2024, 12), 31);
        assert_eq!(days_in_month(2024, 4), 30);
    }

    #[test]
    fn one_year_before_clamps_leap_day() {
        assert_eq!(one_year_before(date(2024, 2, 29)), date(2023, 2, 28));
        assert_eq!(one_year_before(date(2024, 7, 15)), date(2023, 7, 15));
    }

    #[test]
    fn month_window_compares_fields_not_durations() {
        let reference = date(2024, 1, 31);
        assert!(in_window(date(2024, 1, 5), SalesWindow::ThisMonth(reference)));
        assert!(!in_window(date(2024, 2, 5), SalesWindow::ThisMonth(reference)));
        assert!(!in_window(date(2023, 1, 5), SalesWindow::ThisMonth(reference)));
        // One day apart, different months.
        assert!(!in_window(date(2024, 2, 1), SalesWindow::ThisMonth(reference)));
    }

    #[test]
    fn calendar_date_follows_offset() {
        let late = Utc.with_ymd_and_hms(2024, 3, 10, 23, 30, 0).unwrap();
        assert_eq!(to_calendar_date(late, offset_from_minutes(0)), date(2024, 3, 10));
        assert_eq!(to_calendar_date(late, offset_from_minutes(60)), date(2024, 3, 11));
        assert_eq!(to_calendar_date(late, offset_from_minutes(-300)), date(2024, 3, 10));
    }

    #[test]
    fn out_of_range_offset_falls_back_to_utc() {
        assert_eq!(offset_from_minutes(100_000).local_minus_utc(), 0);
    }

    #[test]
    fn month_labels_are_one_based() {
        assert_eq!(month_label(1), "Jan");
        assert_eq!(month_label(12), "Dec");
        assert_eq!(month_label(13), "?");
    }
}
