use chrono::{Datelike, Duration, NaiveDate};

use crate::models::Frequency;

/// Decides whether a recurrence pattern matches a calendar date.
///
/// Pure and total: the result depends only on the inputs, never on a hidden
/// "today". Monthly tasks with a month_day that a short month lacks (31 in
/// April, 29..31 in February) are simply not due that month; there is no
/// rollover or clamping.
pub fn is_due_on(frequency: &Frequency, date: NaiveDate) -> bool {
    match frequency {
        Frequency::Daily => true,
        Frequency::Weekly { weekday } => date.weekday() == *weekday,
        Frequency::Monthly { month_day } => date.day() == *month_day,
    }
}

/// First date in `[start, start + days)` on which the pattern fires, if any.
/// Used to build the "due in the next N days" listings.
pub fn next_due_within(frequency: &Frequency, start: NaiveDate, days: i64) -> Option<NaiveDate> {
    (0..days)
        .map(|offset| start + Duration::days(offset))
        .find(|date| is_due_on(frequency, *date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn daily_is_due_every_day_of_the_year() {
        let mut day = date(2026, 1, 1);
        while day <= date(2026, 12, 31) {
            assert!(is_due_on(&Frequency::Daily, day));
            day += Duration::days(1);
        }
    }

    #[test]
    fn weekly_matches_only_its_weekday_across_a_year() {
        let pattern = Frequency::Weekly {
            weekday: Weekday::Wed,
        };
        let mut day = date(2026, 1, 1);
        let mut hits = 0;
        while day <= date(2026, 12, 31) {
            let due = is_due_on(&pattern, day);
            assert_eq!(due, day.weekday() == Weekday::Wed);
            if due {
                hits += 1;
            }
            day += Duration::days(1);
        }
        assert_eq!(hits, 52); // 2026 starts and ends on a Thursday
    }

    #[test]
    fn monthly_day_31_never_fires_in_short_months() {
        let pattern = Frequency::Monthly { month_day: 31 };
        assert!(is_due_on(&pattern, date(2026, 1, 31)));
        assert!(is_due_on(&pattern, date(2026, 3, 31)));

        let mut day = date(2026, 4, 1);
        while day <= date(2026, 4, 30) {
            assert!(!is_due_on(&pattern, day));
            day += Duration::days(1);
        }
        let mut day = date(2026, 2, 1);
        while day <= date(2026, 2, 28) {
            assert!(!is_due_on(&pattern, day));
            day += Duration::days(1);
        }
    }

    #[test]
    fn monthly_matches_the_same_day_each_month() {
        let pattern = Frequency::Monthly { month_day: 12 };
        for month in 1..=12 {
            assert!(is_due_on(&pattern, date(2026, month, 12)));
            assert!(!is_due_on(&pattern, date(2026, month, 13)));
        }
    }

    #[test]
    fn next_due_within_finds_the_first_matching_date() {
        let pattern = Frequency::Weekly {
            weekday: Weekday::Mon,
        };
        // 2026-08-20 is a Thursday; the next Monday is the 24th.
        let start = date(2026, 8, 20);
        assert_eq!(
            next_due_within(&pattern, start, 7),
            Some(date(2026, 8, 24))
        );
        assert_eq!(next_due_within(&pattern, start, 4), None);

        assert_eq!(
            next_due_within(&Frequency::Daily, start, 7),
            Some(start)
        );
    }

    #[test]
    fn next_due_within_skips_months_without_the_day() {
        let pattern = Frequency::Monthly { month_day: 31 };
        // A 10-day window starting late April only reaches May 9; day 31
        // never appears, so nothing is due.
        assert_eq!(next_due_within(&pattern, date(2026, 4, 30), 10), None);
        assert_eq!(
            next_due_within(&pattern, date(2026, 5, 25), 10),
            Some(date(2026, 5, 31))
        );
    }
}
