use chrono::{NaiveDate, TimeDelta};
use std::mem::replace;

use crate::error::{BalanceError, Result};

/// A date range iterator that yields each date from the start date
/// through the end date (inclusive).
#[derive(Clone, Eq, PartialEq, Copy, Debug)]
pub struct DateRange(pub NaiveDate, pub NaiveDate);

impl Iterator for DateRange {
    type Item = NaiveDate;
    fn next(&mut self) -> Option<Self::Item> {
        if self.0 <= self.1 {
            let next = self.0 + TimeDelta::days(1);
            Some(replace(&mut self.0, next))
        } else {
            None
        }
    }
}

impl DateRange {
    /// Number of days covered by the range, zero if it is empty.
    pub fn len_days(&self) -> usize {
        let days = (self.1 - self.0).num_days() + 1;
        days.max(0) as usize
    }
}

/// Check that `dates` is a strictly consecutive daily sequence.
///
/// The recurrence assumes exactly one day between rows, so an
/// out-of-order, duplicated or skipped date is a
/// [`BalanceError::Sequence`]. Gaps are reported with the missing span
/// rather than interpolated.
pub fn check_consecutive(dates: &[NaiveDate]) -> Result<()> {
    if dates.is_empty() {
        return Err(BalanceError::Sequence("no observations".to_string()));
    }
    for window in dates.windows(2) {
        let (previous, current) = (window[0], window[1]);
        let step = (current - previous).num_days();
        match step {
            1 => {}
            0 => {
                return Err(BalanceError::Sequence(format!(
                    "duplicate date {}",
                    current
                )))
            }
            s if s < 0 => {
                return Err(BalanceError::Sequence(format!(
                    "{} follows {}; observations must be date-ordered",
                    current, previous
                )))
            }
            _ => {
                let missing = DateRange(
                    previous + TimeDelta::days(1),
                    current - TimeDelta::days(1),
                );
                return Err(BalanceError::Sequence(format!(
                    "{} missing day(s) between {} and {}",
                    missing.len_days(),
                    previous,
                    current
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{check_consecutive, DateRange};
    use crate::error::BalanceError;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 1, d).unwrap()
    }

    #[test]
    fn test_date_range_iteration() {
        let start = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2022, 1, 5).unwrap();
        let range = DateRange(start, end);
        assert_eq!(range.len_days(), 5);
        let dates: Vec<NaiveDate> = range.collect();
        assert_eq!(dates.len(), 5);
        assert_eq!(dates[0], start);
        assert_eq!(dates[4], end);
    }

    #[test]
    fn test_date_range_empty() {
        let range = DateRange(day(15), day(14));
        assert_eq!(range.len_days(), 0);
        assert_eq!(range.count(), 0);
    }

    #[test]
    fn test_consecutive_accepts_daily_sequence() {
        let dates: Vec<NaiveDate> = DateRange(day(1), day(10)).collect();
        assert!(check_consecutive(&dates).is_ok());
        assert!(check_consecutive(&dates[..1]).is_ok());
    }

    #[test]
    fn test_consecutive_rejects_gap() {
        let err = check_consecutive(&[day(1), day(2), day(5)]).unwrap_err();
        match err {
            BalanceError::Sequence(msg) => assert!(msg.starts_with("2 missing day(s)")),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_consecutive_rejects_unordered_and_duplicates() {
        assert!(matches!(
            check_consecutive(&[day(2), day(1)]),
            Err(BalanceError::Sequence(_))
        ));
        assert!(matches!(
            check_consecutive(&[day(1), day(1)]),
            Err(BalanceError::Sequence(_))
        ));
        assert!(matches!(check_consecutive(&[]), Err(BalanceError::Sequence(_))));
    }
}
