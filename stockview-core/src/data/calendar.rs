//! Calendar expansion: an inclusive date range → every calendar day in it.
//!
//! Weekends and holidays are included; deciding which days traded is the
//! aligner's job, driven by the price mapping.

use chrono::NaiveDate;
use std::iter::FusedIterator;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    #[error("invalid range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

/// Expand `[start, end]` into consecutive calendar days.
pub fn expand(start: NaiveDate, end: NaiveDate) -> Result<CalendarDays, CalendarError> {
    if start > end {
        return Err(CalendarError::InvalidRange { start, end });
    }
    Ok(CalendarDays::between(start, end))
}

/// Lazy, finite iterator over calendar days.
///
/// Cloning yields an independent iterator positioned where the original was,
/// so a fresh clone of an unconsumed sequence restarts it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarDays {
    next: Option<NaiveDate>,
    end: NaiveDate,
}

impl CalendarDays {
    /// Caller guarantees `start <= end`.
    pub(crate) fn between(start: NaiveDate, end: NaiveDate) -> Self {
        debug_assert!(start <= end);
        Self {
            next: Some(start),
            end,
        }
    }
}

impl Iterator for CalendarDays {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let current = self.next?;
        self.next = if current < self.end {
            current.succ_opt()
        } else {
            None
        };
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = match self.next {
            Some(d) => (self.end - d).num_days() as usize + 1,
            None => 0,
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for CalendarDays {}
impl FusedIterator for CalendarDays {}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn inclusive_of_both_endpoints() {
        let days: Vec<_> = expand(d("2024-01-02"), d("2024-01-05")).unwrap().collect();
        assert_eq!(
            days,
            vec![d("2024-01-02"), d("2024-01-03"), d("2024-01-04"), d("2024-01-05")]
        );
    }

    #[test]
    fn includes_weekends() {
        // Fri..Mon
        let days = expand(d("2024-01-05"), d("2024-01-08")).unwrap();
        assert_eq!(days.len(), 4);
    }

    #[test]
    fn crosses_month_and_leap_day() {
        let days: Vec<_> = expand(d("2024-02-28"), d("2024-03-01")).unwrap().collect();
        assert_eq!(days, vec![d("2024-02-28"), d("2024-02-29"), d("2024-03-01")]);
    }

    #[test]
    fn start_after_end_fails() {
        let err = expand(d("2024-01-05"), d("2024-01-02")).unwrap_err();
        assert_eq!(
            err,
            CalendarError::InvalidRange {
                start: d("2024-01-05"),
                end: d("2024-01-02")
            }
        );
    }

    #[test]
    fn clone_restarts_sequence() {
        let days = expand(d("2024-01-01"), d("2024-01-10")).unwrap();
        let first: Vec<_> = days.clone().collect();
        let second: Vec<_> = days.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn size_hint_tracks_consumption() {
        let mut days = expand(d("2024-01-01"), d("2024-01-03")).unwrap();
        assert_eq!(days.len(), 3);
        days.next();
        assert_eq!(days.len(), 2);
        days.next();
        days.next();
        assert_eq!(days.len(), 0);
        assert_eq!(days.next(), None);
        assert_eq!(days.next(), None);
    }

    #[test]
    fn ends_at_max_date_without_overflow() {
        let end = NaiveDate::MAX;
        let start = end.pred_opt().unwrap();
        assert_eq!(expand(start, end).unwrap().count(), 2);
    }
}
