//! TimeRange: the user-selected inclusive window of calendar dates.

use chrono::NaiveDate;
use serde::Serialize;

use super::inputs::InputError;
use crate::data::calendar::CalendarDays;

/// Inclusive `[start, end]` window. `start <= end` holds by construction.
///
/// The `end <= today` half of the invariant depends on the clock, so it is
/// checked where inputs are validated, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TimeRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl TimeRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, InputError> {
        if start > end {
            return Err(InputError::StartAfterEnd { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of calendar days in the window, both endpoints included.
    pub fn calendar_days(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }

    /// The expanded calendar for this window.
    pub fn calendar(&self) -> CalendarDays {
        CalendarDays::between(self.start, self.end)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}
