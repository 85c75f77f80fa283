//! Inclusive calendar-day iteration.

use chrono::NaiveDate;

/// Iterator over every calendar day in `[start, end]`, ascending.
///
/// Yields nothing when `start > end`.
#[derive(Debug, Clone)]
pub struct DayRange {
    next: Option<NaiveDate>,
    end: NaiveDate,
}

impl DayRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            next: (start <= end).then_some(start),
            end,
        }
    }
}

impl Iterator for DayRange {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let current = self.next?;
        self.next = current.succ_opt().filter(|d| *d <= self.end);
        Some(current)
    }
}
