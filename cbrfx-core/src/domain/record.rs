//! RateRecord: the persisted unit of the rate log.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Number of fractional digits a rate is written with.
pub const RATE_PRECISION: usize = 6;

/// One day's per-unit exchange rate.
///
/// At most one record exists per date, and records are appended in
/// increasing date order. A record is never rewritten once committed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateRecord {
    pub date: NaiveDate,
    pub rate: f64,
}

impl RateRecord {
    pub fn new(date: NaiveDate, rate: f64) -> Self {
        Self { date, rate }
    }

    /// The rate as it appears in the log: fixed `RATE_PRECISION` digits.
    pub fn formatted_rate(&self) -> String {
        format!("{:.*}", RATE_PRECISION, self.rate)
    }

    /// The date as it appears in the log: ISO `YYYY-MM-DD`.
    pub fn formatted_date(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_rate_with_six_digits() {
        let rec = RateRecord::new(NaiveDate::from_ymd_opt(2020, 1, 9).unwrap(), 61.9057);
        assert_eq!(rec.formatted_rate(), "61.905700");
        assert_eq!(rec.formatted_date(), "2020-01-09");
    }

    #[test]
    fn rounds_excess_precision() {
        let rec = RateRecord::new(NaiveDate::from_ymd_opt(2020, 1, 9).unwrap(), 0.16339912);
        assert_eq!(rec.formatted_rate(), "0.163399");
    }
}
