//! Property tests for rate log invariants.
//!
//! Uses proptest to verify:
//! 1. Round-trip: a committed record reloads with the same date and a rate within 1e-6
//! 2. Ordering: records come back in strictly increasing date order
//! 3. Resume: the cursor is always the day after the last committed record
//! 4. Day ranges: inclusive, ascending, gap-free

use cbrfx_core::domain::{DayRange, RateRecord};
use cbrfx_core::store::{Checkpoint, CsvRateLog};
use chrono::NaiveDate;
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (0i64..3650).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2015, 1, 1).unwrap() + chrono::Duration::days(offset)
    })
}

fn arb_rate() -> impl Strategy<Value = f64> {
    0.0001..10_000.0_f64
}

/// Ascending, de-duplicated day offsets with rates.
fn arb_series() -> impl Strategy<Value = Vec<(i64, f64)>> {
    prop::collection::btree_map(0i64..400, arb_rate(), 1..40)
        .prop_map(|m| m.into_iter().collect())
}

fn base() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
}

// ── 1. Round-trip ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn committed_record_reloads_within_precision(date in arb_date(), rate in arb_rate()) {
        let dir = tempfile::tempdir().unwrap();
        let mut log = CsvRateLog::new(dir.path().join("rates.csv"));
        log.ensure_initialized().unwrap();
        log.commit(&RateRecord::new(date, rate)).unwrap();

        let loaded = log.load_all().unwrap();
        prop_assert_eq!(loaded.len(), 1);
        prop_assert_eq!(loaded[0].date, date);
        prop_assert!((loaded[0].rate - rate).abs() <= 1e-6);
    }
}

// ── 2 + 3. Ordering and resume ───────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn records_stay_sorted_and_cursor_follows_last(series in arb_series()) {
        let dir = tempfile::tempdir().unwrap();
        let mut log = CsvRateLog::new(dir.path().join("rates.csv"));
        log.ensure_initialized().unwrap();

        for (offset, rate) in &series {
            let day = base() + chrono::Duration::days(*offset);
            log.commit(&RateRecord::new(day, *rate)).unwrap();
        }

        let loaded = log.load_all().unwrap();
        prop_assert_eq!(loaded.len(), series.len());
        for pair in loaded.windows(2) {
            prop_assert!(pair[0].date < pair[1].date);
        }

        let last = base() + chrono::Duration::days(series.last().unwrap().0);
        prop_assert_eq!(log.read().unwrap(), last.succ_opt());
    }
}

// ── 4. Day ranges ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn day_range_is_inclusive_and_gap_free(start in arb_date(), len in 0i64..120) {
        let end = start + chrono::Duration::days(len);
        let days: Vec<_> = DayRange::new(start, end).collect();

        prop_assert_eq!(days.len() as i64, len + 1);
        prop_assert_eq!(days.first().copied(), Some(start));
        prop_assert_eq!(days.last().copied(), Some(end));
        for pair in days.windows(2) {
            prop_assert_eq!(pair[0].succ_opt(), Some(pair[1]));
        }
    }
}
