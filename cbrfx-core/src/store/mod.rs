//! Checkpointed rate storage.
//!
//! The store is both the run's output and its resume point: the next day to
//! fetch is derived from the last committed record. The `Checkpoint` trait
//! keeps the driver independent of the backing store.

pub mod csv_log;
pub mod memory;

pub use csv_log::CsvRateLog;
pub use memory::MemoryLog;

use crate::domain::RateRecord;
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("rate log I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("rate log CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("record for {date} is not after the last committed date {last}")]
    OutOfOrder { date: NaiveDate, last: NaiveDate },
}

/// Append-only record log with a derived resume cursor.
pub trait Checkpoint {
    /// Prepare the backing store. Idempotent.
    fn ensure_initialized(&mut self) -> Result<(), StoreError>;

    /// Next day to fetch: last committed date + 1, or `None` for an empty log.
    fn read(&self) -> Result<Option<NaiveDate>, StoreError>;

    /// Durably append one record.
    ///
    /// Rejects records not strictly after the last committed date.
    fn commit(&mut self, record: &RateRecord) -> Result<(), StoreError>;

    /// Every well-formed record, in commit order.
    fn load_all(&self) -> Result<Vec<RateRecord>, StoreError>;

    /// Where the records live, for summaries.
    fn location(&self) -> String;
}

/// Resume cursor for a log whose last record is dated `last`.
pub(crate) fn cursor_after(last: Option<NaiveDate>) -> Option<NaiveDate> {
    last.and_then(|d| d.succ_opt())
}

pub(crate) fn check_order(last: Option<NaiveDate>, record: &RateRecord) -> Result<(), StoreError> {
    match last {
        Some(last) if record.date <= last => Err(StoreError::OutOfOrder {
            date: record.date,
            last,
        }),
        _ => Ok(()),
    }
}
