//! In-memory checkpoint, for tests.

use super::{check_order, cursor_after, Checkpoint, StoreError};
use crate::domain::RateRecord;
use chrono::NaiveDate;

#[derive(Debug, Clone, Default)]
pub struct MemoryLog {
    records: Vec<RateRecord>,
    initialized: bool,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing records (assumed ascending).
    pub fn with_records(records: Vec<RateRecord>) -> Self {
        Self {
            records,
            initialized: false,
        }
    }

    pub fn records(&self) -> &[RateRecord] {
        &self.records
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

impl Checkpoint for MemoryLog {
    fn ensure_initialized(&mut self) -> Result<(), StoreError> {
        self.initialized = true;
        Ok(())
    }

    fn read(&self) -> Result<Option<NaiveDate>, StoreError> {
        Ok(cursor_after(self.records.last().map(|r| r.date)))
    }

    fn commit(&mut self, record: &RateRecord) -> Result<(), StoreError> {
        check_order(self.records.last().map(|r| r.date), record)?;
        self.records.push(*record);
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<RateRecord>, StoreError> {
        Ok(self.records.clone())
    }

    fn location(&self) -> String {
        "<memory>".to_string()
    }
}
