//! cbrfx core: archive client, rate extraction, checkpointed rate log.
//!
//! This crate contains the pieces of the ingestion pipeline that touch the
//! outside world:
//! - Domain types (rate records, inclusive day ranges)
//! - CBR daily archive client with explicit retry policy
//! - Per-unit rate extraction from a daily payload
//! - Checkpoint trait and the CSV rate log behind it

pub mod data;
pub mod domain;
pub mod store;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: the types handed across the runner boundary are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::RateRecord>();
        require_sync::<domain::RateRecord>();
        require_send::<data::RatePayload>();
        require_sync::<data::RatePayload>();
        require_send::<data::FetchError>();
        require_sync::<data::FetchError>();
        require_send::<data::RetryPolicy>();
        require_sync::<data::RetryPolicy>();
        require_send::<store::StoreError>();
        require_sync::<store::StoreError>();
        require_send::<store::CsvRateLog>();
        require_sync::<store::CsvRateLog>();
        require_send::<data::CbrClient>();
        require_sync::<data::CbrClient>();
    }
}
