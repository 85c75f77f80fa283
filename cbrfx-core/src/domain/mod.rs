//! Domain types for the rate archive.

pub mod day;
pub mod record;

pub use day::DayRange;
pub use record::{RateRecord, RATE_PRECISION};
