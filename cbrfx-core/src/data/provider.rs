//! Rate source trait, payload types and structured fetch errors.
//!
//! The RateSource trait abstracts over where a day's payload comes from (the
//! CBR daily archive over HTTP, or a scripted source in tests) so the
//! ingestion driver never depends on the network directly.

use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

/// One instrument entry of a daily payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Quote {
    #[serde(rename = "Value")]
    pub value: f64,
    #[serde(rename = "Nominal", default)]
    pub nominal: Option<i64>,
}

/// A daily archive payload: instrument code → quote.
///
/// Every other field the archive publishes (`Date`, `PreviousURL`, ...) is
/// ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RatePayload {
    #[serde(rename = "Valute", default)]
    pub valute: Option<HashMap<String, Quote>>,
}

impl RatePayload {
    pub fn from_json(body: &str) -> Result<Self, FetchError> {
        serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))
    }
}

/// Structured error types for fetch operations.
///
/// "Not found" is deliberately absent: a day without a published payload is
/// `Ok(None)`, not an error.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transient failure after {attempts} attempt(s): {reason}")]
    Transient { attempts: u32, reason: String },

    #[error("fatal HTTP status {status} for {url}")]
    Fatal { status: u16, url: String },

    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("http client error: {0}")]
    Client(String),
}

impl FetchError {
    /// Whether the driver may skip the day and carry on.
    ///
    /// Only `Fatal` and `Client` stop a run.
    pub fn is_skippable(&self) -> bool {
        matches!(self, FetchError::Transient { .. } | FetchError::Malformed(_))
    }
}

/// Source of daily rate payloads.
pub trait RateSource {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Fetch the payload published for `day`.
    ///
    /// Returns `Ok(None)` when nothing was published (weekend, holiday).
    fn fetch(&self, day: NaiveDate) -> Result<Option<RatePayload>, FetchError>;
}

impl<R: RateSource + ?Sized> RateSource for &R {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch(&self, day: NaiveDate) -> Result<Option<RatePayload>, FetchError> {
        (**self).fetch(day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_archive_payload_ignoring_extra_fields() {
        let body = r#"{
            "Date": "2020-01-10T11:30:00+03:00",
            "PreviousURL": "//www.cbr-xml-daily.ru/archive/2020/01/09/daily_json.js",
            "Valute": {
                "USD": {"ID": "R01235", "CharCode": "USD", "Nominal": 1, "Value": 61.2632, "Previous": 61.9057},
                "KZT": {"ID": "R01335", "CharCode": "KZT", "Nominal": 100, "Value": 16.0586, "Previous": 16.2045}
            }
        }"#;
        let payload = RatePayload::from_json(body).unwrap();
        let valute = payload.valute.unwrap();
        assert_eq!(valute["USD"].nominal, Some(1));
        assert_eq!(valute["KZT"].nominal, Some(100));
        assert!((valute["KZT"].value - 16.0586).abs() < 1e-12);
    }

    #[test]
    fn payload_without_valute_is_valid() {
        let payload = RatePayload::from_json(r#"{"Date": "2020-01-01"}"#).unwrap();
        assert!(payload.valute.is_none());
    }

    #[test]
    fn garbage_body_is_malformed() {
        let err = RatePayload::from_json("<html>oops</html>").unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
        assert!(err.is_skippable());
    }

    #[test]
    fn fatal_is_not_skippable() {
        let err = FetchError::Fatal {
            status: 400,
            url: "http://x".into(),
        };
        assert!(!err.is_skippable());
        assert_eq!(err.to_string(), "fatal HTTP status 400 for http://x");
    }
}
