//! Per-unit rate extraction from a daily payload.

use super::provider::RatePayload;

/// Derive the per-unit rate for `code`.
///
/// `Value / Nominal`, with `Nominal` defaulting to 1. A zero nominal yields
/// the raw value. Returns `None` when the payload has no entry for `code`.
pub fn extract_rate(payload: &RatePayload, code: &str) -> Option<f64> {
    let quote = payload.valute.as_ref()?.get(code)?;
    match quote.nominal.unwrap_or(1) {
        0 => Some(quote.value),
        nominal => Some(quote.value / nominal as f64),
    }
}
