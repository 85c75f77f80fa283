//! Retry policy for the archive client.
//!
//! Exponential backoff: retry `n` (1-based) waits `backoff_factor * 2^(n-1)`,
//! capped at `backoff_max`. A server-provided `Retry-After` replaces the
//! computed delay when `respect_retry_after` is set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Explicit retry/backoff configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts = `max_retries + 1`.
    pub max_retries: u32,
    pub backoff_factor_ms: u64,
    pub backoff_max_secs: u64,
    /// HTTP statuses that are retried.
    pub retry_statuses: Vec<u16>,
    pub respect_retry_after: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff_factor_ms: 500,
            backoff_max_secs: 120,
            retry_statuses: vec![429, 500, 502, 503, 504],
            respect_retry_after: true,
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retry_statuses.contains(&status)
    }

    fn backoff_max(&self) -> Duration {
        Duration::from_secs(self.backoff_max_secs)
    }

    /// Computed backoff before retry number `retry` (1-based).
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        let factor = Duration::from_millis(self.backoff_factor_ms);
        let exp = (retry - 1).min(31);
        factor
            .checked_mul(1u32 << exp)
            .unwrap_or(Duration::MAX)
            .min(self.backoff_max())
    }

    /// Delay before retry number `retry`, honoring a `Retry-After` header value.
    pub fn delay_for(&self, retry: u32, retry_after: Option<&str>, now: DateTime<Utc>) -> Duration {
        if self.respect_retry_after {
            if let Some(server) = retry_after.and_then(|v| parse_retry_after(v, now)) {
                return server.min(self.backoff_max());
            }
        }
        self.backoff_delay(retry)
    }
}

/// Parse a `Retry-After` value: delta-seconds or an HTTP date.
///
/// Dates in the past yield zero.
pub fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let at = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    Some((at - now).to_std().unwrap_or(Duration::ZERO))
}
