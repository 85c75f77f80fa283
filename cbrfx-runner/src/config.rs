//! Serializable ingestion configuration.

use cbrfx_core::data::{RetryPolicy, TransportSettings};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything a single ingestion run needs. Read once, immutable for the run.
///
/// Output paths default to `data/dataset_{CODE}.csv` and
/// `data/{CODE}_rub_{year}.svg` when not set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IngestConfig {
    /// Instrument code, e.g. `USD`, `KZT`.
    pub currency: String,

    /// First day to fetch (inclusive).
    pub start_date: NaiveDate,

    /// Last day to fetch (inclusive).
    pub end_date: NaiveDate,

    /// Pacing: requests per second against the archive.
    pub requests_per_sec: f64,

    pub output_csv: Option<PathBuf>,
    pub output_chart: Option<PathBuf>,

    pub source: TransportSettings,
    pub retry: RetryPolicy,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            currency: "USD".to_string(),
            start_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(2020, 12, 31).unwrap_or_default(),
            requests_per_sec: 4.0,
            output_csv: None,
            output_chart: None,
            source: TransportSettings::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl IngestConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Normalize and check the configuration.
    ///
    /// Upper-cases the currency code.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        self.currency = self.currency.trim().to_ascii_uppercase();
        if self.currency.is_empty() {
            return Err(ConfigError::Invalid("currency code is empty".into()));
        }
        if self.start_date > self.end_date {
            return Err(ConfigError::Invalid(format!(
                "start date {} is after end date {}",
                self.start_date, self.end_date
            )));
        }
        if !(self.requests_per_sec.is_finite() && self.requests_per_sec > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "requests_per_sec must be positive, got {}",
                self.requests_per_sec
            )));
        }
        if Duration::try_from_secs_f64(1.0 / self.requests_per_sec).is_err() {
            return Err(ConfigError::Invalid(format!(
                "requests_per_sec {} gives a pacing delay too long to represent",
                self.requests_per_sec
            )));
        }
        for placeholder in ["{y}", "{m}", "{d}"] {
            if !self.source.base_url.contains(placeholder) {
                return Err(ConfigError::Invalid(format!(
                    "source.base_url is missing the {placeholder} placeholder"
                )));
            }
        }
        Ok(self)
    }

    /// Wait between consecutive fetches.
    pub fn pacing_delay(&self) -> Duration {
        Duration::try_from_secs_f64(1.0 / self.requests_per_sec).unwrap_or(Duration::MAX)
    }

    pub fn csv_path(&self) -> PathBuf {
        self.output_csv
            .clone()
            .unwrap_or_else(|| PathBuf::from("data").join(format!("dataset_{}.csv", self.currency)))
    }

    pub fn chart_path(&self) -> PathBuf {
        self.output_chart.clone().unwrap_or_else(|| {
            let (y0, y1) = (self.start_date.year(), self.end_date.year());
            let name = if y0 == y1 {
                format!("{}_rub_{y0}.svg", self.currency)
            } else {
                format!("{}_rub_{y0}_{y1}.svg", self.currency)
            };
            PathBuf::from("data").join(name)
        })
    }
}
