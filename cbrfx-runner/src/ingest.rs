//! Ingestion driver: resumable, paced, day-by-day fetch into the rate log.
//!
//! States: `Idle → Resuming → Iterating → Done`.
//!
//! Per day: fetch → extract → commit → pace. Days without a payload or
//! without the instrument are counted as missing; days that fail
//! transiently are skipped (and will be retried by a later run, since no
//! record exists for them). Only a fatal transport error or a store failure
//! ends the run early.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;

use cbrfx_core::data::{extract_rate, FetchError, RateSource, Sleeper};
use cbrfx_core::domain::{DayRange, RateRecord};
use cbrfx_core::store::{Checkpoint, StoreError};

use crate::config::IngestConfig;

/// A progress notice is emitted every this many saved records.
pub const PROGRESS_EVERY: usize = 50;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("fatal fetch error on {day}: {source}")]
    Fatal { day: NaiveDate, source: FetchError },
}

/// Driver lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestState {
    Idle,
    Resuming,
    Iterating { cursor: NaiveDate },
    Done,
}

/// Per-run counters. Reset each run, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub saved: usize,
    pub missing: usize,
    /// Days dropped after retries were exhausted or the body was undecodable.
    pub skipped: Vec<NaiveDate>,
}

/// Outcome of a completed (or cancelled) run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub stats: RunStats,
    /// First day this run iterated from.
    pub start: NaiveDate,
    /// Whether `start` came from an existing log rather than the config.
    pub resumed: bool,
    pub end: NaiveDate,
    pub output: String,
    pub cancelled: bool,
}

/// Observer for ingestion progress.
pub trait IngestProgress {
    /// Called once the resume point is known.
    fn on_resume(&self, start: NaiveDate, end: NaiveDate, resumed: bool);

    /// Called every `PROGRESS_EVERY` saved records.
    fn on_progress(&self, stats: &RunStats);

    /// Called when a day is dropped because of a skippable fetch error.
    fn on_skip(&self, day: NaiveDate, error: &FetchError);

    /// Called when the run is over.
    fn on_complete(&self, summary: &RunSummary);
}

/// Progress reporter that logs through `tracing`.
pub struct TracingProgress;

impl IngestProgress for TracingProgress {
    fn on_resume(&self, start: NaiveDate, end: NaiveDate, resumed: bool) {
        if resumed {
            tracing::info!(%start, %end, "resuming from existing log");
        } else {
            tracing::info!(%start, %end, "starting fresh");
        }
    }

    fn on_progress(&self, stats: &RunStats) {
        tracing::info!(saved = stats.saved, missing = stats.missing, "progress");
    }

    fn on_skip(&self, day: NaiveDate, error: &FetchError) {
        tracing::warn!(%day, "network: {error}");
    }

    fn on_complete(&self, summary: &RunSummary) {
        tracing::info!(
            saved = summary.stats.saved,
            missing = summary.stats.missing,
            skipped = summary.stats.skipped.len(),
            output = %summary.output,
            cancelled = summary.cancelled,
            "ingestion finished"
        );
    }
}

/// Drives one ingestion run over a rate source, a checkpoint store and a pacing clock.
pub struct Ingestor<R, C, S> {
    config: IngestConfig,
    source: R,
    store: C,
    sleeper: S,
    state: IngestState,
    cancel: Option<Arc<AtomicBool>>,
}

impl<R: RateSource, C: Checkpoint, S: Sleeper> Ingestor<R, C, S> {
    pub fn new(config: IngestConfig, source: R, store: C, sleeper: S) -> Self {
        Self {
            config,
            source,
            store,
            sleeper,
            state: IngestState::Idle,
            cancel: None,
        }
    }

    /// Stop at the next day boundary once `flag` is set.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn state(&self) -> IngestState {
        self.state
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    pub fn store(&self) -> &C {
        &self.store
    }

    /// Run with `TracingProgress`.
    pub fn run(&mut self) -> Result<RunSummary, IngestError> {
        self.run_with(&TracingProgress)
    }

    pub fn run_with(&mut self, progress: &dyn IngestProgress) -> Result<RunSummary, IngestError> {
        // Idle → Resuming
        self.state = IngestState::Resuming;
        self.store.ensure_initialized()?;
        let cursor = self.store.read()?;
        let resumed = cursor.is_some();
        let start = cursor.unwrap_or(self.config.start_date);
        let end = self.config.end_date;
        tracing::debug!(source = self.source.name(), currency = %self.config.currency, "ingestion source");
        progress.on_resume(start, end, resumed);

        let mut stats = RunStats::default();
        let mut cancelled = false;
        let delay = self.config.pacing_delay();

        // Resuming → Iterating
        for day in DayRange::new(start, end) {
            if self.is_cancelled() {
                cancelled = true;
                break;
            }
            self.state = IngestState::Iterating { cursor: day };

            if self.step(day, &mut stats, progress)? {
                stats.saved += 1;
                if stats.saved % PROGRESS_EVERY == 0 {
                    progress.on_progress(&stats);
                }
            }

            self.sleeper.sleep(delay);
        }

        // Iterating → Done
        self.state = IngestState::Done;
        let summary = RunSummary {
            stats,
            start,
            resumed,
            end,
            output: self.store.location(),
            cancelled,
        };
        progress.on_complete(&summary);
        Ok(summary)
    }

    /// Process a single day. Returns whether a record was committed.
    fn step(
        &mut self,
        day: NaiveDate,
        stats: &mut RunStats,
        progress: &dyn IngestProgress,
    ) -> Result<bool, IngestError> {
        let payload = match self.source.fetch(day) {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                tracing::debug!(%day, "no payload published");
                stats.missing += 1;
                return Ok(false);
            }
            Err(e) if e.is_skippable() => {
                progress.on_skip(day, &e);
                stats.skipped.push(day);
                return Ok(false);
            }
            Err(source) => return Err(IngestError::Fatal { day, source }),
        };

        let Some(rate) = extract_rate(&payload, &self.config.currency) else {
            tracing::debug!(%day, currency = %self.config.currency, "instrument not in payload");
            stats.missing += 1;
            return Ok(false);
        };

        self.store.commit(&RateRecord::new(day, rate))?;
        Ok(true)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }
}
