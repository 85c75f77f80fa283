//! cbrfx runner: ingestion orchestration, run configuration, charts.
//!
//! This crate builds on `cbrfx-core` to provide:
//! - `IngestConfig`: immutable run configuration (TOML + defaults)
//! - `Ingestor`: the resumable, paced fetch → extract → commit loop
//! - `render_rate_chart`: SVG rendering of the persisted series

pub mod chart;
pub mod config;
pub mod ingest;

pub use chart::{render_rate_chart, ChartError, ChartOutcome};
pub use config::{ConfigError, IngestConfig};
pub use ingest::{
    IngestError, IngestProgress, IngestState, Ingestor, RunStats, RunSummary, TracingProgress,
    PROGRESS_EVERY,
};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn run_types_are_send_sync() {
        assert_send::<IngestConfig>();
        assert_sync::<IngestConfig>();
        assert_send::<RunSummary>();
        assert_sync::<RunSummary>();
        assert_send::<IngestError>();
        assert_sync::<IngestError>();
    }
}
