//! SVG line chart of a persisted rate series.
//!
//! Rendering goes through Plotters' SVG backend so no system fonts or
//! native image libraries are needed.

use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate};
use plotters::prelude::*;
use thiserror::Error;

use cbrfx_core::domain::RateRecord;

const SIZE: (u32, u32) = (1200, 600);

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("chart I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("chart rendering failed: {0}")]
    Render(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartOutcome {
    Written(PathBuf),
    /// The series was empty; nothing was drawn.
    NoData,
}

/// Render `records` (ascending by date) as `{CODE}/RUB` into an SVG at `path`.
pub fn render_rate_chart(records: &[RateRecord], code: &str, path: &Path) -> Result<ChartOutcome, ChartError> {
    if records.is_empty() {
        return Ok(ChartOutcome::NoData);
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    draw(records, code, path).map_err(|e| ChartError::Render(e.to_string()))?;
    tracing::info!(path = %path.display(), points = records.len(), "chart written");
    Ok(ChartOutcome::Written(path.to_path_buf()))
}

/// Date span padded by a day on each side so a single point still has width.
fn x_bounds(records: &[RateRecord]) -> (NaiveDate, NaiveDate) {
    let first = records.iter().map(|r| r.date).min().unwrap_or_default();
    let last = records.iter().map(|r| r.date).max().unwrap_or_default();
    (first - Duration::days(1), last + Duration::days(1))
}

/// Rate span with 5% headroom; a flat series gets ±1% around its value.
fn y_bounds(records: &[RateRecord]) -> (f64, f64) {
    let lo = records.iter().map(|r| r.rate).fold(f64::INFINITY, f64::min);
    let hi = records.iter().map(|r| r.rate).fold(f64::NEG_INFINITY, f64::max);
    let span = hi - lo;
    if span <= f64::EPSILON * hi.abs().max(1.0) {
        let pad = (lo.abs() * 0.01).max(0.01);
        (lo - pad, hi + pad)
    } else {
        (lo - span * 0.05, hi + span * 0.05)
    }
}

fn draw(records: &[RateRecord], code: &str, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let (x0, x1) = x_bounds(records);
    let (y0, y1) = y_bounds(records);
    let label = format!("{code}/RUB");

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("{label} exchange rate, CBR"), ("sans-serif", 24))
        .margin(12)
        .set_label_area_size(LabelAreaPosition::Left, 70)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    chart
        .configure_mesh()
        .x_desc("Date")
        .y_desc("Rate, RUB")
        .x_labels(10)
        .y_labels(8)
        .x_label_formatter(&|d: &NaiveDate| d.format("%Y-%m-%d").to_string())
        .y_label_formatter(&|v: &f64| format!("{v:.2}"))
        .draw()?;

    let line_color = RGBColor(31, 119, 180);
    chart
        .draw_series(LineSeries::new(
            records.iter().map(|r| (r.date, r.rate)),
            line_color.stroke_width(1),
        ))?
        .label(label)
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], line_color));

    chart.draw_series(
        records
            .iter()
            .map(|r| Circle::new((r.date, r.rate), 2, line_color.filled())),
    )?;

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}
