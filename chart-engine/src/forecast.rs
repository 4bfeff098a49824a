//! FILENAME: chart-engine/src/forecast.rs
//! PURPOSE: Trend-line forecasts for line charts.
//! CONTEXT: Runs after aggregation and top-N. The predictions are written into
//! the payload's analytics block; the chart rows are not touched.
//!
//! Two models:
//! - Linear: least-squares line over (row index, value), extended past the
//!   last row.
//! - Smoothing: additive Holt-Winters with fixed constants, chosen in the
//!   analytics panel and used when at least four points exist.

use crate::definition::{ChartKind, ChartPayload, ForecastModel, Prediction};
use engine::stats::{linear_regression, mean};
use engine::Record;

/// Upper bound on the forecast horizon.
pub const MAX_FORECAST_PERIODS: usize = 10_000;

/// Points needed before seasonal smoothing is attempted.
pub const MIN_SMOOTHING_POINTS: usize = 4;

const MAX_SEASON: usize = 12;
const ALPHA: f64 = 0.5;
const BETA: f64 = 0.4;
const GAMMA: f64 = 0.6;

// ============================================================================
// MODELS
// ============================================================================

/// Values of the fitted line at indices `n..n + periods`.
pub fn linear_forecast(history: &[f64], periods: usize) -> Vec<f64> {
    let points: Vec<(f64, f64)> = history.iter().enumerate().map(|(i, y)| (i as f64, *y)).collect();
    let Some((slope, intercept)) = linear_regression(&points) else {
        return Vec::new();
    };
    let n = history.len();
    (n..n + periods).map(|x| intercept + slope * x as f64).collect()
}

/// Additive Holt-Winters with season length `min(12, n / 2)`.
///
/// Initial state: level is the mean of the first season, trend the mean
/// per-step change between the first two seasons, and each seasonal index
/// the first season's deviation from the initial level. Returns `None` below
/// four points.
pub fn holt_winters_forecast(history: &[f64], periods: usize) -> Option<Vec<f64>> {
    let n = history.len();
    if n < MIN_SMOOTHING_POINTS {
        return None;
    }
    let season = (n / 2).min(MAX_SEASON);

    let first = &history[..season];
    let second = &history[season..2 * season];
    let mut level = mean(first)?;
    let mut trend = (mean(second)? - level) / season as f64;
    let mut seasonal: Vec<f64> = first.iter().map(|y| y - level).collect();

    for (t, y) in history.iter().enumerate() {
        let s = t % season;
        let previous_level = level;
        level = ALPHA * (y - seasonal[s]) + (1.0 - ALPHA) * (level + trend);
        trend = BETA * (level - previous_level) + (1.0 - BETA) * trend;
        seasonal[s] = GAMMA * (y - level) + (1.0 - GAMMA) * seasonal[s];
    }

    let forecast = (1..=periods)
        .map(|h| level + h as f64 * trend + seasonal[(n + h - 1) % season])
        .collect();
    Some(forecast)
}

// ============================================================================
// PAYLOAD
// ============================================================================

/// Adds `forecastData` and an empty `forecastConfidence` to the analytics
/// block of a line chart that asks for a trend line.
pub fn apply_forecast(rows: &[Record], payload: &mut ChartPayload) {
    if payload.chart_type != ChartKind::Line || rows.len() < 2 {
        return;
    }
    let Some(measure) = payload.y_axes.first().cloned() else {
        return;
    };
    let Some(analytics) = payload.analytics.as_mut() else {
        return;
    };
    if !analytics.show_trend_line || analytics.forecast_periods == 0 {
        return;
    }

    let periods = usize::try_from(analytics.forecast_periods)
        .unwrap_or(MAX_FORECAST_PERIODS)
        .min(MAX_FORECAST_PERIODS);
    let history: Vec<f64> = rows
        .iter()
        .map(|r| r.value(&measure).as_number().unwrap_or(0.0))
        .collect();

    let model = analytics.forecast_model();
    let predictions = match model {
        ForecastModel::Smoothing => holt_winters_forecast(&history, periods),
        ForecastModel::Linear => None,
    }
    .unwrap_or_else(|| linear_forecast(&history, periods));

    log::debug!(
        target: "FORECAST",
        "{:?} forecast of '{}': {} points from {} rows",
        model,
        measure,
        predictions.len(),
        history.len()
    );

    analytics.forecast_data = Some(
        predictions
            .into_iter()
            .map(Prediction::new)
            .collect(),
    );
    analytics.forecast_confidence = Some(Vec::new());
}
