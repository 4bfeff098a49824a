//! FILENAME: chart-engine/src/engine.rs
//! Chart Engine - Turns records and a shelf configuration into chart data.
//!
//! This module takes a ChartRequest (records + configuration) and produces a
//! ChartResponse (shape-specific data + the resolved payload).
//!
//! Algorithm:
//! 1. Resolve the payload (axes, filters, analytics) from the configuration
//! 2. Derive drilled date columns, then apply shelf and dashboard filters
//! 3. Resolve the chart plan; missing fields give the empty shape
//! 4. Build the shape: aggregated rows for series charts, a dedicated
//!    builder for every other kind
//! 5. Series charts: top-N, then the trend-line forecast for line charts

use crate::definition::{ChartPayload, ChartRequest};
use crate::forecast::apply_forecast;
use crate::pipeline::{apply_top_n, prepare_records, run_aggregation};
use crate::pivot::build_pivot;
use crate::plan::ChartPlan;
use crate::shapes::{build_boxplot, build_gantt, build_sankey, build_word_cloud};
use crate::view::{ChartData, ChartResponse};

pub fn process_chart(request: ChartRequest) -> ChartResponse {
    let ChartRequest {
        records,
        config,
        measures,
        dashboard_filters,
    } = request;

    let records = match records {
        Some(records) if !records.is_empty() => records,
        _ => {
            log::debug!(target: "CHART", "no records for view '{}'", config.id);
            return ChartResponse::empty();
        }
    };

    let mut payload = ChartPayload::from_config(&config);
    let dashboard_filters = dashboard_filters.map(|f| f.into_vec()).unwrap_or_default();
    let prepared = prepare_records(&records, &config, &dashboard_filters);
    log::debug!(
        target: "CHART",
        "view '{}' ({}): {} of {} records after filters",
        config.id,
        config.active_chart_type,
        prepared.len(),
        records.len()
    );

    let chart_data = match ChartPlan::resolve(&config, &payload) {
        ChartPlan::Cartesian(spec) => {
            let rows = run_aggregation(prepared, &spec, &measures);
            let rows = apply_top_n(rows, &payload.filters);
            apply_forecast(&rows, &mut payload);
            ChartData::Rows(rows)
        }
        ChartPlan::Heatmap(spec) | ChartPlan::Map(spec) => {
            let rows = run_aggregation(prepared, &spec, &measures);
            ChartData::Rows(apply_top_n(rows, &payload.filters))
        }
        ChartPlan::Scatter => ChartData::Rows(apply_top_n(prepared, &payload.filters)),
        ChartPlan::Pivot(spec) => ChartData::Pivot(build_pivot(&prepared, &spec)),
        ChartPlan::WordCloud { text_field } => {
            ChartData::WordCloud(build_word_cloud(&prepared, &text_field))
        }
        ChartPlan::Gantt(spec) => ChartData::Gantt(build_gantt(&prepared, &spec)),
        ChartPlan::Sankey(spec) => ChartData::Sankey(build_sankey(&prepared, &spec)),
        ChartPlan::BoxPlot(spec) => ChartData::BoxPlot(build_boxplot(&prepared, &spec)),
        ChartPlan::Unavailable(kind) => ChartData::empty_for(&kind),
    };

    ChartResponse {
        chart_data,
        payload: Some(payload),
    }
}
