//! FILENAME: chart-engine/src/lib.rs
//! Chart assembly for the chart data engine.
//!
//! This crate turns filtered records and a shelf configuration into the data
//! shape each visualization expects. It depends on `engine` for the record
//! model, aggregation, filters and statistics.
//!
//! Layers:
//! - `definition`: Serializable configuration (what the chart IS)
//! - `plan`: Per-chart-type field resolution (WHICH fields each shape needs)
//! - `pipeline`: Preparation, grouping and aggregation (HOW rows are computed)
//! - `pivot`, `shapes`, `forecast`: Shape builders
//! - `view`: Renderable output for the frontend (WHAT we display)
//! - `engine`: Request entry point
//!
//! Log targets used by this crate: CHART, PIPELINE, FORMULA, FORECAST.

pub mod definition;
pub mod engine;
pub mod forecast;
pub mod pipeline;
pub mod pivot;
pub mod plan;
pub mod shapes;
pub mod view;

pub use definition::*;
pub use self::engine::process_chart;
pub use forecast::{apply_forecast, holt_winters_forecast, linear_forecast};
pub use pipeline::{aggregate_groups, apply_top_n, group_records, prepare_records, run_aggregation, Group, GroupKey};
pub use pivot::build_pivot;
pub use plan::*;
pub use view::*;
