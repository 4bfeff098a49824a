//! FILENAME: engine/src/lib.rs
//! PURPOSE: Main library entry point for the chart data engine.
//! CONTEXT: Holds the record model and every computation that does not depend
//! on a chart layout: aggregation, derived fields, formulas, filters,
//! statistics and clustering. Chart assembly lives in `chart-engine`.
//!
//! Log targets used by this crate: PIPELINE, FILTER, FORMULA, STATS, CLUSTER.

pub mod aggregate;
pub mod cluster;
pub mod derive;
pub mod error;
pub mod field;
pub mod filter;
pub mod formula;
pub mod record;
pub mod stats;
pub mod value;

// Re-export commonly used types at the crate root
pub use aggregate::aggregate;
pub use cluster::{cluster_records, kmeans, ClusterStrategy, LloydStrategy, Point};
pub use derive::{bin_records, date_millis, derive_bin, derive_date, derive_date_fields, parse_date, INVALID_DATE};
pub use error::{EngineError, EngineResult};
pub use field::{Aggregation, DrillLevel, FieldDescriptor, FieldRole};
pub use filter::{apply_filters, find_top_n, DashboardFilter, DashboardFilters, Filter, FilterKind};
pub use formula::{compile, evaluate_formula, Formula};
pub use record::Record;
pub use stats::{AnalysisTable, Outlier, TTestResult};
pub use value::{compare_values, format_fixed, format_number, KeyValue, OrderedFloat, Value};
