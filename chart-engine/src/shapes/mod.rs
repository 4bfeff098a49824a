//! FILENAME: chart-engine/src/shapes/mod.rs
//! Builders for the chart types that are not plain aggregated rows.
//!
//! Each builder reads the prepared (derived and filtered) records and the
//! fields its plan resolved, and returns the chart-specific structure.

pub mod boxplot;
pub mod gantt;
pub mod sankey;
pub mod word_cloud;

pub use boxplot::build_boxplot;
pub use gantt::build_gantt;
pub use sankey::build_sankey;
pub use word_cloud::build_word_cloud;
