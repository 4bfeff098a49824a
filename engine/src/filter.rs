//! FILENAME: engine/src/filter.rs
//! PURPOSE: Record filters from the filter shelf and from sibling views.
//! CONTEXT: Shelf filters and dashboard filters are ANDed together before
//! grouping. Top-N filters rank aggregated rows, so they pass through here
//! untouched and are applied by the pipeline after aggregation.

use crate::record::Record;
use crate::value::{deserialize_id, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// SHELF FILTERS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    #[serde(flatten)]
    pub kind: FilterKind,
}

/// Predicate selected by the filter's `mode` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum FilterKind {
    /// Keep records whose value is one of `values` (strict equality).
    Dimension {
        #[serde(default)]
        values: Vec<Value>,
    },
    /// Keep records whose numeric value lies in `[min, max]`.
    Range { min: f64, max: f64 },
    /// Keep the `n` aggregated rows ranking highest on `by`.
    TopN { n: usize, by: String },
    /// Modes this engine does not know pass every record.
    #[serde(other)]
    Unknown,
}

impl Filter {
    pub fn dimension(field: impl Into<String>, values: Vec<Value>) -> Self {
        Filter {
            field: field.into(),
            kind: FilterKind::Dimension { values },
        }
    }

    pub fn range(field: impl Into<String>, min: f64, max: f64) -> Self {
        Filter {
            field: field.into(),
            kind: FilterKind::Range { min, max },
        }
    }

    pub fn top_n(field: impl Into<String>, n: usize, by: impl Into<String>) -> Self {
        Filter {
            field: field.into(),
            kind: FilterKind::TopN { n, by: by.into() },
        }
    }

    /// Record-level predicate. Top-N and unknown modes always pass.
    pub fn matches(&self, record: &Record) -> bool {
        let value = record.value(&self.field);
        match &self.kind {
            FilterKind::Dimension { values } => values.contains(value),
            FilterKind::Range { min, max } => value
                .as_number()
                .is_some_and(|n| *min <= n && n <= *max),
            FilterKind::TopN { .. } | FilterKind::Unknown => true,
        }
    }
}

/// The first top-N filter on the shelf, as `(n, by)`.
pub fn find_top_n(filters: &[Filter]) -> Option<(usize, &str)> {
    filters.iter().find_map(|f| match &f.kind {
        FilterKind::TopN { n, by } => Some((*n, by.as_str())),
        _ => None,
    })
}

// ============================================================================
// DASHBOARD FILTERS
// ============================================================================

/// An equality filter injected by a selection in another view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardFilter {
    pub field: String,
    #[serde(default)]
    pub value: Value,
    /// Id of the view the selection was made in.
    #[serde(default, deserialize_with = "deserialize_id")]
    pub source_id: String,
}

impl DashboardFilter {
    pub fn matches(&self, record: &Record) -> bool {
        record.value(&self.field) == &self.value
    }
}

/// Dashboard filters arrive either keyed by filter id or as a plain list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DashboardFilters {
    Keyed(BTreeMap<String, DashboardFilter>),
    List(Vec<DashboardFilter>),
}

impl Default for DashboardFilters {
    fn default() -> Self {
        DashboardFilters::List(Vec::new())
    }
}

impl DashboardFilters {
    pub fn into_vec(self) -> Vec<DashboardFilter> {
        match self {
            DashboardFilters::Keyed(map) => map.into_values().collect(),
            DashboardFilters::List(list) => list,
        }
    }
}

// ============================================================================
// APPLICATION
// ============================================================================

/// Applies shelf filters, then the dashboard filters that did not originate
/// in `view_id`. A view never filters itself.
pub fn apply_filters(
    mut records: Vec<Record>,
    filters: &[Filter],
    dashboard_filters: &[DashboardFilter],
    view_id: &str,
) -> Vec<Record> {
    let foreign: Vec<&DashboardFilter> = dashboard_filters
        .iter()
        .filter(|df| df.source_id != view_id)
        .collect();

    if filters.is_empty() && foreign.is_empty() {
        return records;
    }

    let before = records.len();
    records.retain(|record| {
        filters.iter().all(|f| f.matches(record)) && foreign.iter().all(|df| df.matches(record))
    });

    log::debug!(
        target: "FILTER",
        "view '{}': {} shelf + {} dashboard filters kept {}/{} records",
        view_id,
        filters.len(),
        foreign.len(),
        records.len(),
        before
    );
    records
}
