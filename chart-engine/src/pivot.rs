//! FILENAME: chart-engine/src/pivot.rs
//! Pivot table - cross-tabulates one value field by row fields and one
//! column field.
//!
//! Algorithm:
//! 1. Collect the distinct values of the column field and sort them
//!    (nulls, numbers ascending, text, booleans)
//! 2. Group records by the tuple of row-field values, first appearance first
//! 3. For each (row group, column header) intersection, aggregate the value
//!    field over the group's records whose column value equals the header

use crate::pipeline::group_records;
use crate::plan::PivotSpec;
use crate::view::PivotTable;
use engine::{aggregate, compare_values, KeyValue, Record, Value};
use rustc_hash::FxHashSet;

pub fn build_pivot(records: &[Record], spec: &PivotSpec) -> PivotTable {
    let mut seen: FxHashSet<KeyValue> = FxHashSet::default();
    let mut column_headers: Vec<Value> = records
        .iter()
        .map(|r| r.value(&spec.column_field))
        .filter(|v| seen.insert(KeyValue::from(*v)))
        .cloned()
        .collect();
    column_headers.sort_by(compare_values);

    let headers: Vec<Value> = spec
        .row_fields
        .iter()
        .map(|f| Value::from(f.as_str()))
        .chain(column_headers.iter().cloned())
        .collect();

    let rows = group_records(records, &spec.row_fields)
        .into_iter()
        .map(|group| {
            let mut row: Vec<Value> = group.key.0.iter().map(KeyValue::to_value).collect();
            for header in &column_headers {
                let cell = aggregate(
                    spec.aggregation.clone(),
                    group
                        .records
                        .iter()
                        .filter(|r| r.value(&spec.column_field) == header)
                        .map(|r| r.value(&spec.value_field)),
                );
                row.push(Value::from(cell));
            }
            row
        })
        .collect();

    log::debug!(
        target: "CHART",
        "pivot: {} row fields x {} column headers",
        spec.row_fields.len(),
        column_headers.len()
    );

    PivotTable { headers, rows }
}
