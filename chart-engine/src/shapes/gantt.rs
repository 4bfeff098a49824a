//! FILENAME: chart-engine/src/shapes/gantt.rs
//! PURPOSE: Task intervals for a Gantt chart.
//! CONTEXT: One bar per record with a parsable start and end date. Bars are
//! indexed into the list of distinct categories, and the earliest start is
//! reported so the renderer can anchor its time axis.

use crate::plan::GanttSpec;
use crate::view::{GanttChart, GanttTask};
use engine::{date_millis, KeyValue, Record, Value};
use rustc_hash::FxHashMap;

pub fn build_gantt(records: &[Record], spec: &GanttSpec) -> GanttChart {
    let mut category_index: FxHashMap<KeyValue, usize> = FxHashMap::default();
    let mut categories: Vec<Value> = Vec::new();
    for record in records {
        let category = record.value(&spec.category_field);
        category_index.entry(KeyValue::from(category)).or_insert_with(|| {
            categories.push(category.clone());
            categories.len() - 1
        });
    }

    let mut series_data = Vec::new();
    let mut skipped = 0usize;
    for record in records {
        let start = date_millis(record.value(&spec.start_field));
        let end = date_millis(record.value(&spec.end_field));
        let (Some(start), Some(end)) = (start, end) else {
            skipped += 1;
            continue;
        };

        let category = record.value(&spec.category_field);
        let index = category_index.get(&KeyValue::from(category)).copied().unwrap_or(0);
        series_data.push(GanttTask {
            name: category.clone(),
            value: [index as i64, start, end],
        });
    }

    if skipped > 0 {
        log::debug!(target: "CHART", "gantt: skipped {} records with unparsable dates", skipped);
    }

    let start_time = series_data.iter().map(|task| task.value[1]).min();
    GanttChart {
        series_data,
        categories,
        start_time,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::record;

    fn spec() -> GanttSpec {
        GanttSpec {
            category_field: "Task".to_string(),
            start_field: "Start Date".to_string(),
            end_field: "End Date".to_string(),
        }
    }

    #[test]
    fn builds_indexed_intervals() {
        let records = vec![
            record! { "Task" => "Build", "Start Date" => "2024-01-03", "End Date" => "2024-01-10" },
            record! { "Task" => "Design", "Start Date" => "2024-01-01", "End Date" => "2024-01-02" },
            record! { "Task" => "Build", "Start Date" => "2024-02-01", "End Date" => "2024-02-05" },
        ];
        let chart = build_gantt(&records, &spec());

        assert_eq!(chart.categories, vec![Value::from("Build"), Value::from("Design")]);
        assert_eq!(chart.series_data.len(), 3);
        assert_eq!(chart.series_data[1].value[0], 1);
        assert_eq!(chart.series_data[2].value[0], 0);
        // 2024-01-01T00:00:00Z
        assert_eq!(chart.start_time, Some(1_704_067_200_000));
        assert_eq!(chart.series_data[1].value[1], 1_704_067_200_000);
        assert_eq!(chart.series_data[1].value[2] - chart.series_data[1].value[1], 86_400_000);
    }

    #[test]
    fn skips_unparsable_dates_but_keeps_categories() {
        let records = vec![
            record! { "Task" => "A", "Start Date" => "soon", "End Date" => "2024-01-10" },
            record! { "Task" => "B", "Start Date" => "2024-01-03", "End Date" => "2024-01-04" },
        ];
        let chart = build_gantt(&records, &spec());
        assert_eq!(chart.categories.len(), 2);
        assert_eq!(chart.series_data.len(), 1);
        assert_eq!(chart.series_data[0].value[0], 1);
    }

    #[test]
    fn start_time_is_null_without_valid_tasks() {
        let records = vec![record! { "Task" => "A" }];
        let chart = build_gantt(&records, &spec());
        assert_eq!(chart.start_time, None);
        let json = serde_json::to_value(&chart).unwrap();
        assert!(json["startTime"].is_null());
    }
}
