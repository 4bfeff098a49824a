//! FILENAME: chart-engine/src/shapes/boxplot.rs
//! PURPOSE: Five-number summaries per category.
//! CONTEXT: Only strictly numeric values take part; text that happens to look
//! like a number does not. A category without any numeric value reports
//! `[0, 0, 0, 0, 0]`.

use crate::pipeline::group_records;
use crate::plan::BoxPlotSpec;
use crate::view::BoxPlotChart;
use engine::stats::{median_sorted, quantile_sorted};
use engine::KeyValue;
use engine::Record;

pub fn build_boxplot(records: &[Record], spec: &BoxPlotSpec) -> BoxPlotChart {
    let keys = [spec.category_field.clone()];
    let groups = group_records(records, &keys);

    let mut categories = Vec::with_capacity(groups.len());
    let mut boxplot_data = Vec::with_capacity(groups.len());
    for group in groups {
        let mut values: Vec<f64> = match &spec.value_field {
            Some(field) => group
                .records
                .iter()
                .filter_map(|r| r.value(field).as_strict_number())
                .collect(),
            None => Vec::new(),
        };
        values.sort_by(f64::total_cmp);

        categories.push(group.key.0.first().map(KeyValue::to_value).unwrap_or_default());
        boxplot_data.push(five_numbers(&values));
    }

    BoxPlotChart {
        categories,
        boxplot_data,
    }
}

fn five_numbers(sorted: &[f64]) -> [f64; 5] {
    let (Some(&min), Some(&max)) = (sorted.first(), sorted.last()) else {
        return [0.0; 5];
    };
    [
        min,
        quantile_sorted(sorted, 0.25).unwrap_or(min),
        median_sorted(sorted).unwrap_or(min),
        quantile_sorted(sorted, 0.75).unwrap_or(max),
        max,
    ]
}
