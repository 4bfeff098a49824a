//! FILENAME: chart-engine/src/pipeline.rs
//! PURPOSE: Record preparation, grouping and aggregation.
//! CONTEXT: Every chart starts from `prepare_records` (date derivation, then
//! shelf and dashboard filters). Series charts then run the records through
//! `group_records` and `aggregate_groups`, and finally the top-N filter.
//!
//! Groups are keyed by the typed values of the grouping fields, so the number
//! 1 and the text "1" never share a group. Groups appear in the order their
//! first record appears; records within a group keep input order.

use crate::definition::ChartConfig;
use crate::plan::AggregateSpec;
use engine::{
    aggregate, apply_filters, compile, derive_date_fields, find_top_n, Aggregation,
    DashboardFilter, EngineResult, FieldDescriptor, Filter, Formula, KeyValue, Record, Value,
};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::cmp::Ordering;

/// Typed tuple of grouping-field values. Most charts group on one or two keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey(pub SmallVec<[KeyValue; 2]>);

impl GroupKey {
    pub fn of(record: &Record, fields: &[String]) -> Self {
        GroupKey(fields.iter().map(|f| KeyValue::from(record.value(f))).collect())
    }
}

/// Records sharing one grouping key.
#[derive(Debug, Clone)]
pub struct Group<'a> {
    pub key: GroupKey,
    pub records: Vec<&'a Record>,
}

// ============================================================================
// PREPARATION
// ============================================================================

/// Derives date columns for every drilled date field on any shelf, then
/// applies the shelf filters and the dashboard filters of other views.
pub fn prepare_records(
    records: &[Record],
    config: &ChartConfig,
    dashboard_filters: &[DashboardFilter],
) -> Vec<Record> {
    let date_fields: Vec<&FieldDescriptor> = config.shelves.all_fields().filter(|f| f.is_date).collect();
    let derived = derive_date_fields(records, &date_fields);
    apply_filters(derived, &config.shelves.filters, dashboard_filters, &config.id)
}

// ============================================================================
// GROUPING
// ============================================================================

pub fn group_records<'a>(records: &'a [Record], keys: &[String]) -> Vec<Group<'a>> {
    let mut index: FxHashMap<GroupKey, usize> = FxHashMap::default();
    let mut groups: Vec<Group<'a>> = Vec::new();

    for record in records {
        let key = GroupKey::of(record, keys);
        match index.get(&key) {
            Some(&position) => groups[position].records.push(record),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(Group {
                    key,
                    records: vec![record],
                });
            }
        }
    }

    groups
}

// ============================================================================
// AGGREGATION
// ============================================================================

/// How one y-axis column is computed.
enum MeasurePlan {
    Reduce(Aggregation),
    Formula(EngineResult<Formula>),
}

fn plan_measure(field: &FieldDescriptor) -> MeasurePlan {
    if !field.is_calculated {
        return MeasurePlan::Reduce(field.aggregation.clone().unwrap_or_default());
    }
    let compiled = field
        .validate()
        .and_then(|_| compile(field.formula.as_deref().unwrap_or_default()));
    if let Err(e) = &compiled {
        log::warn!(target: "FORMULA", "calculated field '{}': {}", field.name, e);
    }
    MeasurePlan::Formula(compiled)
}

/// One output row per group: the grouping fields taken from the group's first
/// record, then one column per y-axis name that is a known measure.
pub fn aggregate_groups(
    groups: &[Group<'_>],
    keys: &[String],
    y_axes: &[String],
    measures: &[FieldDescriptor],
) -> Vec<Record> {
    let plans: Vec<(&str, MeasurePlan)> = y_axes
        .iter()
        .filter_map(|name| {
            let field = measures.iter().find(|m| &m.name == name);
            if field.is_none() {
                log::debug!(target: "PIPELINE", "y-axis '{}' is not a known measure", name);
            }
            field.map(|f| (name.as_str(), plan_measure(f)))
        })
        .collect();

    groups
        .iter()
        .map(|group| {
            let mut row = Record::new();
            if let Some(first) = group.records.first() {
                for key in keys {
                    if let Some(value) = first.get(key) {
                        row.insert(key.clone(), value.clone());
                    }
                }
            }

            for (name, plan) in &plans {
                let value = match plan {
                    MeasurePlan::Reduce(function) => aggregate(
                        function.clone(),
                        group.records.iter().map(|r| r.value(name)).filter(|v| !v.is_null()),
                    ),
                    MeasurePlan::Formula(Ok(formula)) => match formula.evaluate(&group.records) {
                        Ok(value) => Some(value),
                        Err(e) => {
                            log::warn!(target: "FORMULA", "{}", e);
                            None
                        }
                    },
                    MeasurePlan::Formula(Err(_)) => None,
                };
                row.insert(*name, Value::from(value));
            }
            row
        })
        .collect()
}

/// Groups and aggregates when there are both grouping keys and measures; otherwise
/// the records pass through unchanged.
pub fn run_aggregation(records: Vec<Record>, spec: &AggregateSpec, measures: &[FieldDescriptor]) -> Vec<Record> {
    if !spec.needs_aggregation() {
        return records;
    }
    let groups = group_records(&records, &spec.grouping_keys);
    log::debug!(
        target: "PIPELINE",
        "{} records -> {} groups on {:?}",
        records.len(),
        groups.len(),
        spec.grouping_keys
    );
    aggregate_groups(&groups, &spec.grouping_keys, &spec.measures, measures)
}

// ============================================================================
// TOP-N
// ============================================================================

/// Keeps the `n` rows ranking highest on `by`, when the first row carries
/// that field. Non-numeric ranks count as 0 and ties keep their order.
pub fn apply_top_n(mut rows: Vec<Record>, filters: &[Filter]) -> Vec<Record> {
    let Some((n, by)) = find_top_n(filters) else {
        return rows;
    };
    if !rows.first().is_some_and(|r| r.contains(by)) {
        return rows;
    }

    let rank = |r: &Record| r.value(by).as_number().unwrap_or(0.0);
    rows.sort_by(|a, b| rank(b).partial_cmp(&rank(a)).unwrap_or(Ordering::Equal));
    rows.truncate(n);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::record;

    fn region_sales() -> Vec<Record> {
        vec![
            record! { "Region" => "A", "Sales" => 10.0 },
            record! { "Region" => "A", "Sales" => 20.0 },
            record! { "Region" => "B", "Sales" => 5.0 },
        ]
    }

    fn spec(keys: &[&str], measures: &[&str]) -> AggregateSpec {
        AggregateSpec {
            grouping_keys: keys.iter().map(|k| k.to_string()).collect(),
            measures: measures.iter().map(|m| m.to_string()).collect(),
        }
    }

    #[test]
    fn sums_sales_by_region() {
        let rows = run_aggregation(
            region_sales(),
            &spec(&["Region"], &["Sales"]),
            &[FieldDescriptor::measure("Sales")],
        );
        assert_eq!(
            rows,
            vec![
                record! { "Region" => "A", "Sales" => 30.0 },
                record! { "Region" => "B", "Sales" => 5.0 },
            ]
        );
    }

    #[test]
    fn groups_follow_first_appearance() {
        let records = vec![
            record! { "k" => "z" },
            record! { "k" => 1.0 },
            record! { "k" => "1" },
            record! { "k" => "z" },
        ];
        let groups = group_records(&records, &["k".to_string()]);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].records.len(), 2);
        assert_eq!(groups[1].key, GroupKey(smallvec::smallvec![KeyValue::from(&Value::from(1.0))]));
    }

    #[test]
    fn unknown_measures_produce_no_column() {
        let rows = run_aggregation(region_sales(), &spec(&["Region"], &["Sales", "Profit"]), &[]);
        assert_eq!(rows[0], record! { "Region" => "A" });
    }

    #[test]
    fn configured_aggregation_is_used() {
        let measures = vec![FieldDescriptor::measure("Sales").with_aggregation(Aggregation::Max)];
        let rows = run_aggregation(region_sales(), &spec(&["Region"], &["Sales"]), &measures);
        assert_eq!(rows[0].value("Sales"), &Value::Number(20.0));
    }

    #[test]
    fn calculated_measures_degrade_to_null() {
        let records = vec![record! { "Region" => "A", "Rev" => 10.0, "Cost" => 4.0 }];
        let measures = vec![
            FieldDescriptor::calculated("Profit", "[Rev] - [Cost]"),
            FieldDescriptor::calculated("Bad", "[Rev] + alert(1)"),
            FieldDescriptor::calculated("Empty", ""),
        ];
        let rows = run_aggregation(records, &spec(&["Region"], &["Profit", "Bad", "Empty"]), &measures);
        assert_eq!(rows[0].value("Profit"), &Value::Number(6.0));
        assert!(rows[0].value("Bad").is_null());
        assert!(rows[0].value("Empty").is_null());
    }

    #[test]
    fn no_keys_means_no_aggregation() {
        let rows = run_aggregation(region_sales(), &spec(&[], &["Sales"]), &[FieldDescriptor::measure("Sales")]);
        assert_eq!(rows, region_sales());
    }

    #[test]
    fn top_n_keeps_highest_ranks_stably() {
        let rows = vec![
            record! { "k" => "a", "v" => 5.0 },
            record! { "k" => "b", "v" => 9.0 },
            record! { "k" => "c", "v" => "x" },
            record! { "k" => "d", "v" => 9.0 },
            record! { "k" => "e", "v" => 1.0 },
        ];
        let kept = apply_top_n(rows, &[Filter::top_n("k", 3, "v")]);
        let keys: Vec<String> = kept.iter().map(|r| r.value("k").to_label()).collect();
        assert_eq!(keys, vec!["b", "d", "a"]);
    }

    #[test]
    fn top_n_needs_ranking_field_on_first_row() {
        let rows = region_sales();
        assert_eq!(apply_top_n(rows.clone(), &[Filter::top_n("Region", 1, "Profit")]), rows);
    }

    #[test]
    fn prepare_derives_dates_and_filters() {
        let mut config = ChartConfig {
            id: "v1".to_string(),
            ..Default::default()
        };
        config.shelves.columns = vec![FieldDescriptor::date("Order Date", engine::DrillLevel::Year)];
        config.shelves.filters = vec![Filter::dimension("Order Date (year)", vec![Value::from(2024.0)])];

        let records = vec![
            record! { "Order Date" => "2024-01-05" },
            record! { "Order Date" => "2023-07-01" },
        ];
        let prepared = prepare_records(&records, &config, &[]);
        assert_eq!(prepared.len(), 1);
        assert_eq!(prepared[0].value("Order Date (year)"), &Value::Number(2024.0));
    }
}
