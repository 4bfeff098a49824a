//! FILENAME: chart-engine/src/plan.rs
//! PURPOSE: Resolves a configuration into the work one chart type needs.
//! CONTEXT: Every chart type reads a different set of fields. `ChartPlan`
//! carries exactly the fields its builder uses, and a configuration that lacks
//! one of them resolves to `Unavailable`, which renders as the empty shape of
//! that chart type.

use crate::definition::{ChartConfig, ChartKind, ChartPayload};
use engine::{Aggregation, FieldDescriptor};

/// Grouping keys and measures for the aggregation pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateSpec {
    pub grouping_keys: Vec<String>,
    pub measures: Vec<String>,
}

impl AggregateSpec {
    /// Aggregation runs only with at least one key and one measure.
    pub fn needs_aggregation(&self) -> bool {
        !self.grouping_keys.is_empty() && !self.measures.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PivotSpec {
    pub row_fields: Vec<String>,
    pub column_field: String,
    pub value_field: String,
    pub aggregation: Aggregation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GanttSpec {
    pub category_field: String,
    pub start_field: String,
    pub end_field: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SankeySpec {
    pub source_field: String,
    pub target_field: String,
    pub value_field: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxPlotSpec {
    pub category_field: String,
    pub value_field: Option<String>,
}

/// One variant per chart shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartPlan {
    /// Bar, line and any other series chart: aggregated rows.
    Cartesian(AggregateSpec),
    /// Filtered raw records.
    Scatter,
    Heatmap(AggregateSpec),
    Map(AggregateSpec),
    Pivot(PivotSpec),
    WordCloud { text_field: String },
    Gantt(GanttSpec),
    Sankey(SankeySpec),
    BoxPlot(BoxPlotSpec),
    /// Required fields are missing for this kind.
    Unavailable(ChartKind),
}

impl ChartPlan {
    pub fn resolve(config: &ChartConfig, payload: &ChartPayload) -> ChartPlan {
        let kind = &config.active_chart_type;
        let shelves = &config.shelves;

        let plan = match kind {
            ChartKind::Scatter => Some(ChartPlan::Scatter),

            ChartKind::Heatmap => payload
                .heatmap_x
                .clone()
                .zip(payload.heatmap_y.clone())
                .filter(|_| payload.heatmap_value.is_some())
                .map(|(x, y)| {
                    ChartPlan::Heatmap(AggregateSpec {
                        grouping_keys: vec![x, y],
                        measures: measures_with(&payload.y_axes, payload.heatmap_value.as_deref()),
                    })
                }),

            ChartKind::Map => payload.geo_field.clone().zip(payload.value_field.as_deref()).map(
                |(geo, value)| {
                    ChartPlan::Map(AggregateSpec {
                        grouping_keys: vec![geo],
                        measures: measures_with(&payload.y_axes, Some(value)),
                    })
                },
            ),

            ChartKind::Pivot => {
                let row_fields: Vec<String> =
                    shelves.pivot_rows.iter().map(FieldDescriptor::effective_name).collect();
                let column = shelves.pivot_columns.first();
                let value = shelves.pivot_values.first();
                column
                    .zip(value)
                    .filter(|_| !row_fields.is_empty())
                    .map(|(column, value)| {
                        ChartPlan::Pivot(PivotSpec {
                            row_fields,
                            column_field: column.effective_name(),
                            value_field: value.effective_name(),
                            aggregation: value.aggregation.clone().unwrap_or_default(),
                        })
                    })
            }

            ChartKind::WordCloud => shelves
                .axis_dimensions()
                .next()
                .map(|f| ChartPlan::WordCloud {
                    text_field: f.effective_name(),
                }),

            ChartKind::Gantt => {
                let category = shelves
                    .axis_dimensions()
                    .find(|f| !f.looks_like_date())
                    .map(FieldDescriptor::effective_name);
                let mut dates = shelves.axis_fields().filter(|f| f.looks_like_date());
                let start = dates.next().map(|f| f.name.clone());
                let end = dates.next().map(|f| f.name.clone());
                match (category, start, end) {
                    (Some(category_field), Some(start_field), Some(end_field)) => {
                        Some(ChartPlan::Gantt(GanttSpec {
                            category_field,
                            start_field,
                            end_field,
                        }))
                    }
                    _ => None,
                }
            }

            ChartKind::Sankey => {
                let mut dimensions = shelves.axis_dimensions().map(FieldDescriptor::effective_name);
                let source = dimensions.next();
                let target = dimensions.next();
                let value = shelves.axis_measures().next().map(|f| f.name.clone());
                match (source, target, value) {
                    (Some(source_field), Some(target_field), Some(value_field)) => {
                        Some(ChartPlan::Sankey(SankeySpec {
                            source_field,
                            target_field,
                            value_field,
                        }))
                    }
                    _ => None,
                }
            }

            ChartKind::BoxPlot => payload.x_axis.clone().map(|category_field| {
                ChartPlan::BoxPlot(BoxPlotSpec {
                    category_field,
                    value_field: payload.y_axes.first().cloned(),
                })
            }),

            ChartKind::Bar | ChartKind::Line | ChartKind::Other(_) => {
                Some(ChartPlan::Cartesian(AggregateSpec {
                    grouping_keys: payload.x_axis.iter().chain(&payload.color).cloned().collect(),
                    measures: payload.y_axes.clone(),
                }))
            }
        };

        plan.unwrap_or_else(|| {
            log::debug!(target: "CHART", "'{}' chart is missing required fields", kind);
            ChartPlan::Unavailable(kind.clone())
        })
    }
}

fn measures_with(y_axes: &[String], value: Option<&str>) -> Vec<String> {
    let mut measures = y_axes.to_vec();
    if let Some(value) = value {
        if !measures.iter().any(|m| m == value) {
            measures.push(value.to_string());
        }
    }
    measures
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::DrillLevel;

    fn resolve(config: &ChartConfig) -> ChartPlan {
        ChartPlan::resolve(config, &ChartPayload::from_config(config))
    }

    fn with_kind(kind: ChartKind) -> ChartConfig {
        ChartConfig {
            active_chart_type: kind,
            ..Default::default()
        }
    }

    #[test]
    fn bar_groups_by_x_and_color() {
        let mut cfg = with_kind(ChartKind::Bar);
        cfg.shelves.columns = vec![FieldDescriptor::dimension("Region")];
        cfg.shelves.rows = vec![FieldDescriptor::measure("Sales")];
        cfg.shelves.color = vec![FieldDescriptor::dimension("Segment")];

        assert_eq!(
            resolve(&cfg),
            ChartPlan::Cartesian(AggregateSpec {
                grouping_keys: vec!["Region".to_string(), "Segment".to_string()],
                measures: vec!["Sales".to_string()],
            })
        );
    }

    #[test]
    fn unknown_kinds_render_as_cartesian() {
        let plan = resolve(&with_kind(ChartKind::Other("area".to_string())));
        assert!(matches!(plan, ChartPlan::Cartesian(ref spec) if !spec.needs_aggregation()));
    }

    #[test]
    fn pivot_needs_rows_column_and_value() {
        let mut cfg = with_kind(ChartKind::Pivot);
        cfg.shelves.pivot_rows = vec![FieldDescriptor::dimension("Region")];
        cfg.shelves.pivot_columns = vec![FieldDescriptor::date("Order Date", DrillLevel::Year)];
        assert_eq!(resolve(&cfg), ChartPlan::Unavailable(ChartKind::Pivot));

        cfg.shelves.pivot_values =
            vec![FieldDescriptor::measure("Sales").with_aggregation(Aggregation::Avg)];
        assert_eq!(
            resolve(&cfg),
            ChartPlan::Pivot(PivotSpec {
                row_fields: vec!["Region".to_string()],
                column_field: "Order Date (year)".to_string(),
                value_field: "Sales".to_string(),
                aggregation: Aggregation::Avg,
            })
        );
    }

    #[test]
    fn gantt_uses_raw_date_names() {
        let mut cfg = with_kind(ChartKind::Gantt);
        cfg.shelves.columns = vec![
            FieldDescriptor::date("Start Date", DrillLevel::Month),
            FieldDescriptor::dimension("Task"),
        ];
        cfg.shelves.rows = vec![FieldDescriptor::dimension("Due date")];

        assert_eq!(
            resolve(&cfg),
            ChartPlan::Gantt(GanttSpec {
                category_field: "Task".to_string(),
                start_field: "Start Date".to_string(),
                end_field: "Due date".to_string(),
            })
        );

        cfg.shelves.rows.clear();
        assert_eq!(resolve(&cfg), ChartPlan::Unavailable(ChartKind::Gantt));
    }

    #[test]
    fn sankey_needs_two_dimensions_and_a_measure() {
        let mut cfg = with_kind(ChartKind::Sankey);
        cfg.shelves.columns = vec![FieldDescriptor::dimension("From")];
        cfg.shelves.rows = vec![FieldDescriptor::measure("Flow")];
        assert_eq!(resolve(&cfg), ChartPlan::Unavailable(ChartKind::Sankey));

        cfg.shelves.color = vec![FieldDescriptor::dimension("To")];
        assert!(matches!(resolve(&cfg), ChartPlan::Sankey(ref s) if s.target_field == "To"));
    }

    #[test]
    fn map_needs_a_geographic_dimension() {
        let mut cfg = with_kind(ChartKind::Map);
        cfg.shelves.columns = vec![FieldDescriptor::dimension("Product")];
        cfg.shelves.rows = vec![FieldDescriptor::measure("Sales")];
        assert_eq!(resolve(&cfg), ChartPlan::Unavailable(ChartKind::Map));

        cfg.shelves.color = vec![FieldDescriptor::dimension("State")];
        assert_eq!(
            resolve(&cfg),
            ChartPlan::Map(AggregateSpec {
                grouping_keys: vec!["State".to_string()],
                measures: vec!["Sales".to_string()],
            })
        );
    }
}
