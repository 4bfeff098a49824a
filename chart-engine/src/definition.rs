//! FILENAME: chart-engine/src/definition.rs
//! Chart Definition - The serializable configuration of one view.
//!
//! This module contains all the types needed to DESCRIBE a chart request.
//! These structures are designed to be:
//! - Deserialized leniently from the UI's JSON (camelCase, aliases, defaults)
//! - Immutable snapshots of user intent
//!
//! `ChartPayload` is the projection of a configuration that travels back with
//! the chart data: resolved axis names, chart type and analytics settings.

use engine::value::deserialize_id;
use engine::{DashboardFilters, FieldDescriptor, FieldRole, Filter, Record, Value};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Dimension names that mark a geographic field.
pub const GEO_KEYWORDS: [&str; 6] = ["country", "nation", "region", "state", "province", "location"];

// ============================================================================
// CHART KIND
// ============================================================================

/// Visualization type. Unrecognized names are kept verbatim and rendered as
/// plain aggregated rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChartKind {
    Bar,
    Line,
    Scatter,
    Heatmap,
    Map,
    Pivot,
    WordCloud,
    Gantt,
    Sankey,
    BoxPlot,
    Other(String),
}

impl Default for ChartKind {
    fn default() -> Self {
        ChartKind::Bar
    }
}

impl ChartKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "bar" => ChartKind::Bar,
            "line" => ChartKind::Line,
            "scatter" => ChartKind::Scatter,
            "heatmap" => ChartKind::Heatmap,
            "map" => ChartKind::Map,
            "pivot" => ChartKind::Pivot,
            "wordCloud" => ChartKind::WordCloud,
            "gantt" => ChartKind::Gantt,
            "sankey" => ChartKind::Sankey,
            "boxplot" => ChartKind::BoxPlot,
            other => ChartKind::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::Line => "line",
            ChartKind::Scatter => "scatter",
            ChartKind::Heatmap => "heatmap",
            ChartKind::Map => "map",
            ChartKind::Pivot => "pivot",
            ChartKind::WordCloud => "wordCloud",
            ChartKind::Gantt => "gantt",
            ChartKind::Sankey => "sankey",
            ChartKind::BoxPlot => "boxplot",
            ChartKind::Other(name) => name,
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for ChartKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for ChartKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(ChartKind::from_name(&name))
    }
}

// ============================================================================
// SHELVES
// ============================================================================

/// Every configuration slot. Missing slots are empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Shelves {
    pub columns: Vec<FieldDescriptor>,
    pub rows: Vec<FieldDescriptor>,
    pub color: Vec<FieldDescriptor>,
    pub filters: Vec<Filter>,
    pub pivot_rows: Vec<FieldDescriptor>,
    pub pivot_columns: Vec<FieldDescriptor>,
    pub pivot_values: Vec<FieldDescriptor>,
}

impl Shelves {
    /// Fields on the axis shelves: columns, then rows, then color.
    pub fn axis_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.columns.iter().chain(&self.rows).chain(&self.color)
    }

    /// Fields on every shelf, pivot shelves included.
    pub fn all_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.axis_fields()
            .chain(&self.pivot_rows)
            .chain(&self.pivot_columns)
            .chain(&self.pivot_values)
    }

    pub fn axis_dimensions(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.axis_fields().filter(|f| f.is_dimension())
    }

    pub fn axis_measures(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.axis_fields().filter(|f| f.is_measure())
    }

    fn first_on(fields: &[FieldDescriptor], role: FieldRole) -> Option<&FieldDescriptor> {
        fields.iter().find(|f| f.role == role)
    }
}

// ============================================================================
// ANALYTICS
// ============================================================================

/// Forecast model selected in the analytics panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForecastModel {
    /// Additive seasonal exponential smoothing.
    Smoothing,
    /// Least-squares trend line.
    Linear,
}

/// One forecast point; a non-finite prediction travels as `null`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(default)]
    pub prediction: Option<f64>,
}

impl Prediction {
    pub fn new(value: f64) -> Self {
        Prediction {
            prediction: value.is_finite().then_some(value),
        }
    }
}

/// Trend-line and forecast settings. Keys this engine does not use are kept
/// and echoed back untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    #[serde(default, deserialize_with = "deserialize_truthy")]
    pub show_trend_line: bool,

    #[serde(default, deserialize_with = "deserialize_periods")]
    pub forecast_periods: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast_data: Option<Vec<Prediction>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast_confidence: Option<Vec<serde_json::Value>>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Analytics {
    pub fn forecast_model(&self) -> ForecastModel {
        match self.model.as_deref() {
            Some("smoothing") => ForecastModel::Smoothing,
            _ => ForecastModel::Linear,
        }
    }
}

/// Forecast horizons arrive as numbers or numeric strings; anything else,
/// including negative values, means no forecast.
fn deserialize_periods<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let periods = Value::deserialize(deserializer)?
        .as_number()
        .filter(|n| n.is_finite() && *n > 0.0)
        .map_or(0, |n| n.floor() as u64);
    Ok(periods)
}

/// Flags from the UI are read by truthiness: `null`, `false`, `0`, `NaN` and
/// the empty string are off, anything else is on.
fn deserialize_truthy<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let flag = match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => b,
        serde_json::Value::Number(n) => n.as_f64().map_or(false, |n| n != 0.0 && !n.is_nan()),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    };
    Ok(flag)
}

// ============================================================================
// CHART CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChartConfig {
    /// View id; sent as a number or a string, compared as a string.
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,

    #[serde(alias = "chartType")]
    pub active_chart_type: ChartKind,

    pub shelves: Shelves,

    pub analytics: Option<Analytics>,
}

/// A `processDataForChart` request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChartRequest {
    pub records: Option<Vec<Record>>,

    #[serde(alias = "configuration")]
    pub config: ChartConfig,

    /// Every measure of the data source, calculated ones included.
    pub measures: Vec<FieldDescriptor>,

    pub dashboard_filters: Option<DashboardFilters>,
}

// ============================================================================
// CHART PAYLOAD
// ============================================================================

/// Resolved axes and settings returned alongside the chart data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_axis: Option<String>,
    pub y_axes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub filters: Vec<Filter>,
    pub chart_type: ChartKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analytics: Option<Analytics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heatmap_x: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heatmap_y: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heatmap_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo_field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_field: Option<String>,
}

pub fn is_geo_field(name: &str) -> bool {
    let lower = name.to_lowercase();
    GEO_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}

impl ChartPayload {
    pub fn from_config(config: &ChartConfig) -> Self {
        let shelves = &config.shelves;
        let kind = &config.active_chart_type;

        let x_field = if *kind == ChartKind::Scatter {
            Shelves::first_on(&shelves.columns, FieldRole::Measure)
        } else {
            Shelves::first_on(&shelves.columns, FieldRole::Dimension)
        };
        let color_field = Shelves::first_on(&shelves.color, FieldRole::Dimension);
        let first_row_measure = Shelves::first_on(&shelves.rows, FieldRole::Measure).map(|f| f.name.clone());

        let mut payload = ChartPayload {
            x_axis: x_field.map(FieldDescriptor::effective_name),
            y_axes: shelves.rows.iter().map(|f| f.name.clone()).collect(),
            color: color_field.map(FieldDescriptor::effective_name),
            filters: shelves.filters.clone(),
            chart_type: kind.clone(),
            analytics: config.analytics.clone(),
            heatmap_x: None,
            heatmap_y: None,
            heatmap_value: None,
            geo_field: None,
            value_field: None,
        };

        match kind {
            ChartKind::Heatmap => {
                let mut dimensions = shelves.axis_dimensions();
                payload.heatmap_x = dimensions.next().map(FieldDescriptor::effective_name);
                payload.heatmap_y = dimensions.next().map(FieldDescriptor::effective_name);
                payload.heatmap_value = first_row_measure;
            }
            ChartKind::Map => {
                payload.geo_field = shelves
                    .axis_dimensions()
                    .find(|f| is_geo_field(&f.name))
                    .map(FieldDescriptor::effective_name);
                payload.value_field = first_row_measure;
            }
            _ => {}
        }

        payload
    }
}
