//! FILENAME: chart-engine/src/view.rs
//! Chart View - The renderable output of a chart request.
//!
//! The shape of `chartData` depends on the chart type. Every variant
//! serializes to the plain JSON the renderer expects; no variant tag is
//! written.

use crate::definition::{ChartKind, ChartPayload};
use engine::{Record, Value};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotTable {
    pub headers: Vec<Value>,
    pub rows: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordCount {
    pub name: String,
    pub value: usize,
}

/// One bar of a Gantt chart: `[category index, start ms, end ms]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GanttTask {
    pub name: Value,
    pub value: [i64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GanttChart {
    pub series_data: Vec<GanttTask>,
    pub categories: Vec<Value>,
    /// Earliest start; null when no task had valid dates.
    pub start_time: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SankeyNode {
    pub name: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SankeyLink {
    pub source: Value,
    pub target: Value,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SankeyDiagram {
    pub nodes: Vec<SankeyNode>,
    pub links: Vec<SankeyLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxPlotChart {
    pub categories: Vec<Value>,
    /// `[min, q1, median, q3, max]` per category.
    pub boxplot_data: Vec<[f64; 5]>,
}

/// Chart data in the shape of its chart type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChartData {
    Rows(Vec<Record>),
    Pivot(PivotTable),
    WordCloud(Vec<WordCount>),
    Gantt(GanttChart),
    Sankey(SankeyDiagram),
    BoxPlot(BoxPlotChart),
}

impl ChartData {
    /// The empty result for a chart type whose required fields are missing.
    pub fn empty_for(kind: &ChartKind) -> ChartData {
        match kind {
            ChartKind::Pivot => ChartData::Pivot(PivotTable {
                headers: Vec::new(),
                rows: Vec::new(),
            }),
            ChartKind::WordCloud => ChartData::WordCloud(Vec::new()),
            ChartKind::Gantt => ChartData::Gantt(GanttChart {
                series_data: Vec::new(),
                categories: Vec::new(),
                start_time: Some(0),
            }),
            ChartKind::Sankey => ChartData::Sankey(SankeyDiagram {
                nodes: Vec::new(),
                links: Vec::new(),
            }),
            ChartKind::BoxPlot => ChartData::BoxPlot(BoxPlotChart {
                categories: Vec::new(),
                boxplot_data: Vec::new(),
            }),
            _ => ChartData::Rows(Vec::new()),
        }
    }

    pub fn rows(&self) -> Option<&[Record]> {
        match self {
            ChartData::Rows(rows) => Some(rows),
            _ => None,
        }
    }
}

/// Response of a chart request. A missing payload serializes as `{}`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartResponse {
    pub chart_data: ChartData,
    pub payload: Option<ChartPayload>,
}

impl ChartResponse {
    /// The response for a request without records.
    pub fn empty() -> Self {
        ChartResponse {
            chart_data: ChartData::Rows(Vec::new()),
            payload: None,
        }
    }
}

#[derive(Serialize)]
struct EmptyObject {}

impl Serialize for ChartResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ChartResponse", 2)?;
        state.serialize_field("chartData", &self.chart_data)?;
        match &self.payload {
            Some(payload) => state.serialize_field("payload", payload)?,
            None => state.serialize_field("payload", &EmptyObject {})?,
        }
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_response_has_empty_payload_object() {
        let json = serde_json::to_value(ChartResponse::empty()).unwrap();
        assert_eq!(json, json!({"chartData": [], "payload": {}}));
    }

    #[test]
    fn empty_shapes_match_their_chart_type() {
        let gantt = serde_json::to_value(ChartData::empty_for(&ChartKind::Gantt)).unwrap();
        assert_eq!(gantt, json!({"seriesData": [], "categories": [], "startTime": 0}));

        let pivot = serde_json::to_value(ChartData::empty_for(&ChartKind::Pivot)).unwrap();
        assert_eq!(pivot, json!({"headers": [], "rows": []}));

        let boxplot = serde_json::to_value(ChartData::empty_for(&ChartKind::BoxPlot)).unwrap();
        assert_eq!(boxplot, json!({"categories": [], "boxplotData": []}));

        let bar = serde_json::to_value(ChartData::empty_for(&ChartKind::Bar)).unwrap();
        assert_eq!(bar, json!([]));
    }
}
