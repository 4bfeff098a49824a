//! FILENAME: worker/src/request.rs
//! Payloads of the `runAnalysis` and `runBinning` requests. Chart requests use
//! `chart_engine::ChartRequest`.

use engine::{EngineError, EngineResult, Record, Value};
use serde::Deserialize;

/// The operation tag of a request envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    RunAnalysis,
    ProcessDataForChart,
    RunBinning,
    Unknown(String),
}

impl Operation {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "runAnalysis" => Operation::RunAnalysis,
            "processDataForChart" => Operation::ProcessDataForChart,
            "runBinning" => Operation::RunBinning,
            other => Operation::Unknown(other.to_string()),
        }
    }
}

/// `{"type": ..., "payload": ...}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestType {
    Correlation,
    Ttest,
    Zscore,
    Clustering,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisParams {
    pub measure1: Option<String>,
    pub measure2: Option<String>,
    pub measure: Option<String>,
    pub dimension: Option<String>,
    /// Cluster count; sent as a number or a numeric string.
    pub k: Value,
    pub fields: Vec<String>,
}

impl AnalysisParams {
    /// A named parameter that must be present and non-empty.
    pub fn require<'a>(value: &'a Option<String>, name: &str) -> EngineResult<&'a str> {
        value
            .as_deref()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| EngineError::MissingParameter(name.to_string()))
    }

    /// Cluster count; absent, negative or fractional-below-one counts give 0.
    pub fn cluster_count(&self) -> usize {
        self.k
            .as_number()
            .filter(|k| k.is_finite() && *k >= 1.0)
            .map_or(0, |k| k.floor() as usize)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisPayload {
    pub test_type: TestType,
    pub records: Vec<Record>,
    pub params: AnalysisParams,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BinningPayload {
    pub records: Vec<Record>,
    pub measure: Option<String>,
    /// Sent as a number or a numeric string.
    pub bin_size: Value,
    pub bin_name: Option<String>,
}

impl BinningPayload {
    pub fn bin_size(&self) -> Option<f64> {
        self.bin_size.as_number()
    }
}
