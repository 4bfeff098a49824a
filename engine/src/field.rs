//! FILENAME: engine/src/field.rs
//! Field descriptors - how a dataset column is placed on a shelf.
//!
//! A descriptor names a column, says whether it is grouped on (dimension) or
//! reduced (measure), and carries the date drill level, the aggregation and,
//! for calculated measures, the formula.

use crate::error::{EngineError, EngineResult};
use parser::AggregateFunction;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// ROLES AND LEVELS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldRole {
    Dimension,
    Measure,
}

impl Default for FieldRole {
    fn default() -> Self {
        FieldRole::Dimension
    }
}

/// Date granularity for a date field placed on a shelf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrillLevel {
    Year,
    Quarter,
    Month,
}

impl DrillLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DrillLevel::Year => "year",
            DrillLevel::Quarter => "quarter",
            DrillLevel::Month => "month",
        }
    }
}

impl fmt::Display for DrillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// AGGREGATION
// ============================================================================

/// Reducer applied to a measure within a group. Unrecognized names are kept
/// verbatim and reduce to no value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Aggregation {
    Sum,
    Avg,
    Count,
    CountDistinct,
    Min,
    Max,
    Median,
    StdDev,
    Var,
    Other(String),
}

impl Default for Aggregation {
    fn default() -> Self {
        Aggregation::Sum
    }
}

impl Aggregation {
    /// Configuration names are matched case-insensitively.
    pub fn from_name(name: &str) -> Self {
        let upper = name.trim().to_ascii_uppercase();
        AggregateFunction::from_name(&upper)
            .map(Aggregation::from)
            .unwrap_or_else(|| Aggregation::Other(name.to_string()))
    }

    pub fn name(&self) -> &str {
        match self {
            Aggregation::Sum => "SUM",
            Aggregation::Avg => "AVG",
            Aggregation::Count => "COUNT",
            Aggregation::CountDistinct => "COUNTD",
            Aggregation::Min => "MIN",
            Aggregation::Max => "MAX",
            Aggregation::Median => "MEDIAN",
            Aggregation::StdDev => "STDEV",
            Aggregation::Var => "VAR",
            Aggregation::Other(name) => name,
        }
    }

    /// Whether an empty numeric input reduces to 0 rather than to no value.
    pub fn zero_when_empty(&self) -> bool {
        matches!(self, Aggregation::Sum | Aggregation::Avg | Aggregation::Count)
    }
}

impl From<AggregateFunction> for Aggregation {
    fn from(function: AggregateFunction) -> Self {
        match function {
            AggregateFunction::Sum => Aggregation::Sum,
            AggregateFunction::Avg => Aggregation::Avg,
            AggregateFunction::Count => Aggregation::Count,
            AggregateFunction::CountDistinct => Aggregation::CountDistinct,
            AggregateFunction::Min => Aggregation::Min,
            AggregateFunction::Max => Aggregation::Max,
            AggregateFunction::Median => Aggregation::Median,
            AggregateFunction::StdDev => Aggregation::StdDev,
            AggregateFunction::Var => Aggregation::Var,
        }
    }
}

impl FromStr for Aggregation {
    type Err = EngineError;

    /// Strict parse: unrecognized names are an error.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Aggregation::from_name(s) {
            Aggregation::Other(_) => Err(EngineError::InvalidField(format!("unknown aggregation '{}'", s))),
            known => Ok(known),
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Aggregation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Aggregation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Aggregation::from_name(&name))
    }
}

// ============================================================================
// FIELD DESCRIPTOR
// ============================================================================

/// A column placed on a shelf.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldDescriptor {
    pub name: String,

    /// Also accepted under the key `type`.
    #[serde(alias = "type")]
    pub role: FieldRole,

    pub is_date: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub drill_level: Option<DrillLevel>,

    pub is_calculated: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<Aggregation>,
}

impl FieldDescriptor {
    pub fn dimension(name: impl Into<String>) -> Self {
        FieldDescriptor {
            name: name.into(),
            role: FieldRole::Dimension,
            ..Default::default()
        }
    }

    pub fn measure(name: impl Into<String>) -> Self {
        FieldDescriptor {
            name: name.into(),
            role: FieldRole::Measure,
            ..Default::default()
        }
    }

    pub fn date(name: impl Into<String>, level: DrillLevel) -> Self {
        FieldDescriptor {
            name: name.into(),
            role: FieldRole::Dimension,
            is_date: true,
            drill_level: Some(level),
            ..Default::default()
        }
    }

    pub fn calculated(name: impl Into<String>, formula: impl Into<String>) -> Self {
        FieldDescriptor {
            name: name.into(),
            role: FieldRole::Measure,
            is_calculated: true,
            formula: Some(formula.into()),
            ..Default::default()
        }
    }

    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = Some(aggregation);
        self
    }

    pub fn is_dimension(&self) -> bool {
        self.role == FieldRole::Dimension
    }

    pub fn is_measure(&self) -> bool {
        self.role == FieldRole::Measure
    }

    /// The column this descriptor reads after date derivation:
    /// `"Order Date (quarter)"` for a drilled date field, else the name.
    pub fn effective_name(&self) -> String {
        match (self.is_date, self.drill_level) {
            (true, Some(level)) => format!("{} ({})", self.name, level),
            _ => self.name.clone(),
        }
    }

    /// Date fields for interval charts: flagged as dates, or named like one.
    pub fn looks_like_date(&self) -> bool {
        self.is_date || self.name.to_lowercase().contains("date")
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.is_calculated {
            if self.formula.as_deref().map_or(true, |f| f.trim().is_empty()) {
                return Err(EngineError::InvalidField(format!(
                    "calculated field '{}' has no formula",
                    self.name
                )));
            }
            if self.role != FieldRole::Measure {
                return Err(EngineError::InvalidField(format!(
                    "calculated field '{}' must be a measure",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_is_read_from_type_key() {
        let field: FieldDescriptor =
            serde_json::from_str(r#"{"name": "Sales", "type": "measure", "aggregation": "avg"}"#)
                .unwrap();
        assert_eq!(field.role, FieldRole::Measure);
        assert_eq!(field.aggregation, Some(Aggregation::Avg));
    }

    #[test]
    fn unknown_aggregation_is_kept_verbatim() {
        let field: FieldDescriptor =
            serde_json::from_str(r#"{"name": "Sales", "aggregation": "MODE"}"#).unwrap();
        assert_eq!(field.aggregation, Some(Aggregation::Other("MODE".to_string())));
        assert_eq!(serde_json::to_value(&field).unwrap()["aggregation"], "MODE");

        assert!("MODE".parse::<Aggregation>().is_err());
        assert_eq!("Countd".parse::<Aggregation>().unwrap(), Aggregation::CountDistinct);
    }

    #[test]
    fn effective_name_includes_drill_level() {
        let date = FieldDescriptor::date("Order Date", DrillLevel::Quarter);
        assert_eq!(date.effective_name(), "Order Date (quarter)");

        let mut undrilled = FieldDescriptor::dimension("Order Date");
        undrilled.is_date = true;
        assert_eq!(undrilled.effective_name(), "Order Date");
    }

    #[test]
    fn calculated_fields_need_formula_and_measure_role() {
        assert!(FieldDescriptor::calculated("Profit", "[Rev] - [Cost]").validate().is_ok());

        let mut no_formula = FieldDescriptor::calculated("Profit", "");
        assert!(matches!(no_formula.validate(), Err(EngineError::InvalidField(_))));

        no_formula.formula = Some("[Rev]".to_string());
        no_formula.role = FieldRole::Dimension;
        assert!(no_formula.validate().is_err());
    }

    #[test]
    fn date_detection_uses_flag_or_name() {
        assert!(FieldDescriptor::dimension("Ship date").looks_like_date());
        assert!(FieldDescriptor::date("Opened", DrillLevel::Year).looks_like_date());
        assert!(!FieldDescriptor::dimension("Task").looks_like_date());
    }
}
