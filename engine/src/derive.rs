//! FILENAME: engine/src/derive.rs
//! PURPOSE: Derived columns: date roll-ups and numeric bin labels.
//! CONTEXT: Date fields placed on a shelf with a drill level are read through
//! a derived column named `"{field} ({level})"`. Binning appends a label column
//! such as `"20-30"` to every record.

use crate::error::{EngineError, EngineResult};
use crate::field::{DrillLevel, FieldDescriptor};
use crate::record::Record;
use crate::value::{format_number, Value};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

/// Sentinel written in place of a date that could not be parsed.
pub const INVALID_DATE: &str = "Invalid Date";

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

// ============================================================================
// DATES
// ============================================================================

/// Parses a record value as a calendar date-time (UTC).
/// Numbers are read as epoch milliseconds.
pub fn parse_date(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::Number(ms) if ms.is_finite() => {
            DateTime::from_timestamp_millis(*ms as i64).map(|dt| dt.naive_utc())
        }
        Value::Text(text) => parse_date_str(text.trim()),
        _ => None,
    }
}

fn parse_date_str(text: &str) -> Option<NaiveDateTime> {
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }

    for format in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    // "2024-05" and "2024"
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{}-01", text), "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    if text.len() == 4 && text.chars().all(|c| c.is_ascii_digit()) {
        let year = text.parse().ok()?;
        return NaiveDate::from_ymd_opt(year, 1, 1)?.and_hms_opt(0, 0, 0);
    }

    None
}

/// Epoch milliseconds of a date value, for interval charts.
pub fn date_millis(value: &Value) -> Option<i64> {
    parse_date(value).map(|dt| dt.and_utc().timestamp_millis())
}

/// Rolls a date value up to `level`.
/// Year gives a number; quarter gives "2024-Q2"; month gives "2024-05".
pub fn derive_date(value: &Value, level: DrillLevel) -> Value {
    let Some(date) = parse_date(value) else {
        return Value::from(INVALID_DATE);
    };

    let year = date.year();
    match level {
        DrillLevel::Year => Value::from(year as f64),
        DrillLevel::Quarter => Value::Text(format!("{}-Q{}", year, date.month0() / 3 + 1)),
        DrillLevel::Month => Value::Text(format!("{}-{:02}", year, date.month())),
    }
}

/// Appends one derived column per drilled date descriptor.
pub fn derive_date_fields(records: &[Record], fields: &[&FieldDescriptor]) -> Vec<Record> {
    let drilled: Vec<(&str, DrillLevel, String)> = fields
        .iter()
        .filter(|f| f.is_date)
        .filter_map(|f| f.drill_level.map(|level| (f.name.as_str(), level, f.effective_name())))
        .collect();

    if drilled.is_empty() {
        return records.to_vec();
    }

    records
        .iter()
        .map(|record| {
            let mut derived = record.clone();
            for (source, level, target) in &drilled {
                let value = derive_date(record.value(source), *level);
                derived.insert(target.clone(), value);
            }
            derived
        })
        .collect()
}

// ============================================================================
// BINS
// ============================================================================

/// Label of the bin holding `value`, e.g. 23 with size 10 gives "20-30".
/// Only genuine numbers are binned; everything else gives `Null`.
pub fn derive_bin(value: &Value, bin_size: f64) -> Value {
    match value.as_strict_number() {
        Some(n) => {
            let lower = (n / bin_size).floor() * bin_size;
            let upper = lower + bin_size;
            Value::Text(format!("{}-{}", format_number(lower), format_number(upper)))
        }
        None => Value::Null,
    }
}

/// Returns copies of `records` with a bin label column appended.
pub fn bin_records(
    records: &[Record],
    measure: Option<&str>,
    bin_size: Option<f64>,
    bin_name: Option<&str>,
) -> EngineResult<Vec<Record>> {
    let measure = measure
        .filter(|m| !m.is_empty())
        .ok_or_else(|| EngineError::MissingParameter("measure".to_string()))?;
    let bin_size = bin_size
        .filter(|size| size.is_finite() && *size != 0.0)
        .ok_or_else(|| EngineError::MissingParameter("binSize".to_string()))?;
    let bin_name = bin_name
        .filter(|name| !name.is_empty())
        .ok_or_else(|| EngineError::MissingParameter("binName".to_string()))?;

    log::debug!(
        target: "PIPELINE",
        "binning {} records on '{}' by {} into '{}'",
        records.len(),
        measure,
        bin_size,
        bin_name
    );

    Ok(records
        .iter()
        .map(|record| record.with(bin_name, derive_bin(record.value(measure), bin_size)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;

    #[test]
    fn quarter_of_mid_may() {
        assert_eq!(
            derive_date(&Value::from("2024-05-17"), DrillLevel::Quarter),
            Value::from("2024-Q2")
        );
    }

    #[test]
    fn year_is_numeric_and_month_is_padded() {
        let date = Value::from("2023-01-09T08:30:00");
        assert_eq!(derive_date(&date, DrillLevel::Year), Value::Number(2023.0));
        assert_eq!(derive_date(&date, DrillLevel::Month), Value::from("2023-01"));
        assert_eq!(derive_date(&date, DrillLevel::Quarter), Value::from("2023-Q1"));
    }

    #[test]
    fn accepts_common_layouts() {
        for text in [
            "2024-12-31",
            "2024/12/31",
            "12/31/2024",
            "2024-12-31 23:59:59",
            "2024-12-31T10:00:00Z",
            "2024-12",
        ] {
            assert_eq!(
                derive_date(&Value::from(text), DrillLevel::Quarter),
                Value::from("2024-Q4"),
                "{}",
                text
            );
        }
        assert_eq!(derive_date(&Value::from("2024"), DrillLevel::Year), Value::Number(2024.0));
    }

    #[test]
    fn epoch_millis_are_dates() {
        // 2024-03-01T00:00:00Z
        let value = Value::Number(1_709_251_200_000.0);
        assert_eq!(derive_date(&value, DrillLevel::Month), Value::from("2024-03"));
        assert_eq!(date_millis(&value), Some(1_709_251_200_000));
    }

    #[test]
    fn unparsable_dates_become_sentinel() {
        for value in [Value::from("not a date"), Value::Null, Value::from(""), Value::from(true)] {
            assert_eq!(derive_date(&value, DrillLevel::Year), Value::from(INVALID_DATE));
        }
    }

    #[test]
    fn derives_columns_for_drilled_dates_only() {
        let records = vec![record! { "Order Date" => "2024-05-17", "Sales" => 1.0 }];
        let drilled = FieldDescriptor::date("Order Date", DrillLevel::Month);
        let plain = FieldDescriptor::dimension("Sales");
        let derived = derive_date_fields(&records, &[&drilled, &plain]);

        assert_eq!(derived[0].value("Order Date (month)"), &Value::from("2024-05"));
        assert_eq!(derived[0].len(), 3);
        assert_eq!(records[0].len(), 2);
    }

    #[test]
    fn bins_values_into_labels() {
        assert_eq!(derive_bin(&Value::from(23.0), 10.0), Value::from("20-30"));
        assert_eq!(derive_bin(&Value::from(-5.0), 10.0), Value::from("-10-0"));
        assert_eq!(derive_bin(&Value::from(2.5), 0.5), Value::from("2.5-3"));
        assert_eq!(derive_bin(&Value::from("23"), 10.0), Value::Null);
    }

    #[test]
    fn binning_is_idempotent() {
        let records = vec![record! { "Age" => 23.0 }, record! { "Age" => "n/a" }];
        let once = bin_records(&records, Some("Age"), Some(10.0), Some("Age Bin")).unwrap();
        let twice = bin_records(&once, Some("Age"), Some(10.0), Some("Age Bin")).unwrap();

        assert_eq!(once, twice);
        assert_eq!(once[0].value("Age Bin"), &Value::from("20-30"));
        assert!(once[1].value("Age Bin").is_null());
    }

    #[test]
    fn binning_requires_all_parameters() {
        let records = vec![record! { "Age" => 23.0 }];
        let cases = [
            bin_records(&records, None, Some(10.0), Some("Bin")),
            bin_records(&records, Some(""), Some(10.0), Some("Bin")),
            bin_records(&records, Some("Age"), None, Some("Bin")),
            bin_records(&records, Some("Age"), Some(0.0), Some("Bin")),
            bin_records(&records, Some("Age"), Some(f64::NAN), Some("Bin")),
            bin_records(&records, Some("Age"), Some(10.0), None),
        ];
        for result in cases {
            assert!(matches!(result, Err(EngineError::MissingParameter(_))));
        }
    }
}
