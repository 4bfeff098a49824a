//! FILENAME: engine/src/stats.rs
//! PURPOSE: Statistical primitives and the analyses built on them.
//! CONTEXT: The primitives (means, variances, quantiles, regression) are shared
//! with the box plot and forecast builders. The analyses (correlation,
//! two-sample t-test, z-score outliers) read strictly numeric values only and
//! report "not enough data" as an empty result rather than an error.

use crate::record::Record;
use crate::value::{format_fixed, KeyValue, Value};
use rustc_hash::FxHashSet;
use serde::Serialize;

/// |z| above which a value is an outlier.
pub const Z_SCORE_THRESHOLD: f64 = 3.0;

// ============================================================================
// PRIMITIVES
// ============================================================================

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn sum_squared_deviations(values: &[f64], mean: f64) -> f64 {
    values.iter().map(|v| (v - mean).powi(2)).sum()
}

/// Variance with divisor n-1. Needs two values.
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    Some(sum_squared_deviations(values, m) / (values.len() - 1) as f64)
}

pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    sample_variance(values).map(f64::sqrt)
}

/// Standard deviation with divisor n.
pub fn population_std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    Some((sum_squared_deviations(values, m) / values.len() as f64).sqrt())
}

/// Pearson correlation from sample covariance and sample standard deviations.
/// Constant series give NaN.
pub fn sample_correlation(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let mean_x = mean(x)?;
    let mean_y = mean(y)?;
    let covariance = x
        .iter()
        .zip(y)
        .map(|(a, b)| (a - mean_x) * (b - mean_y))
        .sum::<f64>()
        / (x.len() - 1) as f64;
    Some(covariance / (sample_std_dev(x)? * sample_std_dev(y)?))
}

/// Quantile of an ascending slice.
///
/// With `idx = n * p`: p = 1 gives the last element, p = 0 the first; a
/// fractional idx gives `x[ceil(idx) - 1]`; an integral idx gives the mean of
/// `x[idx - 1]` and `x[idx]` for even n, and `x[idx]` for odd n.
pub fn quantile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    let n = sorted.len();
    if n == 0 || !(0.0..=1.0).contains(&p) {
        return None;
    }
    if p == 1.0 {
        return sorted.last().copied();
    }
    if p == 0.0 {
        return sorted.first().copied();
    }

    let idx = n as f64 * p;
    if idx.fract() != 0.0 {
        return sorted.get(idx.ceil() as usize - 1).copied();
    }

    let idx = idx as usize;
    if n % 2 == 0 {
        Some((sorted[idx - 1] + sorted[idx]) / 2.0)
    } else {
        sorted.get(idx).copied()
    }
}

pub fn median_sorted(sorted: &[f64]) -> Option<f64> {
    quantile_sorted(sorted, 0.5)
}

/// Least-squares line through `points`, returned as `(slope, intercept)`.
/// A single point, or points sharing one x, give slope 0.
pub fn linear_regression(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    let n = points.len() as f64;
    match points {
        [] => None,
        [(_, y)] => Some((0.0, *y)),
        _ => {
            let (mut sum_x, mut sum_y, mut sum_xx, mut sum_xy) = (0.0, 0.0, 0.0, 0.0);
            for (x, y) in points {
                sum_x += x;
                sum_y += y;
                sum_xx += x * x;
                sum_xy += x * y;
            }
            let denominator = n * sum_xx - sum_x * sum_x;
            let slope = if denominator == 0.0 {
                0.0
            } else {
                (n * sum_xy - sum_x * sum_y) / denominator
            };
            let intercept = sum_y / n - slope * sum_x / n;
            Some((slope, intercept))
        }
    }
}

/// Two-sample Student t statistic with pooled variance.
pub fn t_statistic(x: &[f64], y: &[f64]) -> Option<f64> {
    let (n, m) = (x.len() as f64, y.len() as f64);
    let pooled = ((n - 1.0) * sample_variance(x)? + (m - 1.0) * sample_variance(y)?) / (n + m - 2.0);
    Some((mean(x)? - mean(y)?) / (pooled * (1.0 / n + 1.0 / m)).sqrt())
}

fn strict_numbers<'a>(records: impl IntoIterator<Item = &'a Record>, field: &str) -> Vec<f64> {
    records
        .into_iter()
        .filter_map(|r| r.value(field).as_strict_number())
        .collect()
}

// ============================================================================
// ANALYSES
// ============================================================================

/// Correlation between two measures. Each series keeps only genuine numbers;
/// series of different length, or shorter than two, have no correlation.
pub fn correlation(records: &[Record], measure1: &str, measure2: &str) -> Option<f64> {
    let x = strict_numbers(records, measure1);
    let y = strict_numbers(records, measure2);
    let r = sample_correlation(&x, &y);
    log::debug!(target: "STATS", "correlation({}, {}) over {}/{} values = {:?}", measure1, measure2, x.len(), y.len(), r);
    r
}

#[derive(Debug, Clone, PartialEq)]
pub struct TTestResult {
    pub group1: Value,
    pub group2: Value,
    pub t_value: f64,
    pub degrees_of_freedom: usize,
}

/// Compares `measure` between the first two distinct non-null values of
/// `dimension`. Each group needs at least two numeric observations.
pub fn t_test(records: &[Record], measure: &str, dimension: &str) -> Option<TTestResult> {
    let mut seen = FxHashSet::default();
    let groups: Vec<&Value> = records
        .iter()
        .map(|r| r.value(dimension))
        .filter(|v| !v.is_null())
        .filter(|v| seen.insert(KeyValue::from(*v)))
        .take(2)
        .collect();

    if groups.len() < 2 {
        log::debug!(target: "STATS", "t-test on '{}': fewer than two groups", dimension);
        return None;
    }
    let (group1, group2) = (groups[0], groups[1]);

    let sample = |group: &Value| strict_numbers(records.iter().filter(|r| r.value(dimension) == group), measure);
    let x = sample(group1);
    let y = sample(group2);
    if x.len() < 2 || y.len() < 2 {
        log::debug!(target: "STATS", "t-test on '{}': groups of {} and {} observations", measure, x.len(), y.len());
        return None;
    }

    Some(TTestResult {
        group1: group1.clone(),
        group2: group2.clone(),
        t_value: t_statistic(&x, &y)?,
        degrees_of_freedom: x.len() + y.len() - 2,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outlier {
    /// 1-based position of the record in the input.
    pub row: usize,
    pub value: f64,
    pub z_score: f64,
}

/// Records whose population z-score exceeds the threshold in magnitude.
pub fn z_score_outliers(records: &[Record], measure: &str) -> Vec<Outlier> {
    let values = strict_numbers(records, measure);
    if values.len() < 2 {
        return Vec::new();
    }
    let (Some(m), Some(sd)) = (mean(&values), population_std_dev(&values)) else {
        return Vec::new();
    };
    if sd == 0.0 {
        return Vec::new();
    }

    records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| {
            let value = record.value(measure).as_strict_number()?;
            let z_score = (value - m) / sd;
            (z_score.abs() > Z_SCORE_THRESHOLD).then_some(Outlier {
                row: index + 1,
                value,
                z_score,
            })
        })
        .collect()
}

// ============================================================================
// RESULT TABLES
// ============================================================================

/// Tabular analysis output: column headers and rows of scalar cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl AnalysisTable {
    fn new(headers: &[&str], rows: Vec<Vec<Value>>) -> Self {
        AnalysisTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows,
        }
    }
}

pub fn correlation_table(records: &[Record], measure1: &str, measure2: &str) -> AnalysisTable {
    let coefficient = match correlation(records, measure1, measure2) {
        Some(r) => format_fixed(r, 2),
        None => "N/A".to_string(),
    };
    AnalysisTable::new(
        &["Measures", "Correlation Coefficient"],
        vec![vec![
            Value::Text(format!("{} & {}", measure1, measure2)),
            Value::Text(coefficient),
        ]],
    )
}

pub fn t_test_table(records: &[Record], measure: &str, dimension: &str) -> AnalysisTable {
    let row = match t_test(records, measure, dimension) {
        Some(result) => vec![
            Value::from(measure),
            result.group1,
            result.group2,
            Value::Text(format_fixed(result.t_value, 2)),
            Value::from(result.degrees_of_freedom),
        ],
        None => vec![Value::from(measure), Value::Null, Value::Null, Value::Null, Value::Null],
    };
    AnalysisTable::new(
        &["Measure", "Group 1", "Group 2", "T-Value", "Degrees of Freedom"],
        vec![row],
    )
}

pub fn z_score_table(records: &[Record], measure: &str) -> AnalysisTable {
    let rows = z_score_outliers(records, measure)
        .into_iter()
        .map(|o| {
            vec![
                Value::from(o.row),
                Value::from(o.value),
                Value::Text(format_fixed(o.z_score, 2)),
            ]
        })
        .collect();
    AnalysisTable {
        headers: vec!["Original Index".to_string(), measure.to_string(), "Z-Score".to_string()],
        rows,
    }
}
