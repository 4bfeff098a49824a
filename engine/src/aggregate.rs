//! FILENAME: engine/src/aggregate.rs
//! PURPOSE: Reducers that collapse a group's column into one number.
//! CONTEXT: Used by the grouping pipeline for plain measures, by the formula
//! evaluator for every aggregate call and by pivot cells.
//!
//! Policy:
//! - Values are coerced with `Value::as_number`; non-numeric entries are
//!   dropped, except that COUNT counts every entry and COUNTD counts distinct
//!   raw values.
//! - When no entry is numeric, SUM/AVG/COUNT give 0 and the rest give None.
//!   This check runs first, so it also applies to COUNT and COUNTD.

use crate::field::Aggregation;
use crate::value::{KeyValue, Value};
use rustc_hash::FxHashSet;

/// Reduces `values` with `function`.
pub fn aggregate<'a, I>(function: Aggregation, values: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a Value>,
{
    let raw: Vec<&Value> = values.into_iter().collect();
    let numbers: Vec<f64> = raw.iter().filter_map(|v| v.as_number()).collect();

    if numbers.is_empty() {
        return if function.zero_when_empty() { Some(0.0) } else { None };
    }

    match function {
        Aggregation::Other(name) => {
            log::debug!(target: "PIPELINE", "unsupported aggregation '{}'", name);
            None
        }
        Aggregation::Sum => Some(numbers.iter().sum()),
        Aggregation::Avg => Some(numbers.iter().sum::<f64>() / numbers.len() as f64),
        Aggregation::Count => Some(raw.len() as f64),
        Aggregation::CountDistinct => {
            let distinct: FxHashSet<KeyValue> = raw.iter().map(|v| KeyValue::from(*v)).collect();
            Some(distinct.len() as f64)
        }
        Aggregation::Min => numbers.iter().copied().reduce(f64::min),
        Aggregation::Max => numbers.iter().copied().reduce(f64::max),
        Aggregation::Median => {
            let mut sorted = numbers;
            sorted.sort_by(|a, b| a.total_cmp(b));
            let mid = sorted.len() / 2;
            if sorted.len() % 2 == 1 {
                Some(sorted[mid])
            } else {
                Some((sorted[mid - 1] + sorted[mid]) / 2.0)
            }
        }
        Aggregation::StdDev => Some(sample_variance(&numbers).sqrt()),
        Aggregation::Var => Some(sample_variance(&numbers)),
    }
}

/// Two-pass sample variance; fewer than two values give 0.
fn sample_variance(numbers: &[f64]) -> f64 {
    if numbers.len() < 2 {
        return 0.0;
    }
    let n = numbers.len() as f64;
    let mean = numbers.iter().sum::<f64>() / n;
    numbers.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nums(values: &[f64]) -> Vec<Value> {
        values.iter().map(|v| Value::Number(*v)).collect()
    }

    #[test]
    fn empty_input_follows_policy() {
        let empty: Vec<Value> = Vec::new();
        for function in [Aggregation::Sum, Aggregation::Avg, Aggregation::Count] {
            assert_eq!(aggregate(function.clone(), &empty), Some(0.0), "{}", function);
        }
        for function in [
            Aggregation::CountDistinct,
            Aggregation::Min,
            Aggregation::Max,
            Aggregation::Median,
            Aggregation::StdDev,
            Aggregation::Var,
        ] {
            assert_eq!(aggregate(function.clone(), &empty), None, "{}", function);
        }
    }

    #[test]
    fn unsupported_aggregation_gives_no_value() {
        let mode = Aggregation::Other("MODE".to_string());
        assert_eq!(aggregate(mode.clone(), &nums(&[1.0, 2.0, 2.0])), None);
        assert_eq!(aggregate(mode, &Vec::new()), None);
    }

    #[test]
    fn all_text_input_counts_as_empty() {
        let values = vec![Value::from("a"), Value::from("b")];
        assert_eq!(aggregate(Aggregation::Count, &values), Some(0.0));
        assert_eq!(aggregate(Aggregation::CountDistinct, &values), None);
    }

    #[test]
    fn count_includes_non_numeric_entries() {
        let values = vec![Value::from(1.0), Value::from("x"), Value::from("x")];
        assert_eq!(aggregate(Aggregation::Count, &values), Some(3.0));
        assert_eq!(aggregate(Aggregation::CountDistinct, &values), Some(2.0));
        assert_eq!(aggregate(Aggregation::Sum, &values), Some(1.0));
    }

    #[test]
    fn numeric_text_is_coerced() {
        let values = vec![Value::from("10"), Value::from(5.0), Value::from(true)];
        assert_eq!(aggregate(Aggregation::Sum, &values), Some(16.0));
        assert_eq!(aggregate(Aggregation::Max, &values), Some(10.0));
        assert_eq!(aggregate(Aggregation::Min, &values), Some(1.0));
    }

    #[test]
    fn median_is_permutation_invariant() {
        let a = nums(&[5.0, 1.0, 4.0, 2.0]);
        let b = nums(&[2.0, 4.0, 1.0, 5.0]);
        assert_eq!(aggregate(Aggregation::Median, &a), Some(3.0));
        assert_eq!(aggregate(Aggregation::Median, &a), aggregate(Aggregation::Median, &b));
        assert_eq!(aggregate(Aggregation::Median, &nums(&[9.0, 1.0, 3.0])), Some(3.0));
    }

    #[test]
    fn median_leaves_input_untouched() {
        let values = nums(&[3.0, 1.0, 2.0]);
        aggregate(Aggregation::Median, &values);
        assert_eq!(values, nums(&[3.0, 1.0, 2.0]));
    }

    #[test]
    fn sample_statistics_use_n_minus_one() {
        let values = nums(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        let var = aggregate(Aggregation::Var, &values).unwrap();
        assert!((var - 32.0 / 7.0).abs() < 1e-12);
        let sd = aggregate(Aggregation::StdDev, &values).unwrap();
        assert!((sd - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);

        assert_eq!(aggregate(Aggregation::Var, &nums(&[4.0])), Some(0.0));
        assert_eq!(aggregate(Aggregation::Avg, &nums(&[1.0, 2.0])), Some(1.5));
    }
}
