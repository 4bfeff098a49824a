//! FILENAME: engine/src/value.rs
//! PURPOSE: Defines the scalar value held by every record field.
//! CONTEXT: Records arrive as JSON objects whose fields are numbers, strings
//! (including date-like strings), booleans or null. `Value` is the typed form
//! of such a scalar. `KeyValue` is its hashable twin, used wherever values are
//! grouped, deduplicated or sorted.

use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;

/// A single field value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Number(f64),
    Text(String),
    Boolean(bool),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric coercion used by aggregation and range filters.
    /// Numbers map to themselves (NaN excluded), booleans to 1/0 and text
    /// that parses as a float after trimming to that float.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) if !n.is_nan() => Some(*n),
            Value::Number(_) => None,
            Value::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return None;
                }
                trimmed.parse::<f64>().ok().filter(|n| !n.is_nan())
            }
            Value::Null => None,
        }
    }

    /// Only genuine numbers. Statistical tests and box plots ignore
    /// numeric-looking text.
    pub fn as_strict_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) if !n.is_nan() => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Renders the value as a label, the way it would appear in a string key.
    pub fn to_label(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Number(n) => format_number(*n),
            Value::Text(s) => s.clone(),
            Value::Boolean(b) => b.to_string(),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Option<f64>> for Value {
    fn from(n: Option<f64>) -> Self {
        n.map_or(Value::Null, Value::Number)
    }
}

// ============================================================================
// HASHABLE KEYS
// ============================================================================

/// Wrapper around f64 that implements Eq and Hash for use as HashMap keys.
/// NaN values are equal to each other, and -0.0 equals 0.0.
#[derive(Debug, Clone, Copy)]
pub struct OrderedFloat(pub f64);

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        if self.0.is_nan() && other.0.is_nan() {
            true
        } else {
            self.0 == other.0
        }
    }
}

impl Eq for OrderedFloat {}

impl std::hash::Hash for OrderedFloat {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        if self.0.is_nan() {
            u64::MAX.hash(state);
        } else if self.0 == 0.0 {
            0u64.hash(state);
        } else {
            self.0.to_bits().hash(state);
        }
    }
}

/// A normalized, hashable representation of a `Value`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyValue {
    Null,
    Number(OrderedFloat),
    Text(String),
    Boolean(bool),
}

impl From<&Value> for KeyValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => KeyValue::Null,
            Value::Number(n) => KeyValue::Number(OrderedFloat(*n)),
            Value::Text(s) => KeyValue::Text(s.clone()),
            Value::Boolean(b) => KeyValue::Boolean(*b),
        }
    }
}

impl KeyValue {
    pub fn to_value(&self) -> Value {
        match self {
            KeyValue::Null => Value::Null,
            KeyValue::Number(n) => Value::Number(n.0),
            KeyValue::Text(s) => Value::Text(s.clone()),
            KeyValue::Boolean(b) => Value::Boolean(*b),
        }
    }
}

/// Total order used for sorted headers: nulls, then numbers ascending, then
/// text (byte order), then booleans. Signed zeros compare equal; NaN sorts by
/// `f64::total_cmp`.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,

        (Value::Number(na), Value::Number(nb)) if na == nb => Ordering::Equal,
        (Value::Number(na), Value::Number(nb)) => na.total_cmp(nb),
        (Value::Number(_), _) => Ordering::Less,
        (_, Value::Number(_)) => Ordering::Greater,

        (Value::Text(ta), Value::Text(tb)) => ta.cmp(tb),
        (Value::Text(_), _) => Ordering::Less,
        (_, Value::Text(_)) => Ordering::Greater,

        (Value::Boolean(ba), Value::Boolean(bb)) => ba.cmp(bb),
    }
}

// ============================================================================
// NUMBER FORMATTING
// ============================================================================

/// Magnitudes at or above this render in exponent form.
const EXPONENT_ABOVE: f64 = 1e21;
/// Non-zero magnitudes below this render in exponent form.
const EXPONENT_BELOW: f64 = 1e-6;

/// Extra digits rendered to detect an exact rounding tie. A double that sits
/// exactly on a tie differs from its neighbours well within this window.
const TIE_WINDOW: usize = 25;

/// Shortest round-trip rendering: integers without a decimal point,
/// negative zero as "0", infinities as "Infinity", and exponent form
/// ("1e+21", "1e-7") outside [1e-6, 1e21).
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.abs() >= EXPONENT_ABOVE || n.abs() < EXPONENT_BELOW {
        let text = format!("{:e}", n);
        match text.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
            _ => text,
        }
    } else {
        format!("{}", n)
    }
}

/// Fixed-point rendering with `digits` decimals. Exact ties round away from
/// zero, negative values keep their sign even when they round to zero, and
/// magnitudes of 1e21 or more fall back to [`format_number`].
pub fn format_fixed(n: f64, digits: usize) -> String {
    if !n.is_finite() || n.abs() >= EXPONENT_ABOVE {
        return format_number(n);
    }
    let magnitude = n.abs();
    let wide = format!("{:.*}", digits + TIE_WINDOW, magnitude);
    let (head, tail) = wide.split_at(wide.len() - TIE_WINDOW);
    let is_tie = tail.starts_with('5') && tail[1..].bytes().all(|b| b == b'0');

    let body = if is_tie {
        round_up_last_digit(head.trim_end_matches('.'))
    } else {
        format!("{:.*}", digits, magnitude)
    };
    if n < 0.0 {
        format!("-{}", body)
    } else {
        body
    }
}

/// Adds one unit in the last place of a plain decimal string.
fn round_up_last_digit(text: &str) -> String {
    let mut digits: Vec<u8> = text.bytes().collect();
    for i in (0..digits.len()).rev() {
        match digits[i] {
            b'.' => continue,
            b'9' => digits[i] = b'0',
            d => {
                digits[i] = d + 1;
                return String::from_utf8_lossy(&digits).into_owned();
            }
        }
    }
    format!("1{}", String::from_utf8_lossy(&digits))
}

/// Deserializes an identifier that may be sent as a JSON number or string.
pub fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        other => other.to_label(),
    })
}

/// Optional variant of [`deserialize_id`]; null maps to `None`.
pub fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        other => Some(other.to_label()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerces_numeric_text_and_booleans() {
        assert_eq!(Value::from(" 42.5 ").as_number(), Some(42.5));
        assert_eq!(Value::from(true).as_number(), Some(1.0));
        assert_eq!(Value::from("").as_number(), None);
        assert_eq!(Value::from("abc").as_number(), None);
        assert_eq!(Value::Null.as_number(), None);
        assert_eq!(Value::Number(f64::NAN).as_number(), None);
    }

    #[test]
    fn strict_number_ignores_text() {
        assert_eq!(Value::from("3").as_strict_number(), None);
        assert_eq!(Value::from(3.0).as_strict_number(), Some(3.0));
    }

    #[test]
    fn deserializes_json_scalars() {
        let values: Vec<Value> = serde_json::from_str(r#"[1, 2.5, "x", true, null]"#).unwrap();
        assert_eq!(
            values,
            vec![
                Value::Number(1.0),
                Value::Number(2.5),
                Value::from("x"),
                Value::Boolean(true),
                Value::Null,
            ]
        );
    }

    #[test]
    fn non_finite_numbers_serialize_as_null() {
        let json = serde_json::to_string(&vec![Value::Number(f64::INFINITY), Value::Number(1.0)]).unwrap();
        assert_eq!(json, "[null,1.0]");
    }

    #[test]
    fn key_value_treats_signed_zero_as_equal() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(KeyValue::from(&Value::Number(0.0)));
        set.insert(KeyValue::from(&Value::Number(-0.0)));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn compare_orders_nulls_numbers_text_booleans() {
        let mut values = vec![
            Value::from("b"),
            Value::Boolean(false),
            Value::Number(10.0),
            Value::Null,
            Value::from("a"),
            Value::Number(2.0),
        ];
        values.sort_by(compare_values);
        assert_eq!(
            values,
            vec![
                Value::Null,
                Value::Number(2.0),
                Value::Number(10.0),
                Value::from("a"),
                Value::from("b"),
                Value::Boolean(false),
            ]
        );
    }

    #[test]
    fn formats_numbers_like_labels() {
        assert_eq!(format_number(20.0), "20");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(f64::INFINITY), "Infinity");
        assert_eq!(format_fixed(0.98765, 2), "0.99");
        assert_eq!(format_fixed(-0.001, 2), "-0.00");
        assert_eq!(format_fixed(-0.0, 2), "0.00");
    }

    #[test]
    fn number_labels_switch_to_exponent_form() {
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(1.5e22), "1.5e+22");
        assert_eq!(format_number(1e20), "100000000000000000000");
        assert_eq!(format_number(1e-7), "1e-7");
        assert_eq!(format_number(-2.5e-8), "-2.5e-8");
        assert_eq!(format_number(0.000001), "0.000001");
    }

    #[test]
    fn fixed_rounds_exact_ties_away_from_zero() {
        assert_eq!(format_fixed(2.5, 0), "3");
        assert_eq!(format_fixed(0.5, 0), "1");
        assert_eq!(format_fixed(1.125, 2), "1.13");
        assert_eq!(format_fixed(-1.125, 2), "-1.13");
        assert_eq!(format_fixed(9.995, 2), "9.99");
        assert_eq!(format_fixed(99.5, 0), "100");
        assert_eq!(format_fixed(0.995, 2), "0.99");
        assert_eq!(format_fixed(1e21, 2), "1e+21");
    }

    #[test]
    fn compare_is_total_with_nan_and_signed_zero() {
        assert_eq!(compare_values(&Value::Number(-0.0), &Value::Number(0.0)), Ordering::Equal);
        assert_eq!(compare_values(&Value::Number(f64::NAN), &Value::Number(1.0)), Ordering::Greater);
        let mut values = vec![Value::Number(f64::NAN), Value::Number(3.0), Value::Number(1.0)];
        values.sort_by(compare_values);
        assert_eq!(values[0], Value::Number(1.0));
        assert_eq!(values[1], Value::Number(3.0));
    }
}
