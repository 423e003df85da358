//! Scalar helpers over JSON cell values.
//!
//! Row data arrives as loosely typed JSON produced by a host UI, so comparisons,
//! stringification and numeric coercion follow browser conventions: a number is
//! read from the leading digits of a string, `null` coerces to zero, and objects
//! never coerce to a number.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Field name to value mapping for one row, in source order.
pub type Record = Map<String, Value>;

/// One data row plus the key synthesized for it at load time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub key: String,
    pub fields: Record,
}

impl Row {
    pub fn new(key: impl Into<String>, fields: Record) -> Self {
        Self {
            key: key.into(),
            fields,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Key rows of one dataset by their position.
    pub fn keyed(records: Vec<Record>) -> Vec<Row> {
        records
            .into_iter()
            .enumerate()
            .map(|(idx, fields)| Row::new(idx.to_string(), fields))
            .collect()
    }
}

/// Parse the leading floating point number of `input`, ignoring trailing text.
///
/// `"12.5px"` gives `12.5`, `"abc"` gives `None`.
pub fn parse_float_prefix(input: &str) -> Option<f64> {
    let s = input.trim_start();
    let bytes = s.as_bytes();
    let negative = bytes.first() == Some(&b'-');
    let mut end = usize::from(matches!(bytes.first(), Some(b'+') | Some(b'-')));

    if s[end..].starts_with("Infinity") {
        return Some(if negative {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut mantissa_digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let mut frac_end = end + 1;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        mantissa_digits += frac_end - (end + 1);
        if mantissa_digits > 0 {
            end = frac_end;
        }
    }
    if mantissa_digits == 0 {
        return None;
    }

    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok()
}

/// Parse the leading base-10 integer of `input`, ignoring trailing text.
pub fn parse_int_prefix(input: &str) -> Option<i64> {
    let s = input.trim_start();
    let bytes = s.as_bytes();
    let mut end = usize::from(matches!(bytes.first(), Some(b'+') | Some(b'-')));
    let digits = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits {
        return None;
    }
    s[..end].parse::<i64>().ok()
}

/// Numeric coercion. `None` stands for NaN.
pub fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null => Some(0.0),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Some(0.0);
            }
            match trimmed.trim_start_matches(['+', '-']) {
                "Infinity" => parse_float_prefix(trimmed),
                rest if rest.chars().any(|c| c.is_alphabetic() && c != 'e' && c != 'E') => None,
                _ => trimmed.parse::<f64>().ok(),
            }
        }
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Text form of a value as it would be shown in a cell.
pub fn display_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (_, Some(u), _) => u.to_string(),
            (_, _, Some(f)) => f.to_string(),
            _ => n.to_string(),
        },
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => display_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Stringified group key of an optional value; a missing field is `"undefined"`.
pub fn group_key(value: Option<&Value>) -> String {
    value
        .map(display_string)
        .unwrap_or_else(|| "undefined".to_string())
}

/// Same kind and same value; numbers compare numerically.
pub fn strict_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Null, Value::Null) => true,
        _ => false,
    }
}

pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Deserialize a number or a string into `Option<String>`.
///
/// Widths, page sizes and similar settings are typed into text boxes in the
/// host UI, so they show up as either JSON numbers or strings.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(display_string(&other)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_float_prefix() {
        assert_eq!(parse_float_prefix("12.5px"), Some(12.5));
        assert_eq!(parse_float_prefix("  -3"), Some(-3.0));
        assert_eq!(parse_float_prefix(".5"), Some(0.5));
        assert_eq!(parse_float_prefix("1e3x"), Some(1000.0));
        assert_eq!(parse_float_prefix("7e"), Some(7.0));
        assert_eq!(parse_float_prefix("Infinity"), Some(f64::INFINITY));
        assert_eq!(parse_float_prefix("abc"), None);
        assert_eq!(parse_float_prefix("."), None);
        assert_eq!(parse_float_prefix(""), None);
    }

    #[test]
    fn test_parse_int_prefix() {
        assert_eq!(parse_int_prefix("120px"), Some(120));
        assert_eq!(parse_int_prefix("-4"), Some(-4));
        assert_eq!(parse_int_prefix("3.9"), Some(3));
        assert_eq!(parse_int_prefix("wide"), None);
    }

    #[test]
    fn test_to_number() {
        assert_eq!(to_number(&json!(2)), Some(2.0));
        assert_eq!(to_number(&json!("2.5")), Some(2.5));
        assert_eq!(to_number(&json!("")), Some(0.0));
        assert_eq!(to_number(&json!(null)), Some(0.0));
        assert_eq!(to_number(&json!(true)), Some(1.0));
        assert_eq!(to_number(&json!("12px")), None);
        assert_eq!(to_number(&json!("inf")), None);
        assert_eq!(to_number(&json!({"a": 1})), None);
    }

    #[test]
    fn test_display_string() {
        assert_eq!(display_string(&json!(2.0)), "2");
        assert_eq!(display_string(&json!(2.5)), "2.5");
        assert_eq!(display_string(&json!("x")), "x");
        assert_eq!(display_string(&json!([1, null, "b"])), "1,,b");
        assert_eq!(group_key(None), "undefined");
        assert_eq!(group_key(Some(&json!(null))), "null");
    }

    #[test]
    fn test_is_truthy() {
        assert!(!is_truthy(None));
        assert!(!is_truthy(Some(&json!(0))));
        assert!(!is_truthy(Some(&json!(""))));
        assert!(is_truthy(Some(&json!("0"))));
        assert!(is_truthy(Some(&json!([]))));
    }
}
