//! Coercion helpers for loosely-typed source records.
//!
//! Connectors deliver POIs in whatever shape their medium dictates: flat
//! key/value rows from relational storage, nested nodes from markup files.
//! Both normalise to a [`Record`] at the connector boundary, so one set of
//! per-field parsing rules applies to every source. Text is decoded to
//! UTF-8 exactly once, where the connector reads raw bytes; a [`Record`]
//! only ever holds decoded strings.
//!
//! Present-but-unconvertible values fail fast with a [`RecordError`];
//! absent values take the defaults documented on each entity field.

use serde_json::{Map, Value};
use thiserror::Error;

/// A loosely-typed keyed record as delivered by a storage connector.
pub type Record = Map<String, Value>;

/// Errors raised while mapping a raw record onto a typed entity.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    /// The `dimension` discriminant named no known variant.
    #[error("invalid dimension: {value}")]
    InvalidDimension {
        /// The unrecognised discriminant value.
        value: i64,
    },
    /// A present field could not be converted to its target type.
    #[error("field {field} expects {expected}, found {found}")]
    InvalidField {
        /// Name of the offending field.
        field: &'static str,
        /// Human-readable target type.
        expected: &'static str,
        /// The raw value that failed to convert.
        found: String,
    },
}

fn invalid(field: &'static str, expected: &'static str, value: &Value) -> RecordError {
    RecordError::InvalidField {
        field,
        expected,
        found: value.to_string(),
    }
}

/// Read a field as text. Numbers and booleans stringify; absent and null
/// values yield `None`.
pub fn text(record: &Record, field: &'static str) -> Result<Option<String>, RecordError> {
    match record.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(invalid(field, "text", other)),
    }
}

/// Read a field as text, substituting `default` when absent.
pub fn text_or(record: &Record, field: &'static str, default: &str) -> Result<String, RecordError> {
    Ok(text(record, field)?.unwrap_or_else(|| default.to_owned()))
}

/// Read a field as an integer. Floats truncate toward zero; numeric
/// strings parse; the empty string counts as absent.
pub fn integer(record: &Record, field: &'static str) -> Result<Option<i64>, RecordError> {
    match record.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(i64::from(*b))),
        Some(value @ Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .map(Some)
            .ok_or_else(|| invalid(field, "integer", value)),
        Some(value @ Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().map(|f| f as i64))
                .map(Some)
                .ok_or_else(|| invalid(field, "integer", value))
        }
        Some(other) => Err(invalid(field, "integer", other)),
    }
}

/// Read a field as a float. Numeric strings parse; the empty string counts
/// as absent.
pub fn float(record: &Record, field: &'static str) -> Result<Option<f64>, RecordError> {
    match record.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value @ Value::Number(n)) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| invalid(field, "float", value)),
        Some(value @ Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<f64>()
                .ok()
                .map(Some)
                .ok_or_else(|| invalid(field, "float", value))
        }
        Some(other) => Err(invalid(field, "float", other)),
    }
}

/// Read a field as a boolean, derived from a second parse of the
/// stringified value: the empty string and `"0"` are false; any other
/// non-empty representation is true, the word `"false"` included. Native
/// booleans and integers pass through (`!= 0`).
pub fn boolean(record: &Record, field: &'static str) -> Result<Option<bool>, RecordError> {
    match record.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(value @ Value::Number(n)) => n
            .as_f64()
            .map(|f| Some(f != 0.0))
            .ok_or_else(|| invalid(field, "boolean", value)),
        Some(Value::String(s)) => Ok(Some(!(s.is_empty() || s == "0"))),
        Some(other) => Err(invalid(field, "boolean", other)),
    }
}

/// Read a parameter-like field as an ordered list of strings. A
/// comma-separated string splits on commas; an empty string yields the
/// empty list; a native array passes through element-wise.
pub fn list(record: &Record, field: &'static str) -> Result<Vec<String>, RecordError> {
    match record.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(s)) => {
            if s.is_empty() {
                Ok(Vec::new())
            } else {
                Ok(s.split(',').map(str::to_owned).collect())
            }
        }
        Some(value @ Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                Value::Number(n) => Ok(n.to_string()),
                _ => Err(invalid(field, "list of text items", value)),
            })
            .collect(),
        Some(other) => Err(invalid(field, "comma-separated list", other)),
    }
}

/// Borrow a nested sub-record, if present and non-null.
pub fn entry<'a>(record: &'a Record, field: &'static str) -> Result<Option<&'a Record>, RecordError> {
    match record.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(nested)) => Ok(Some(nested)),
        Some(other) => Err(invalid(field, "nested record", other)),
    }
}

/// Borrow a list of nested sub-records, if present.
pub fn entries<'a>(
    record: &'a Record,
    field: &'static str,
) -> Result<Vec<&'a Record>, RecordError> {
    match record.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value @ Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::Object(nested) => Ok(nested),
                _ => Err(invalid(field, "list of records", value)),
            })
            .collect(),
        Some(other) => Err(invalid(field, "list of records", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap_or_default()
    }

    #[rstest]
    #[case(json!({"f": "hello"}), Some("hello"))]
    #[case(json!({"f": 7}), Some("7"))]
    #[case(json!({"f": true}), Some("true"))]
    #[case(json!({"f": null}), None)]
    #[case(json!({}), None)]
    fn text_coerces_scalars(#[case] source: Value, #[case] expected: Option<&str>) {
        let record = record(source);
        assert_eq!(text(&record, "f").expect("text coerces").as_deref(), expected);
    }

    #[rstest]
    #[case(json!({"f": 42}), Some(42))]
    #[case(json!({"f": "42"}), Some(42))]
    #[case(json!({"f": 3.9}), Some(3))]
    #[case(json!({"f": "3.9"}), Some(3))]
    #[case(json!({"f": ""}), None)]
    #[case(json!({}), None)]
    fn integer_coerces_and_truncates(#[case] source: Value, #[case] expected: Option<i64>) {
        let record = record(source);
        assert_eq!(integer(&record, "f").expect("integer coerces"), expected);
    }

    #[rstest]
    fn integer_rejects_garbage() {
        let record = record(json!({"f": "not a number"}));
        let error = integer(&record, "f").expect_err("garbage must fail");
        assert!(matches!(error, RecordError::InvalidField { field: "f", .. }));
    }

    #[rstest]
    #[case(json!({"f": true}), Some(true))]
    #[case(json!({"f": 1}), Some(true))]
    #[case(json!({"f": 0}), Some(false))]
    #[case(json!({"f": "yes"}), Some(true))]
    #[case(json!({"f": ""}), Some(false))]
    #[case(json!({"f": "0"}), Some(false))]
    #[case(json!({"f": "false"}), Some(true))]
    #[case(json!({}), None)]
    fn boolean_follows_stringified_value_rule(#[case] source: Value, #[case] expected: Option<bool>) {
        let record = record(source);
        assert_eq!(boolean(&record, "f").expect("boolean coerces"), expected);
    }

    #[rstest]
    #[case(json!({"f": "a,b,c"}), vec!["a", "b", "c"])]
    #[case(json!({"f": ""}), Vec::<&str>::new())]
    #[case(json!({"f": ["x", "y"]}), vec!["x", "y"])]
    #[case(json!({}), Vec::<&str>::new())]
    fn list_splits_on_commas(#[case] source: Value, #[case] expected: Vec<&str>) {
        let record = record(source);
        assert_eq!(list(&record, "f").expect("list coerces"), expected);
    }

    #[rstest]
    fn entry_rejects_scalar() {
        let record = record(json!({"f": "flat"}));
        assert!(entry(&record, "f").is_err());
    }
}
