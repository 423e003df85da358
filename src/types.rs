//! Field type inference.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::value::parse_float_prefix;

/// Semantic type of a field, used to pick a comparator and a cell formatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Date,
    Boolean,
    Object,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::Boolean => "boolean",
            FieldType::Object => "object",
        }
    }

    /// Map a declared schema tag to a type. Unknown tags are treated as strings.
    pub fn from_declared(tag: &str) -> FieldType {
        match tag.trim().to_lowercase().as_str() {
            "number" | "integer" | "int" | "float" | "double" | "decimal" => FieldType::Number,
            "date" | "datetime" | "timestamp" => FieldType::Date,
            "boolean" | "bool" => FieldType::Boolean,
            "object" => FieldType::Object,
            _ => FieldType::String,
        }
    }

    /// Dynamic type of a JSON value.
    pub fn of_value(value: &Value) -> FieldType {
        match value {
            Value::String(_) => FieldType::String,
            Value::Number(_) => FieldType::Number,
            Value::Bool(_) => FieldType::Boolean,
            Value::Null | Value::Array(_) | Value::Object(_) => FieldType::Object,
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared schema entry supplied by the host (`datasource`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub declared_type: String,
}

impl FieldSchema {
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
        }
    }
}

/// Guess the type of `field`.
///
/// A declared schema entry always wins. Otherwise a sample whose leading text
/// parses as a float is a number, and anything else keeps its JSON type.
/// Without a sample the field is a string.
pub fn infer_type(field: &str, sample: Option<&Value>, schema: &[FieldSchema]) -> FieldType {
    if let Some(entry) = schema.iter().find(|entry| entry.name == field) {
        return FieldType::from_declared(&entry.declared_type);
    }

    let Some(sample) = sample else {
        return FieldType::String;
    };

    let parses = match sample {
        Value::Number(_) => true,
        Value::String(s) => parse_float_prefix(s).is_some(),
        // Arrays stringify to their joined elements, so `[3]` reads as 3.
        Value::Array(items) => items
            .first()
            .and_then(Value::as_f64)
            .or_else(|| items.first().and_then(Value::as_str).and_then(parse_float_prefix))
            .is_some(),
        Value::Bool(_) | Value::Null | Value::Object(_) => false,
    };

    if parses {
        FieldType::Number
    } else {
        FieldType::of_value(sample)
    }
}
