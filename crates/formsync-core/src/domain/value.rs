//! Answer value representation
//!
//! Answers are dynamically typed on the wire: a field may hold a scalar,
//! an array, or a nested object, and different snapshots may disagree about
//! which. Modeling this as a tagged union keeps structure-mismatch detection
//! and composite merge logic exhaustive pattern matches instead of runtime
//! type checks.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single answer value: any JSON-like scalar, list, or object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    /// Explicit null (distinct from an absent key, which means "no opinion")
    Null,
    /// Boolean answer (checkboxes, toggles)
    Bool(bool),
    /// Numeric answer (sliders, counts, ratings)
    ///
    /// Carried as `f64`: JSON integers canonicalize to their float form on
    /// conversion, so `34` and `34.0` from different sessions compare
    /// equal instead of raising a spurious conflict.
    Number(f64),
    /// Free-text answer
    Text(String),
    /// Multi-select / repeated answers
    List(Vec<AnswerValue>),
    /// Nested object answer (composite widgets)
    Map(BTreeMap<String, AnswerValue>),
}

/// The runtime shape of a value, used for structure-mismatch classification
///
/// `Null` counts as a scalar: a null answer disagreeing with a string answer
/// is a value conflict, not a structure conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueShape {
    /// Null, boolean, number, or text
    Scalar,
    /// Array of values
    List,
    /// Object map of values
    Map,
}

impl std::fmt::Display for ValueShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ValueShape::Scalar => "scalar",
            ValueShape::List => "list",
            ValueShape::Map => "map",
        };
        write!(f, "{}", s)
    }
}

impl AnswerValue {
    /// Returns the runtime shape of this value
    #[must_use]
    pub fn shape(&self) -> ValueShape {
        match self {
            AnswerValue::Null
            | AnswerValue::Bool(_)
            | AnswerValue::Number(_)
            | AnswerValue::Text(_) => ValueShape::Scalar,
            AnswerValue::List(_) => ValueShape::List,
            AnswerValue::Map(_) => ValueShape::Map,
        }
    }

    /// Returns true if this is the explicit null value
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, AnswerValue::Null)
    }

    /// Returns the inner list if this value is a list
    #[must_use]
    pub fn as_list(&self) -> Option<&[AnswerValue]> {
        match self {
            AnswerValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the inner map if this value is a map
    #[must_use]
    pub fn as_map(&self) -> Option<&BTreeMap<String, AnswerValue>> {
        match self {
            AnswerValue::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Returns the inner text if this value is text
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnswerValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for AnswerValue {
    fn from(v: bool) -> Self {
        AnswerValue::Bool(v)
    }
}

impl From<f64> for AnswerValue {
    fn from(v: f64) -> Self {
        AnswerValue::Number(v)
    }
}

impl From<i64> for AnswerValue {
    fn from(v: i64) -> Self {
        AnswerValue::Number(v as f64)
    }
}

impl From<&str> for AnswerValue {
    fn from(v: &str) -> Self {
        AnswerValue::Text(v.to_string())
    }
}

impl From<String> for AnswerValue {
    fn from(v: String) -> Self {
        AnswerValue::Text(v)
    }
}

impl From<Vec<AnswerValue>> for AnswerValue {
    fn from(v: Vec<AnswerValue>) -> Self {
        AnswerValue::List(v)
    }
}

impl From<serde_json::Value> for AnswerValue {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => AnswerValue::Null,
            serde_json::Value::Bool(b) => AnswerValue::Bool(b),
            serde_json::Value::Number(n) => AnswerValue::Number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => AnswerValue::Text(s),
            serde_json::Value::Array(items) => {
                AnswerValue::List(items.into_iter().map(AnswerValue::from).collect())
            }
            serde_json::Value::Object(entries) => AnswerValue::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, AnswerValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<AnswerValue> for serde_json::Value {
    fn from(v: AnswerValue) -> Self {
        match v {
            AnswerValue::Null => serde_json::Value::Null,
            AnswerValue::Bool(b) => serde_json::Value::Bool(b),
            AnswerValue::Number(n) => serde_json::Number::from_f64(n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            AnswerValue::Text(s) => serde_json::Value::String(s),
            AnswerValue::List(items) => {
                serde_json::Value::Array(items.into_iter().map(serde_json::Value::from).collect())
            }
            AnswerValue::Map(entries) => serde_json::Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}
