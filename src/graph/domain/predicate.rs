//! Typed predicate clauses for conditional stages.
//!
//! A conditional stage carries an ordered list of clauses combined by
//! logical AND. Each clause names a response field, a declared type, a
//! comparison operator, and an expected value. String responses are coerced
//! to the declared type before comparison so that form inputs such as
//! `"42"` compare numerically against a declared `integer` field.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Declared type of a predicate field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Boolean comparison; string responses `"true"`/`"false"` coerce.
    Boolean,
    /// Floating point comparison.
    Number,
    /// Integer comparison.
    Integer,
    /// Plain string comparison.
    String,
}

/// Comparison operator applied between the response field and the clause
/// value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionOp {
    /// Equality.
    #[serde(rename = "==")]
    Eq,
    /// Inequality.
    #[serde(rename = "!=")]
    Ne,
    /// Strictly greater.
    #[serde(rename = ">")]
    Gt,
    /// Strictly smaller.
    #[serde(rename = "<")]
    Lt,
    /// Greater or equal.
    #[serde(rename = ">=")]
    Ge,
    /// Smaller or equal.
    #[serde(rename = "<=")]
    Le,
    /// Membership, or substring when both sides are strings.
    #[serde(rename = "in")]
    In,
    /// Negated membership / substring.
    #[serde(rename = "nin")]
    Nin,
}

/// A single comparison clause of a conditional stage predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredicateClause {
    /// Response field the clause inspects.
    pub field: String,
    /// Declared type used for coercion before comparison.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Expected value (or collection for membership operators).
    pub value: Value,
    /// Comparison operator.
    pub condition: ConditionOp,
}

impl PredicateClause {
    /// Creates a clause.
    #[must_use]
    pub fn new(
        field: impl Into<String>,
        field_type: FieldType,
        value: Value,
        condition: ConditionOp,
    ) -> Self {
        Self {
            field: field.into(),
            field_type,
            value,
            condition,
        }
    }

    /// Evaluates the clause against a response map.
    ///
    /// A missing field never satisfies a clause.
    #[must_use]
    pub fn evaluate(&self, responses: &Map<String, Value>) -> bool {
        let Some(actual) = responses.get(&self.field) else {
            return false;
        };
        let actual = coerce(actual, self.field_type);
        match self.condition {
            ConditionOp::Eq => compare(&actual, &self.value) == Some(Ordering::Equal),
            ConditionOp::Ne => {
                compare(&actual, &self.value).is_none_or(|ord| ord != Ordering::Equal)
            }
            ConditionOp::Gt => compare(&actual, &self.value) == Some(Ordering::Greater),
            ConditionOp::Lt => compare(&actual, &self.value) == Some(Ordering::Less),
            ConditionOp::Ge => matches!(
                compare(&actual, &self.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            ConditionOp::Le => matches!(
                compare(&actual, &self.value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            ConditionOp::In => contains(&self.value, &actual),
            ConditionOp::Nin => !contains(&self.value, &actual),
        }
    }
}

/// Evaluates an AND-combined clause list.
///
/// An empty list passes unconditionally.
#[must_use]
pub fn evaluate_all(clauses: &[PredicateClause], responses: &Map<String, Value>) -> bool {
    clauses.iter().all(|clause| clause.evaluate(responses))
}

/// Coerces a response value to the declared clause type.
///
/// Only string responses are coerced; values already of the right JSON
/// type pass through, and unparseable strings stay strings so that the
/// comparison falls back to incomparable.
fn coerce(value: &Value, field_type: FieldType) -> Value {
    let Value::String(text) = value else {
        return value.clone();
    };
    match field_type {
        FieldType::Boolean => match text.trim() {
            "true" | "True" => Value::Bool(true),
            "false" | "False" => Value::Bool(false),
            _ => value.clone(),
        },
        FieldType::Integer => text
            .trim()
            .parse::<i64>()
            .map_or_else(|_| value.clone(), |parsed| Value::from(parsed)),
        FieldType::Number => text
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(|parsed| serde_json::Number::from_f64(parsed).map(Value::Number))
            .unwrap_or_else(|| value.clone()),
        FieldType::String => value.clone(),
    }
}

/// Total-order comparison between two JSON scalars of compatible types.
///
/// Returns `None` for incomparable or non-scalar values.
fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Number(a), Value::Number(b)) => {
            let a = a.as_f64()?;
            let b = b.as_f64()?;
            a.partial_cmp(&b)
        }
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

/// Membership test for `in`/`nin`.
///
/// When both sides are strings the clause value is treated as the haystack
/// and the response as a substring needle; otherwise the clause value must
/// be an array and membership is tested element-wise.
fn contains(haystack: &Value, needle: &Value) -> bool {
    match (haystack, needle) {
        (Value::String(text), Value::String(part)) => text.contains(part.as_str()),
        (Value::Array(items), _) => items
            .iter()
            .any(|item| compare(needle, item) == Some(Ordering::Equal)),
        _ => false,
    }
}
