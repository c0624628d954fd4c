//! Fan-in grouping of predecessor tasks.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Groups inbound tasks by a projection of their response fields.
///
/// Tasks whose projections agree share a single integrator task per
/// case at the stage carrying the rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Integration {
    /// Response fields projected into the group key, in declaration
    /// order.
    pub group_by_fields: Vec<String>,
}

impl Integration {
    /// Creates a grouping rule over the given fields.
    pub fn new<I, S>(group_by_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            group_by_fields: group_by_fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Projects a response map into the integrator group key.
    ///
    /// Absent fields project to `null`, so two tasks missing the same
    /// field still land in the same group.
    #[must_use]
    pub fn group_key(&self, responses: &Map<String, Value>) -> Value {
        let mut key = Map::new();
        for field in &self.group_by_fields {
            let value = responses.get(field).cloned().unwrap_or(Value::Null);
            key.insert(field.clone(), value);
        }
        Value::Object(key)
    }
}
