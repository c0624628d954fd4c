//! Field-level copies from earlier tasks onto freshly routed ones.

use crate::graph::domain::StageId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Which completed source tasks a pipeline rule reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceScope {
    /// Completed tasks within the same case.
    #[default]
    Case,
    /// Completed tasks by the same user, across cases.
    User,
}

/// Copies named response fields from the latest completed task at a
/// source stage onto a new task.
///
/// Each pair is written `"src->dst"`; malformed entries are skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyField {
    /// Stage whose completed tasks supply the values.
    pub source_stage: StageId,
    /// Ordered `"src->dst"` field pairs.
    pub field_pairs: Vec<String>,
    /// Scope the source task is picked from.
    pub scope: SourceScope,
}

impl CopyField {
    /// Creates a case-scoped copy rule.
    pub fn new<I, S>(source_stage: StageId, field_pairs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            source_stage,
            field_pairs: field_pairs.into_iter().map(Into::into).collect(),
            scope: SourceScope::Case,
        }
    }

    /// Sets the source scope.
    #[must_use]
    pub const fn with_scope(mut self, scope: SourceScope) -> Self {
        self.scope = scope;
        self
    }

    /// Iterates the well-formed `(src, dst)` pairs in declaration order.
    #[must_use]
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.field_pairs.iter().filter_map(|pair| {
            let (src, dst) = pair.split_once("->")?;
            match (src.trim(), dst.trim()) {
                ("", _) | (_, "") => None,
                trimmed => Some(trimmed),
            }
        })
    }

    /// Projects the rule's pairs out of a source response map.
    ///
    /// Source fields absent from the map are skipped.
    #[must_use]
    pub fn project(&self, source: &Map<String, Value>) -> Map<String, Value> {
        let mut out = Map::new();
        for (src, dst) in self.pairs() {
            if let Some(value) = source.get(src) {
                out.insert(dst.to_owned(), value.clone());
            }
        }
        out
    }
}
