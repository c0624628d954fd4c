//! Schema enum reshaping from completed responses.

use super::SourceScope;
use crate::graph::domain::StageId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Filters or populates enum options of one schema field from the
/// completed responses of a source stage.
///
/// In filtering mode, a `main` value seen at least `count` times is
/// removed from the target enum; `count` zero disables the cap. With
/// `obtain_options_from_stage`, the enum is instead populated from the
/// distinct `main` values seen at the source, in first-seen order.
/// Foreign fields drop only the values that co-occur with the main
/// value chosen in the current responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicJson {
    /// Source stage; `None` reads the rule's own stage.
    pub source_stage: Option<StageId>,
    /// Schema field whose enum is reshaped.
    pub main: String,
    /// Dependent fields filtered by co-occurrence with `main`.
    pub foreign: Vec<String>,
    /// Occurrences of a `main` value that exhaust it; zero disables.
    pub count: u32,
    /// Populate the enum from the source instead of filtering it.
    pub obtain_options_from_stage: bool,
    /// Scope the source tasks are drawn from.
    pub scope: SourceScope,
}

impl DynamicJson {
    /// Creates a case-scoped filtering rule.
    pub fn new(main: impl Into<String>, count: u32) -> Self {
        Self {
            source_stage: None,
            main: main.into(),
            foreign: Vec::new(),
            count,
            obtain_options_from_stage: false,
            scope: SourceScope::Case,
        }
    }

    /// Reads source tasks from another stage.
    #[must_use]
    pub const fn with_source_stage(mut self, stage: StageId) -> Self {
        self.source_stage = Some(stage);
        self
    }

    /// Declares co-occurrence-filtered dependent fields.
    #[must_use]
    pub fn with_foreign<I, S>(mut self, foreign: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.foreign = foreign.into_iter().map(Into::into).collect();
        self
    }

    /// Switches the rule to population mode.
    #[must_use]
    pub const fn obtaining_options(mut self) -> Self {
        self.obtain_options_from_stage = true;
        self
    }

    /// Sets the source scope.
    #[must_use]
    pub const fn with_scope(mut self, scope: SourceScope) -> Self {
        self.scope = scope;
        self
    }

    /// Reshapes a schema in place against the source response rows.
    ///
    /// `current` carries the responses entered so far; it drives the
    /// foreign-field co-occurrence filter. Enum arrays keep their
    /// declaration order; values are only removed or, in population
    /// mode, replaced wholesale.
    pub fn reshape(
        &self,
        schema: &mut Value,
        source_rows: &[Map<String, Value>],
        current: Option<&Map<String, Value>>,
    ) {
        if self.obtain_options_from_stage {
            self.populate_main(schema, source_rows);
        } else {
            self.filter_main(schema, source_rows);
        }
        let Some(chosen) = current.and_then(|map| map.get(&self.main)) else {
            return;
        };
        for field in &self.foreign {
            let taken: Vec<&Value> = source_rows
                .iter()
                .filter(|row| row.get(&self.main) == Some(chosen))
                .filter_map(|row| row.get(field))
                .collect();
            if let Some(options) = enum_options(schema, field) {
                options.retain(|value| !taken.contains(&value));
            }
        }
    }

    fn populate_main(&self, schema: &mut Value, source_rows: &[Map<String, Value>]) {
        let mut seen: Vec<Value> = Vec::new();
        for row in source_rows {
            if let Some(value) = row.get(&self.main)
                && !seen.contains(value)
            {
                seen.push(value.clone());
            }
        }
        if let Some(property) = schema
            .get_mut("properties")
            .and_then(|props| props.get_mut(&self.main))
            .and_then(Value::as_object_mut)
        {
            property.insert("enum".to_owned(), Value::Array(seen));
        }
    }

    fn filter_main(&self, schema: &mut Value, source_rows: &[Map<String, Value>]) {
        if self.count == 0 {
            return;
        }
        let threshold = usize::try_from(self.count).unwrap_or(usize::MAX);
        let Some(options) = enum_options(schema, &self.main) else {
            return;
        };
        options.retain(|option| {
            let uses = source_rows
                .iter()
                .filter(|row| row.get(&self.main) == Some(option))
                .count();
            uses < threshold
        });
    }
}

/// Locates the mutable enum array of one schema property.
fn enum_options<'a>(schema: &'a mut Value, field: &str) -> Option<&'a mut Vec<Value>> {
    schema
        .get_mut("properties")?
        .get_mut(field)?
        .get_mut("enum")?
        .as_array_mut()
}
