//! Schema projection through dynamic-json rules.

use crate::graph::domain::StageId;
use crate::pipeline::domain::{DynamicJson, SourceScope};
use crate::task::{
    domain::{CaseId, UserId},
    ports::{TaskRepository, TaskRepositoryError},
};
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

/// Service-level errors for schema projection.
#[derive(Debug, Error)]
pub enum SchemaProjectionError {
    /// Task repository operation failed.
    #[error(transparent)]
    Task(#[from] TaskRepositoryError),
}

/// Result type for schema projection.
pub type SchemaProjectionResult<T> = Result<T, SchemaProjectionError>;

/// Applies a stage's dynamic-json rules to its JSON schema.
#[derive(Clone)]
pub struct SchemaProjector<T>
where
    T: TaskRepository,
{
    tasks: Arc<T>,
}

impl<T> SchemaProjector<T>
where
    T: TaskRepository,
{
    /// Creates a schema projector.
    #[must_use]
    pub const fn new(tasks: Arc<T>) -> Self {
        Self { tasks }
    }

    /// Returns the stage schema reshaped by its rules, in declaration
    /// order.
    ///
    /// `stage` is the stage carrying the rules; it doubles as the
    /// source for rules without an explicit source stage. Rules whose
    /// scope cannot be resolved are applied with no source rows.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaProjectionError::Task`] when a repository lookup
    /// fails.
    pub async fn project(
        &self,
        schema: &Value,
        rules: &[DynamicJson],
        stage: StageId,
        case: Option<CaseId>,
        user: Option<UserId>,
        current: Option<&Map<String, Value>>,
    ) -> SchemaProjectionResult<Value> {
        let mut projected = schema.clone();
        for rule in rules {
            let source_stage = rule.source_stage.unwrap_or(stage);
            let rows = match rule.scope {
                SourceScope::Case => match case {
                    Some(case_id) => {
                        self.tasks
                            .completed_responses_for_case(case_id, source_stage)
                            .await?
                    }
                    None => Vec::new(),
                },
                SourceScope::User => match user {
                    Some(owner) => {
                        self.tasks
                            .completed_responses_for_user(owner, source_stage)
                            .await?
                    }
                    None => Vec::new(),
                },
            };
            rule.reshape(&mut projected, &rows, current);
        }
        Ok(projected)
    }
}
