//! Application of copy-field rules to freshly routed tasks.

use crate::pipeline::domain::{CopyField, SourceScope};
use crate::task::{
    domain::{CaseId, UserId},
    ports::{TaskRepository, TaskRepositoryError},
};
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

/// Service-level errors for field copying.
#[derive(Debug, Error)]
pub enum FieldCopyError {
    /// Task repository operation failed.
    #[error(transparent)]
    Task(#[from] TaskRepositoryError),
}

/// Result type for field copying.
pub type FieldCopyResult<T> = Result<T, FieldCopyError>;

/// Resolves copy-field rules into a response overlay for a new task.
#[derive(Clone)]
pub struct FieldCopier<T>
where
    T: TaskRepository,
{
    tasks: Arc<T>,
}

impl<T> FieldCopier<T>
where
    T: TaskRepository,
{
    /// Creates a field copier.
    #[must_use]
    pub const fn new(tasks: Arc<T>) -> Self {
        Self { tasks }
    }

    /// Builds the merged overlay of all rules against the latest
    /// completed source task in each rule's scope.
    ///
    /// Rules whose scope cannot be resolved (user scope without a user,
    /// or no completed source task) contribute nothing. Later rules
    /// win on destination-field collisions.
    ///
    /// # Errors
    ///
    /// Returns [`FieldCopyError::Task`] when a repository lookup fails.
    pub async fn overlay(
        &self,
        rules: &[CopyField],
        case: CaseId,
        user: Option<UserId>,
    ) -> FieldCopyResult<Map<String, Value>> {
        let mut overlay = Map::new();
        for rule in rules {
            let rows = match rule.scope {
                SourceScope::Case => {
                    self.tasks
                        .completed_responses_for_case(case, rule.source_stage)
                        .await?
                }
                SourceScope::User => {
                    let Some(owner) = user else {
                        continue;
                    };
                    self.tasks
                        .completed_responses_for_user(owner, rule.source_stage)
                        .await?
                }
            };
            let Some(source) = rows.last() else {
                continue;
            };
            for (field, value) in rule.project(source) {
                overlay.insert(field, value);
            }
        }
        Ok(overlay)
    }
}
