//! Error types for task domain mutations.

use super::TaskId;
use thiserror::Error;

/// Errors returned while mutating task aggregates.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task is already marked complete.
    #[error("task {0} is already complete")]
    AlreadyComplete(TaskId),

    /// The task is not complete, so the attempted transition is invalid.
    #[error("task {0} is not complete")]
    NotComplete(TaskId),

    /// The task is already claimed by a different user.
    #[error("task {0} is already assigned")]
    AlreadyAssigned(TaskId),
}
