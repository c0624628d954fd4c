//! Port contracts for the task context.

mod repository;

pub use repository::{
    CompletionGuard, TaskRepository, TaskRepositoryError, TaskRepositoryResult,
};
