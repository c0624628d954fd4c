//! Repository port for task persistence, lookup, and completion locking.

use crate::graph::domain::StageId;
use crate::task::domain::{CaseId, Task, TaskId, UserId};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Exclusive claim on a task row for the duration of a completion.
///
/// Completion is the only mutation that races; holders re-check the
/// `complete` flag on the snapshot before writing. The claim is released
/// on drop. A relational adapter maps acquisition to
/// `SELECT … FOR UPDATE NOWAIT` and release to transaction end.
pub struct CompletionGuard {
    task: Task,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl CompletionGuard {
    /// Wraps a locked task snapshot with its release action.
    #[must_use]
    pub fn new(task: Task, release: Box<dyn FnOnce() + Send>) -> Self {
        Self {
            task,
            release: Some(release),
        }
    }

    /// Returns the task snapshot read under the lock.
    #[must_use]
    pub const fn task(&self) -> &Task {
        &self.task
    }
}

impl std::fmt::Debug for CompletionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionGuard")
            .field("task", &self.task.id())
            .finish_non_exhaustive()
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

/// Task persistence contract.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateTask`] when the identifier
    /// already exists.
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Persists changes to an existing task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not
    /// exist.
    async fn update(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Finds a task by identifier.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Acquires the non-blocking completion lock on a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::LockContended`] when another
    /// completion holds the lock and [`TaskRepositoryError::NotFound`]
    /// when the task does not exist.
    async fn lock_for_completion(&self, id: TaskId) -> TaskRepositoryResult<CompletionGuard>;

    /// Atomically gets or creates the integrator task for the candidate's
    /// `(stage, case, integrator_group)` triple.
    ///
    /// On a hit the candidate's predecessors are appended to the existing
    /// integrator. Returns the authoritative task and whether it was
    /// created by this call. Races resolve to a single integrator with the
    /// union of predecessors.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::MissingIntegratorGroup`] when the
    /// candidate lacks a group key.
    async fn get_or_create_integrator(&self, candidate: Task)
    -> TaskRepositoryResult<(Task, bool)>;

    /// Lists the tasks of a case in creation order.
    async fn tasks_by_case(&self, case: CaseId) -> TaskRepositoryResult<Vec<Task>>;

    /// Lists the tasks of a case at one stage in creation order.
    async fn tasks_by_case_and_stage(
        &self,
        case: CaseId,
        stage: StageId,
    ) -> TaskRepositoryResult<Vec<Task>>;

    /// Lists every task at a stage in creation order.
    async fn tasks_by_stage(&self, stage: StageId) -> TaskRepositoryResult<Vec<Task>>;

    /// Lists the tasks assigned to a user in creation order.
    async fn tasks_by_assignee(&self, user: UserId) -> TaskRepositoryResult<Vec<Task>>;

    /// Lists unassigned, incomplete tasks at any of the given stages.
    async fn unassigned_tasks_at_stages(
        &self,
        stages: &[StageId],
    ) -> TaskRepositoryResult<Vec<Task>>;

    /// Counts a user's tasks at a stage; `only_open` restricts the count
    /// to incomplete tasks.
    async fn count_for_user_at_stage(
        &self,
        user: UserId,
        stage: StageId,
        only_open: bool,
    ) -> TaskRepositoryResult<usize>;

    /// Counts distinct cases in which the user completed a task at the
    /// stage without the forced marker. Feeds task-award thresholds.
    async fn completed_case_count(
        &self,
        user: UserId,
        stage: StageId,
    ) -> TaskRepositoryResult<usize>;

    /// Returns the response maps of completed tasks at a stage within a
    /// case, in creation order.
    async fn completed_responses_for_case(
        &self,
        case: CaseId,
        stage: StageId,
    ) -> TaskRepositoryResult<Vec<Map<String, Value>>>;

    /// Returns the response maps of a user's completed tasks at a stage,
    /// in creation order.
    async fn completed_responses_for_user(
        &self,
        user: UserId,
        stage: StageId,
    ) -> TaskRepositoryResult<Vec<Map<String, Value>>>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// Another completion already holds the task row lock.
    #[error("completion lock contended for task {0}")]
    LockContended(TaskId),

    /// An integrator candidate carried no group key.
    #[error("integrator candidate {0} has no group key")]
    MissingIntegratorGroup(TaskId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
