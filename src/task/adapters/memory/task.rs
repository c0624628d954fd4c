//! Thread-safe in-memory task repository.
//!
//! The adapter reproduces the two storage guarantees services rely on: a
//! non-blocking per-task completion lock (a locked-id set standing in for
//! `FOR UPDATE NOWAIT`) and integrator uniqueness per
//! `(stage, case, group)` enforced under one write lock.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::graph::domain::StageId;
use crate::task::{
    domain::{CaseId, Task, TaskId, UserId},
    ports::{CompletionGuard, TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};

#[derive(Debug, Default)]
struct InMemoryTaskState {
    tasks: Vec<Task>,
    index: HashMap<TaskId, usize>,
    locked: HashSet<TaskId>,
    integrators: HashMap<(StageId, CaseId, String), TaskId>,
}

impl InMemoryTaskState {
    fn get(&self, id: TaskId) -> Option<&Task> {
        self.index.get(&id).and_then(|at| self.tasks.get(*at))
    }

    fn get_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        let at = *self.index.get(&id)?;
        self.tasks.get_mut(at)
    }

    fn insert(&mut self, task: Task) {
        self.index.insert(task.id(), self.tasks.len());
        self.tasks.push(task);
    }

    fn filtered(&self, keep: impl Fn(&Task) -> bool) -> Vec<Task> {
        self.tasks.iter().filter(|task| keep(task)).cloned().collect()
    }
}

/// Thread-safe in-memory task repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<InMemoryTaskState>>,
}

impl InMemoryTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_poisoned(err: impl std::fmt::Display) -> TaskRepositoryError {
    TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

fn group_key(group: &Value) -> String {
    group.to_string()
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_poisoned)?;
        if state.index.contains_key(&task.id()) {
            return Err(TaskRepositoryError::DuplicateTask(task.id()));
        }
        state.insert(task.clone());
        Ok(())
    }

    async fn update(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_poisoned)?;
        let slot = state
            .get_mut(task.id())
            .ok_or(TaskRepositoryError::NotFound(task.id()))?;
        *slot = task.clone();
        Ok(())
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state.get(id).cloned())
    }

    async fn lock_for_completion(&self, id: TaskId) -> TaskRepositoryResult<CompletionGuard> {
        let mut state = self.state.write().map_err(lock_poisoned)?;
        let task = state
            .get(id)
            .cloned()
            .ok_or(TaskRepositoryError::NotFound(id))?;
        if !state.locked.insert(id) {
            return Err(TaskRepositoryError::LockContended(id));
        }
        let shared = Arc::clone(&self.state);
        let release = Box::new(move || {
            if let Ok(mut inner) = shared.write() {
                inner.locked.remove(&id);
            }
        });
        Ok(CompletionGuard::new(task, release))
    }

    async fn get_or_create_integrator(
        &self,
        candidate: Task,
    ) -> TaskRepositoryResult<(Task, bool)> {
        let mut state = self.state.write().map_err(lock_poisoned)?;
        let group = candidate
            .integrator_group()
            .cloned()
            .ok_or(TaskRepositoryError::MissingIntegratorGroup(candidate.id()))?;
        let key = (candidate.stage(), candidate.case(), group_key(&group));
        if let Some(existing_id) = state.integrators.get(&key).copied() {
            let predecessors: Vec<TaskId> = candidate.in_tasks().to_vec();
            let existing = state
                .get_mut(existing_id)
                .ok_or(TaskRepositoryError::NotFound(existing_id))?;
            for predecessor in predecessors {
                existing.add_in_task(predecessor);
            }
            let merged = existing.clone();
            return Ok((merged, false));
        }
        state.integrators.insert(key, candidate.id());
        state.insert(candidate.clone());
        Ok((candidate, true))
    }

    async fn tasks_by_case(&self, case: CaseId) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state.filtered(|task| task.case() == case))
    }

    async fn tasks_by_case_and_stage(
        &self,
        case: CaseId,
        stage: StageId,
    ) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state.filtered(|task| task.case() == case && task.stage() == stage))
    }

    async fn tasks_by_stage(&self, stage: StageId) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state.filtered(|task| task.stage() == stage))
    }

    async fn tasks_by_assignee(&self, user: UserId) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state.filtered(|task| task.assignee() == Some(user)))
    }

    async fn unassigned_tasks_at_stages(
        &self,
        stages: &[StageId],
    ) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state.filtered(|task| {
            task.assignee().is_none() && !task.is_complete() && stages.contains(&task.stage())
        }))
    }

    async fn count_for_user_at_stage(
        &self,
        user: UserId,
        stage: StageId,
        only_open: bool,
    ) -> TaskRepositoryResult<usize> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state
            .tasks
            .iter()
            .filter(|task| {
                task.assignee() == Some(user)
                    && task.stage() == stage
                    && (!only_open || !task.is_complete())
            })
            .count())
    }

    async fn completed_case_count(
        &self,
        user: UserId,
        stage: StageId,
    ) -> TaskRepositoryResult<usize> {
        let state = self.state.read().map_err(lock_poisoned)?;
        let cases: HashSet<CaseId> = state
            .tasks
            .iter()
            .filter(|task| {
                task.assignee() == Some(user)
                    && task.stage() == stage
                    && task.is_complete()
                    && !task.is_force_complete()
            })
            .map(Task::case)
            .collect();
        Ok(cases.len())
    }

    async fn completed_responses_for_case(
        &self,
        case: CaseId,
        stage: StageId,
    ) -> TaskRepositoryResult<Vec<Map<String, Value>>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state
            .tasks
            .iter()
            .filter(|task| task.case() == case && task.stage() == stage && task.is_complete())
            .map(Task::responses_or_empty)
            .collect())
    }

    async fn completed_responses_for_user(
        &self,
        user: UserId,
        stage: StageId,
    ) -> TaskRepositoryResult<Vec<Map<String, Value>>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state
            .tasks
            .iter()
            .filter(|task| {
                task.assignee() == Some(user) && task.stage() == stage && task.is_complete()
            })
            .map(Task::responses_or_empty)
            .collect())
    }
}
