//! Task aggregate root: one runtime unit of work at one stage.

use super::{CaseId, TaskDomainError, TaskId, UserId};
use crate::graph::domain::StageId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A task flowing through the stage graph.
///
/// Tasks are created by user action on a creatable stage, by routing from a
/// predecessor, by integration get-or-create, or by a cross-campaign link.
/// A task terminates when `complete` is set and no further edges are
/// traversable, or when it becomes a ping-pong target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    stage: StageId,
    case: CaseId,
    assignee: Option<UserId>,
    responses: Option<Map<String, Value>>,
    internal_metadata: Option<Map<String, Value>>,
    schema_override: Option<Value>,
    ui_schema_override: Option<Value>,
    in_tasks: Vec<TaskId>,
    complete: bool,
    force_complete: bool,
    reopened: bool,
    integrator_group: Option<Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a fresh task at a stage within a case.
    #[must_use]
    pub fn new(stage: StageId, case: CaseId, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: TaskId::new(),
            stage,
            case,
            assignee: None,
            responses: None,
            internal_metadata: None,
            schema_override: None,
            ui_schema_override: None,
            in_tasks: Vec::new(),
            complete: false,
            force_complete: false,
            reopened: false,
            integrator_group: None,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Creates an integrator candidate keyed by the projected group value.
    ///
    /// The repository's get-or-create either inserts this candidate or
    /// attaches its predecessors to the existing integrator for the same
    /// `(stage, case, group)` triple.
    #[must_use]
    pub fn new_integrator(
        stage: StageId,
        case: CaseId,
        group: Value,
        clock: &impl Clock,
    ) -> Self {
        let mut task = Self::new(stage, case, clock);
        task.integrator_group = Some(group);
        task
    }

    /// Records a predecessor on a freshly built task.
    #[must_use]
    pub fn with_in_task(mut self, predecessor: TaskId) -> Self {
        self.add_in_task(predecessor);
        self
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the stage the task sits at.
    #[must_use]
    pub const fn stage(&self) -> StageId {
        self.stage
    }

    /// Returns the owning case.
    #[must_use]
    pub const fn case(&self) -> CaseId {
        self.case
    }

    /// Returns the current assignee, if claimed.
    #[must_use]
    pub const fn assignee(&self) -> Option<UserId> {
        self.assignee
    }

    /// Returns the response map, if any responses were written.
    #[must_use]
    pub const fn responses(&self) -> Option<&Map<String, Value>> {
        self.responses.as_ref()
    }

    /// Returns the responses as an owned map, empty when unset.
    #[must_use]
    pub fn responses_or_empty(&self) -> Map<String, Value> {
        self.responses.clone().unwrap_or_default()
    }

    /// Returns the internal metadata map.
    #[must_use]
    pub const fn internal_metadata(&self) -> Option<&Map<String, Value>> {
        self.internal_metadata.as_ref()
    }

    /// Returns the per-task schema override, if set.
    #[must_use]
    pub const fn schema_override(&self) -> Option<&Value> {
        self.schema_override.as_ref()
    }

    /// Returns the per-task UI schema override, if set.
    #[must_use]
    pub const fn ui_schema_override(&self) -> Option<&Value> {
        self.ui_schema_override.as_ref()
    }

    /// Returns the predecessor task identifiers.
    #[must_use]
    pub fn in_tasks(&self) -> &[TaskId] {
        &self.in_tasks
    }

    /// Returns whether the task is complete.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.complete
    }

    /// Returns whether completion was forced (auto-complete or ping-pong),
    /// as opposed to a user submission.
    #[must_use]
    pub const fn is_force_complete(&self) -> bool {
        self.force_complete
    }

    /// Returns whether a previously complete task was sent back.
    #[must_use]
    pub const fn is_reopened(&self) -> bool {
        self.reopened
    }

    /// Returns the integrator group key for fan-in tasks.
    #[must_use]
    pub const fn integrator_group(&self) -> Option<&Value> {
        self.integrator_group.as_ref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest mutation timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Appends a predecessor, ignoring duplicates.
    pub fn add_in_task(&mut self, predecessor: TaskId) {
        if !self.in_tasks.contains(&predecessor) {
            self.in_tasks.push(predecessor);
        }
    }

    /// Claims the task for a user.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::AlreadyAssigned`] when a different user
    /// already holds the task. Re-claiming by the same user is a no-op.
    pub fn assign(&mut self, user: UserId, clock: &impl Clock) -> Result<(), TaskDomainError> {
        match self.assignee {
            Some(current) if current != user => Err(TaskDomainError::AlreadyAssigned(self.id)),
            Some(_) => Ok(()),
            None => {
                self.assignee = Some(user);
                self.touch(clock);
                Ok(())
            }
        }
    }

    /// Clears the assignee (explicit release).
    pub fn release(&mut self, clock: &impl Clock) {
        self.assignee = None;
        self.touch(clock);
    }

    /// Replaces the response map wholesale.
    pub fn set_responses(&mut self, responses: Map<String, Value>, clock: &impl Clock) {
        self.responses = Some(responses);
        self.touch(clock);
    }

    /// Overlays a partial response map, last writer wins per key.
    pub fn merge_responses(&mut self, patch: Map<String, Value>, clock: &impl Clock) {
        let target = self.responses.get_or_insert_with(Map::new);
        for (key, value) in patch {
            target.insert(key, value);
        }
        self.touch(clock);
    }

    /// Overlays a partial internal metadata map.
    pub fn merge_internal_metadata(&mut self, patch: Map<String, Value>, clock: &impl Clock) {
        let target = self.internal_metadata.get_or_insert_with(Map::new);
        for (key, value) in patch {
            target.insert(key, value);
        }
        self.touch(clock);
    }

    /// Sets the per-task schema override.
    pub fn set_schema_override(&mut self, schema: Value, clock: &impl Clock) {
        self.schema_override = Some(schema);
        self.touch(clock);
    }

    /// Sets the per-task UI schema override.
    pub fn set_ui_schema_override(&mut self, schema: Value, clock: &impl Clock) {
        self.ui_schema_override = Some(schema);
        self.touch(clock);
    }

    /// Marks the task complete as a user submission.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::AlreadyComplete`] on a repeated
    /// completion.
    pub fn complete(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        if self.complete {
            return Err(TaskDomainError::AlreadyComplete(self.id));
        }
        self.complete = true;
        self.force_complete = false;
        self.touch(clock);
        Ok(())
    }

    /// Marks the task complete with the forced marker, distinguishing
    /// auto-completion from a user submission.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::AlreadyComplete`] on a repeated
    /// completion.
    pub fn complete_forced(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        if self.complete {
            return Err(TaskDomainError::AlreadyComplete(self.id));
        }
        self.complete = true;
        self.force_complete = true;
        self.touch(clock);
        Ok(())
    }

    /// Sends a complete task back: clears `complete`, sets `reopened`,
    /// keeps the responses.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::NotComplete`] when the task was never
    /// completed.
    pub fn reopen(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        if !self.complete {
            return Err(TaskDomainError::NotComplete(self.id));
        }
        self.complete = false;
        self.force_complete = false;
        self.reopened = true;
        self.touch(clock);
        Ok(())
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
