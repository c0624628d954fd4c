//! Resolution of the assignee for a freshly routed task.

use crate::graph::domain::{AssignPolicy, StageId, TaskStageConfig, Track};
use crate::graph::ports::GraphRepository;
use crate::rank::ports::{RankRepository, UserDirectory};
use crate::routing::error::{AssignmentFailure, EngineError, EngineResult};
use crate::task::{
    domain::{Task, UserId},
    ports::TaskRepository,
};
use mockable::Clock;
use serde_json::Value;
use std::sync::Arc;

/// How assignment resolved for a new task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentOutcome {
    /// Left unassigned; rank-based selection claims it later.
    Unassigned,
    /// Left unassigned; the router completes the task immediately.
    AutoComplete,
    /// Claimed for the resolved user.
    Assigned(UserId),
}

/// Applies a stage's assignment policy to a freshly routed task.
#[derive(Clone)]
pub struct AssignmentEngine<T, R, U, G, C>
where
    T: TaskRepository,
    R: RankRepository,
    U: UserDirectory,
    G: GraphRepository,
    C: Clock + Send + Sync,
{
    tasks: Arc<T>,
    ranks: Arc<R>,
    users: Arc<U>,
    graph: Arc<G>,
    clock: Arc<C>,
}

impl<T, R, U, G, C> AssignmentEngine<T, R, U, G, C>
where
    T: TaskRepository,
    R: RankRepository,
    U: UserDirectory,
    G: GraphRepository,
    C: Clock + Send + Sync,
{
    /// Creates an assignment engine.
    #[must_use]
    pub const fn new(
        tasks: Arc<T>,
        ranks: Arc<R>,
        users: Arc<U>,
        graph: Arc<G>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            tasks,
            ranks,
            users,
            graph,
            clock,
        }
    }

    /// Resolves and applies the assignment policy of a stage.
    ///
    /// A fast-track rank held by the triggering user takes precedence
    /// over the configured policy.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Assignment`] when the policy names a user
    /// that cannot be resolved and [`EngineError::DependencyMissing`]
    /// when the policy's configuration is incomplete.
    pub async fn assign(
        &self,
        config: &TaskStageConfig,
        task: &mut Task,
        trigger: Option<&Task>,
    ) -> EngineResult<AssignmentOutcome> {
        if let Some(fast_track) = config.fast_track_rank
            && let Some(user) = trigger.and_then(Task::assignee)
            && self.ranks.has_rank(user, fast_track).await?
        {
            task.assign(user, &*self.clock)?;
            return Ok(AssignmentOutcome::Assigned(user));
        }
        match config.assign_user_by {
            AssignPolicy::Rank => Ok(AssignmentOutcome::Unassigned),
            AssignPolicy::AutoComplete => Ok(AssignmentOutcome::AutoComplete),
            AssignPolicy::Stage => self.from_stage(config, task).await,
            AssignPolicy::PreviousManual => self.from_manual(config, task).await,
        }
    }

    async fn from_stage(
        &self,
        config: &TaskStageConfig,
        task: &mut Task,
    ) -> EngineResult<AssignmentOutcome> {
        let Some(source) = config.assign_user_from_stage else {
            return Err(EngineError::DependencyMissing(
                "STAGE assignment without a source stage".to_owned(),
            ));
        };
        let rows = self.tasks.tasks_by_case_and_stage(task.case(), source).await?;
        let Some(user) = rows
            .iter()
            .rev()
            .find(|row| row.is_complete())
            .and_then(Task::assignee)
        else {
            return Err(AssignmentFailure::NoSourceTask(source).into());
        };
        task.assign(user, &*self.clock)?;
        Ok(AssignmentOutcome::Assigned(user))
    }

    async fn from_manual(
        &self,
        config: &TaskStageConfig,
        task: &mut Task,
    ) -> EngineResult<AssignmentOutcome> {
        let Some(manual) = &config.previous_manual else {
            return Err(EngineError::DependencyMissing(
                "PREVIOUS_MANUAL assignment without a source field".to_owned(),
            ));
        };
        let rows = self
            .tasks
            .tasks_by_case_and_stage(task.case(), manual.source_stage)
            .await?;
        let Some(source) = rows.iter().rev().find(|row| row.is_complete()) else {
            return Err(AssignmentFailure::NoSourceTask(manual.source_stage).into());
        };
        let Some(handle) = source
            .responses()
            .and_then(|map| map.get(&manual.field))
            .and_then(handle_text)
        else {
            return Err(EngineError::DependencyMissing(format!(
                "response field {:?} carries no user handle",
                manual.field
            )));
        };
        let Some(user) = self.users.resolve(&handle).await? else {
            return Err(AssignmentFailure::UserDoesNotExist(handle).into());
        };
        if !self.is_campaign_member(user, task.stage()).await? {
            return Err(AssignmentFailure::UserNotInCampaign(user).into());
        }
        task.assign(user, &*self.clock)?;
        Ok(AssignmentOutcome::Assigned(user))
    }

    /// A user is a campaign member when one of their ranks sits on a
    /// track of the campaign owning the stage.
    async fn is_campaign_member(&self, user: UserId, stage: StageId) -> EngineResult<bool> {
        let Some(campaign) = self.graph.campaign_of_stage(stage).await? else {
            return Ok(false);
        };
        let tracks: Vec<_> = self
            .graph
            .tracks_in_campaign(campaign.id())
            .await?
            .iter()
            .map(Track::id)
            .collect();
        let held = self.ranks.ranks_of_user(user).await?;
        Ok(held.iter().any(|rank| tracks.contains(&rank.track())))
    }
}

/// Reads a user handle out of a response value.
///
/// Identifiers submitted as numbers are accepted alongside plain text.
fn handle_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}
