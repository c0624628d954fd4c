//! Per-user per-stage limit enforcement.

use crate::graph::domain::StageId;
use crate::rank::{
    domain::RankLimit,
    ports::{RankRepository, RankRepositoryError},
};
use crate::task::{
    domain::UserId,
    ports::{TaskRepository, TaskRepositoryError},
};
use std::sync::Arc;
use thiserror::Error;

/// Service-level errors for limit checks.
#[derive(Debug, Error)]
pub enum LimitGateError {
    /// Rank repository operation failed.
    #[error(transparent)]
    Rank(#[from] RankRepositoryError),
    /// Task repository operation failed.
    #[error(transparent)]
    Task(#[from] TaskRepositoryError),
}

/// Result type for limit checks.
pub type LimitGateResult<T> = Result<T, LimitGateError>;

/// Why a limit check denied access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitRefusal {
    /// No rank of the user opens the requested action on the stage.
    NoAccess,
    /// The user's open-task cap at the stage is reached.
    OpenLimitReached,
    /// The user's total-task cap at the stage is reached.
    TotalLimitReached,
}

/// The action a limit check guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitAction {
    /// Creating a task on a creatable stage.
    Creation,
    /// Claiming an unassigned task.
    Selection,
    /// Submitting a completion.
    Submission,
    /// Seeing the stage's tasks in listings.
    Listing,
}

/// Enforces [`RankLimit`] toggles and caps per user and stage.
#[derive(Clone)]
pub struct LimitGate<R, T>
where
    R: RankRepository,
    T: TaskRepository,
{
    ranks: Arc<R>,
    tasks: Arc<T>,
}

impl<R, T> LimitGate<R, T>
where
    R: RankRepository,
    T: TaskRepository,
{
    /// Creates a limit gate.
    #[must_use]
    pub const fn new(ranks: Arc<R>, tasks: Arc<T>) -> Self {
        Self { ranks, tasks }
    }

    /// Checks an action for a user on a stage.
    ///
    /// Creation, selection, and listing require an explicit open limit on
    /// one of the user's ranks. Submission on a stage with no configured
    /// limits is allowed: the assignee was already vetted when the task
    /// was assigned.
    ///
    /// # Errors
    ///
    /// Returns [`LimitGateError`] when repository lookups fail.
    pub async fn check(
        &self,
        user: UserId,
        stage: StageId,
        action: LimitAction,
    ) -> LimitGateResult<Result<(), LimitRefusal>> {
        let limits = self.ranks.limits_for_stage(stage).await?;
        if limits.is_empty() {
            return Ok(match action {
                LimitAction::Submission => Ok(()),
                LimitAction::Creation | LimitAction::Selection | LimitAction::Listing => {
                    Err(LimitRefusal::NoAccess)
                }
            });
        }

        let held: Vec<crate::rank::domain::RankId> = self
            .ranks
            .ranks_of_user(user)
            .await?
            .iter()
            .map(crate::rank::domain::Rank::id)
            .collect();
        let open_for_action: Vec<&RankLimit> = limits
            .iter()
            .filter(|limit| held.contains(&limit.rank) && action_open(limit, action))
            .collect();
        if open_for_action.is_empty() {
            return Ok(Err(LimitRefusal::NoAccess));
        }
        if action == LimitAction::Listing {
            return Ok(Ok(()));
        }

        // Caps apply per user and stage; the most permissive of the
        // user's applicable limits wins.
        let open_cap = effective_cap(&open_for_action, |limit| limit.open_limit);
        let total_cap = effective_cap(&open_for_action, |limit| limit.total_limit);

        if let Some(cap) = total_cap {
            let total = self.tasks.count_for_user_at_stage(user, stage, false).await?;
            if total >= usize::try_from(cap).unwrap_or(usize::MAX) {
                return Ok(Err(LimitRefusal::TotalLimitReached));
            }
        }
        if matches!(action, LimitAction::Creation | LimitAction::Selection) {
            if let Some(cap) = open_cap {
                let open = self.tasks.count_for_user_at_stage(user, stage, true).await?;
                if open >= usize::try_from(cap).unwrap_or(usize::MAX) {
                    return Ok(Err(LimitRefusal::OpenLimitReached));
                }
            }
        }
        Ok(Ok(()))
    }

    /// Returns the stages a user may list tasks for, out of a candidate
    /// set.
    ///
    /// # Errors
    ///
    /// Returns [`LimitGateError`] when repository lookups fail.
    pub async fn listable_stages(
        &self,
        user: UserId,
        candidates: &[StageId],
    ) -> LimitGateResult<Vec<StageId>> {
        let mut visible = Vec::new();
        for stage in candidates {
            if self
                .check(user, *stage, LimitAction::Listing)
                .await?
                .is_ok()
            {
                visible.push(*stage);
            }
        }
        Ok(visible)
    }
}

const fn action_open(limit: &RankLimit, action: LimitAction) -> bool {
    match action {
        LimitAction::Creation => limit.is_creation_open,
        LimitAction::Selection => limit.is_selection_open,
        LimitAction::Submission => limit.is_submission_open,
        LimitAction::Listing => limit.is_listing_open,
    }
}

/// Collapses the caps of several applicable limits: zero means unbounded,
/// and any unbounded limit lifts the cap entirely.
fn effective_cap(limits: &[&RankLimit], pick: impl Fn(&RankLimit) -> u32) -> Option<u32> {
    let mut cap: Option<u32> = None;
    for limit in limits {
        let value = pick(limit);
        if value == 0 {
            return None;
        }
        cap = Some(cap.map_or(value, |current| current.max(value)));
    }
    cap
}
