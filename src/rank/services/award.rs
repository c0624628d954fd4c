//! Completion-threshold award evaluation.

use crate::notification::services::{NotificationDispatch, NotificationDispatchError};
use crate::rank::{
    ports::{RankRepository, RankRepositoryError},
    services::{RankGrantError, RankGrantService},
};
use crate::task::{
    domain::Task,
    ports::{TaskRepository, TaskRepositoryError},
};
use crate::notification::ports::NotificationRepository;
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Service-level errors for award evaluation.
#[derive(Debug, Error)]
pub enum AwardError {
    /// Rank repository operation failed.
    #[error(transparent)]
    Rank(#[from] RankRepositoryError),
    /// Task repository operation failed.
    #[error(transparent)]
    Task(#[from] TaskRepositoryError),
    /// Granting failed.
    #[error(transparent)]
    Grant(#[from] RankGrantError),
    /// Notification cloning failed.
    #[error(transparent)]
    Notification(#[from] NotificationDispatchError),
}

/// Result type for award evaluation.
pub type AwardResult<T> = Result<T, AwardError>;

/// Evaluates task awards when a verified-stage task completes.
#[derive(Clone)]
pub struct AwardService<R, T, N, C>
where
    R: RankRepository,
    T: TaskRepository,
    N: NotificationRepository,
    C: Clock + Send + Sync,
{
    ranks: Arc<R>,
    tasks: Arc<T>,
    grants: RankGrantService<R, C>,
    notifications: NotificationDispatch<N, C>,
}

impl<R, T, N, C> AwardService<R, T, N, C>
where
    R: RankRepository,
    T: TaskRepository,
    N: NotificationRepository,
    C: Clock + Send + Sync,
{
    /// Creates an award service.
    #[must_use]
    pub const fn new(
        ranks: Arc<R>,
        tasks: Arc<T>,
        grants: RankGrantService<R, C>,
        notifications: NotificationDispatch<N, C>,
    ) -> Self {
        Self {
            ranks,
            tasks,
            grants,
            notifications,
        }
    }

    /// Runs the award checks for a just-completed task.
    ///
    /// Forced completions and unassigned tasks never feed thresholds.
    /// Returns `true` when a fired award asks to suppress further routing
    /// from the verified task.
    ///
    /// # Errors
    ///
    /// Returns [`AwardError`] when a repository lookup, the grant, or the
    /// notification clone fails.
    pub async fn on_verified_completion(&self, task: &Task) -> AwardResult<bool> {
        if task.is_force_complete() {
            return Ok(false);
        }
        let Some(user) = task.assignee() else {
            return Ok(false);
        };

        let mut stop_chain = false;
        let awards = self.ranks.awards_for_verified_stage(task.stage()).await?;
        for award in awards {
            let verified = self
                .tasks
                .completed_case_count(user, award.completion_stage)
                .await?;
            if verified < usize::try_from(award.count).unwrap_or(usize::MAX) {
                continue;
            }
            if award.stop_chain {
                stop_chain = true;
            }
            let granted = self.grants.grant(user, award.rank).await?;
            if !granted.contains(&award.rank) {
                // Threshold crossed earlier; the record and its
                // notification already exist.
                continue;
            }
            tracing::debug!(%user, rank = %award.rank, "task award fired");
            if let Some(template) = award.notification {
                self.notifications.clone_once(template, user).await?;
            }
        }
        Ok(stop_chain)
    }
}
