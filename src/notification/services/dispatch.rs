//! Cloning of notification templates on routing transitions.

use crate::notification::{
    domain::{Direction, Notification, NotificationId},
    ports::{NotificationRepository, NotificationRepositoryError},
};
use crate::task::domain::{Task, UserId};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Service-level errors for notification dispatch.
#[derive(Debug, Error)]
pub enum NotificationDispatchError {
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] NotificationRepositoryError),
}

/// Result type for dispatch operations.
pub type NotificationDispatchResult<T> = Result<T, NotificationDispatchError>;

/// Clones direction-tagged notification templates to task assignees.
#[derive(Clone)]
pub struct NotificationDispatch<N, C>
where
    N: NotificationRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<N>,
    clock: Arc<C>,
}

impl<N, C> NotificationDispatch<N, C>
where
    N: NotificationRepository,
    C: Clock + Send + Sync,
{
    /// Creates a dispatch service.
    #[must_use]
    pub const fn new(repository: Arc<N>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Fires the bindings of a trigger stage for one direction, targeting
    /// the recipient task's assignee.
    ///
    /// Unassigned recipients and bindings for other recipient stages are
    /// skipped silently.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationDispatchError::Repository`] when lookup or
    /// persistence fails.
    pub async fn fire(
        &self,
        trigger_stage: crate::graph::domain::StageId,
        direction: Direction,
        recipient: &Task,
    ) -> NotificationDispatchResult<Vec<NotificationId>> {
        let Some(user) = recipient.assignee() else {
            return Ok(Vec::new());
        };
        let bindings = self.repository.autos_for(trigger_stage, direction).await?;
        let mut fired = Vec::new();
        for binding in bindings {
            if binding.recipient_stage != recipient.stage() {
                continue;
            }
            if let Some(id) = self.clone_to(binding.notification, user).await? {
                fired.push(id);
            }
        }
        Ok(fired)
    }

    /// Clones a template to a user exactly once.
    ///
    /// Returns `None` when a clone already exists or the template is gone
    /// (a deleted template is not an error at dispatch time).
    ///
    /// # Errors
    ///
    /// Returns [`NotificationDispatchError::Repository`] when lookup or
    /// persistence fails.
    pub async fn clone_once(
        &self,
        template: NotificationId,
        user: UserId,
    ) -> NotificationDispatchResult<Option<NotificationId>> {
        if self.repository.clone_exists(template, user).await? {
            return Ok(None);
        }
        let Some(found) = self.repository.find_by_id(template).await? else {
            tracing::warn!(%template, "notification template missing at dispatch");
            return Ok(None);
        };
        let clone = found.clone_for(user, &*self.clock);
        self.repository.store(&clone).await?;
        Ok(Some(clone.id()))
    }

    /// Clones a template to a user without the once-only guard.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationDispatchError::Repository`] when lookup or
    /// persistence fails.
    async fn clone_to(
        &self,
        template: NotificationId,
        user: UserId,
    ) -> NotificationDispatchResult<Option<NotificationId>> {
        let Some(found) = self.repository.find_by_id(template).await? else {
            tracing::warn!(%template, "notification template missing at dispatch");
            return Ok(None);
        };
        let clone: Notification = found.clone_for(user, &*self.clock);
        self.repository.store(&clone).await?;
        Ok(Some(clone.id()))
    }
}
