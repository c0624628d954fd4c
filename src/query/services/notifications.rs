//! Notification reads for the query surface.

use crate::notification::{
    domain::{Notification, NotificationId, NotificationStatus},
    ports::NotificationRepository,
};
use crate::routing::error::{EngineError, EngineResult};
use crate::task::domain::UserId;
use mockable::Clock;
use std::collections::HashSet;
use std::sync::Arc;

/// A notification joined with its read state for the requesting user.
#[derive(Debug, Clone)]
pub struct NotificationRead {
    /// The notification.
    pub notification: Notification,
    /// Whether this request created the read status.
    pub first_read: bool,
}

/// Notification operations offered to API consumers.
#[derive(Clone)]
pub struct NotificationGateway<N, C>
where
    N: NotificationRepository,
    C: Clock + Send + Sync,
{
    notifications: Arc<N>,
    clock: Arc<C>,
}

impl<N, C> NotificationGateway<N, C>
where
    N: NotificationRepository,
    C: Clock + Send + Sync,
{
    /// Creates a notification gateway.
    #[must_use]
    pub const fn new(notifications: Arc<N>, clock: Arc<C>) -> Self {
        Self {
            notifications,
            clock,
        }
    }

    /// Fetches a notification, recording the read status on first
    /// access.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] for unknown notifications and
    /// [`EngineError::PermissionDenied`] when it targets another user.
    pub async fn read_notification(
        &self,
        user: UserId,
        id: NotificationId,
    ) -> EngineResult<NotificationRead> {
        let notification = self
            .notifications
            .find_by_id(id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("notification {id}")))?;
        if notification
            .target_user()
            .is_some_and(|target| target != user)
        {
            return Err(EngineError::PermissionDenied(format!(
                "notification {id} targets another user"
            )));
        }
        let first_read = self
            .notifications
            .store_status(&NotificationStatus::new(id, user, &*self.clock))
            .await?;
        Ok(NotificationRead {
            notification,
            first_read,
        })
    }

    /// Returns the user's latest notification per source template,
    /// newest first.
    ///
    /// Repeated firings of the same automatic binding collapse to their
    /// most recent clone; ad-hoc notifications appear individually.
    ///
    /// # Errors
    ///
    /// Returns repository errors transparently.
    pub async fn last_task_notifications(
        &self,
        user: UserId,
    ) -> EngineResult<Vec<Notification>> {
        let all = self.notifications.notifications_for_user(user).await?;
        let mut seen = HashSet::new();
        let mut latest = Vec::new();
        for notification in all {
            let key = notification.source().unwrap_or_else(|| notification.id());
            if seen.insert(key) {
                latest.push(notification);
            }
        }
        Ok(latest)
    }

    /// Lists all of the user's notifications, newest first.
    ///
    /// # Errors
    ///
    /// Returns repository errors transparently.
    pub async fn list_notifications(&self, user: UserId) -> EngineResult<Vec<Notification>> {
        Ok(self.notifications.notifications_for_user(user).await?)
    }

    /// Returns whether the user has read a notification.
    ///
    /// # Errors
    ///
    /// Returns repository errors transparently.
    pub async fn is_read(&self, user: UserId, id: NotificationId) -> EngineResult<bool> {
        Ok(self.notifications.status_for(id, user).await?.is_some())
    }
}
