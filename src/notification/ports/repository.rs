//! Repository port for notifications.

use crate::graph::domain::StageId;
use crate::notification::domain::{
    AutoNotification, Direction, Notification, NotificationId, NotificationStatus,
};
use crate::task::domain::UserId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for notification repository operations.
pub type NotificationRepositoryResult<T> = Result<T, NotificationRepositoryError>;

/// Persistence contract for notifications, bindings, and read statuses.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Stores a notification (template or clone).
    async fn store(&self, notification: &Notification) -> NotificationRepositoryResult<()>;

    /// Finds a notification by identifier.
    async fn find_by_id(
        &self,
        id: NotificationId,
    ) -> NotificationRepositoryResult<Option<Notification>>;

    /// Registers an automatic notification binding.
    async fn store_auto(&self, auto: &AutoNotification) -> NotificationRepositoryResult<()>;

    /// Lists bindings for a trigger stage and direction.
    async fn autos_for(
        &self,
        trigger_stage: StageId,
        direction: Direction,
    ) -> NotificationRepositoryResult<Vec<AutoNotification>>;

    /// Lists a user's notifications, newest first.
    async fn notifications_for_user(
        &self,
        user: UserId,
    ) -> NotificationRepositoryResult<Vec<Notification>>;

    /// Returns whether a clone of the template already targets the user.
    async fn clone_exists(
        &self,
        template: NotificationId,
        user: UserId,
    ) -> NotificationRepositoryResult<bool>;

    /// Stores a read status; idempotent per `(notification, user)`.
    ///
    /// Returns `true` when this call created the status.
    async fn store_status(&self, status: &NotificationStatus)
    -> NotificationRepositoryResult<bool>;

    /// Finds the read status for a notification and user.
    async fn status_for(
        &self,
        notification: NotificationId,
        user: UserId,
    ) -> NotificationRepositoryResult<Option<NotificationStatus>>;
}

/// Errors returned by notification repository implementations.
#[derive(Debug, Clone, Error)]
pub enum NotificationRepositoryError {
    /// The notification was not found.
    #[error("notification not found: {0}")]
    NotFound(NotificationId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl NotificationRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
