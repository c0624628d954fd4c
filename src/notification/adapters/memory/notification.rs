//! In-memory notification repository.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use crate::graph::domain::StageId;
use crate::notification::{
    domain::{AutoNotification, Direction, Notification, NotificationId, NotificationStatus},
    ports::{NotificationRepository, NotificationRepositoryError, NotificationRepositoryResult},
};
use crate::task::domain::UserId;

#[derive(Debug, Default)]
struct InMemoryNotificationState {
    notifications: Vec<Notification>,
    autos: Vec<AutoNotification>,
    statuses: Vec<NotificationStatus>,
    status_index: HashSet<(NotificationId, UserId)>,
}

/// Thread-safe in-memory notification repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotificationRepository {
    state: Arc<RwLock<InMemoryNotificationState>>,
}

impl InMemoryNotificationRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_poisoned(err: impl std::fmt::Display) -> NotificationRepositoryError {
    NotificationRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn store(&self, notification: &Notification) -> NotificationRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_poisoned)?;
        state.notifications.push(notification.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: NotificationId,
    ) -> NotificationRepositoryResult<Option<Notification>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state
            .notifications
            .iter()
            .find(|notification| notification.id() == id)
            .cloned())
    }

    async fn store_auto(&self, auto: &AutoNotification) -> NotificationRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_poisoned)?;
        state.autos.push(*auto);
        Ok(())
    }

    async fn autos_for(
        &self,
        trigger_stage: StageId,
        direction: Direction,
    ) -> NotificationRepositoryResult<Vec<AutoNotification>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state
            .autos
            .iter()
            .filter(|auto| auto.trigger_stage == trigger_stage && auto.direction == direction)
            .copied()
            .collect())
    }

    async fn notifications_for_user(
        &self,
        user: UserId,
    ) -> NotificationRepositoryResult<Vec<Notification>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        let mut found: Vec<Notification> = state
            .notifications
            .iter()
            .filter(|notification| notification.target_user() == Some(user))
            .cloned()
            .collect();
        found.reverse();
        Ok(found)
    }

    async fn clone_exists(
        &self,
        template: NotificationId,
        user: UserId,
    ) -> NotificationRepositoryResult<bool> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state.notifications.iter().any(|notification| {
            notification.source() == Some(template) && notification.target_user() == Some(user)
        }))
    }

    async fn store_status(
        &self,
        status: &NotificationStatus,
    ) -> NotificationRepositoryResult<bool> {
        let mut state = self.state.write().map_err(lock_poisoned)?;
        if !state
            .status_index
            .insert((status.notification(), status.user()))
        {
            return Ok(false);
        }
        state.statuses.push(*status);
        Ok(true)
    }

    async fn status_for(
        &self,
        notification: NotificationId,
        user: UserId,
    ) -> NotificationRepositoryResult<Option<NotificationStatus>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state
            .statuses
            .iter()
            .find(|status| status.notification() == notification && status.user() == user)
            .copied())
    }
}
