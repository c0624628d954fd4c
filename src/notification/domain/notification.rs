//! Notifications and read statuses.

use super::NotificationId;
use crate::graph::domain::CampaignId;
use crate::task::domain::UserId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// A message shown to a user, or a template awaiting cloning.
///
/// Templates carry no target user; auto notifications and awards clone
/// them with the recipient filled in and `source` pointing back at the
/// template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    id: NotificationId,
    campaign: CampaignId,
    title: String,
    text: String,
    target_user: Option<UserId>,
    source: Option<NotificationId>,
    created_at: DateTime<Utc>,
}

impl Notification {
    /// Creates a notification template.
    #[must_use]
    pub fn template(
        campaign: CampaignId,
        title: impl Into<String>,
        text: impl Into<String>,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            campaign,
            title: title.into(),
            text: text.into(),
            target_user: None,
            source: None,
            created_at: clock.utc(),
        }
    }

    /// Clones this notification for a target user.
    #[must_use]
    pub fn clone_for(&self, user: UserId, clock: &impl Clock) -> Self {
        Self {
            id: NotificationId::new(),
            campaign: self.campaign,
            title: self.title.clone(),
            text: self.text.clone(),
            target_user: Some(user),
            source: Some(self.id),
            created_at: clock.utc(),
        }
    }

    /// Returns the notification identifier.
    #[must_use]
    pub const fn id(&self) -> NotificationId {
        self.id
    }

    /// Returns the owning campaign.
    #[must_use]
    pub const fn campaign(&self) -> CampaignId {
        self.campaign
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the body text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the recipient, `None` for templates.
    #[must_use]
    pub const fn target_user(&self) -> Option<UserId> {
        self.target_user
    }

    /// Returns the template this notification was cloned from.
    #[must_use]
    pub const fn source(&self) -> Option<NotificationId> {
        self.source
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Read receipt, created on a notification's first read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationStatus {
    notification: NotificationId,
    user: UserId,
    read_at: DateTime<Utc>,
}

impl NotificationStatus {
    /// Records the first read of a notification by a user.
    #[must_use]
    pub fn new(notification: NotificationId, user: UserId, clock: &impl Clock) -> Self {
        Self {
            notification,
            user,
            read_at: clock.utc(),
        }
    }

    /// Returns the read notification.
    #[must_use]
    pub const fn notification(&self) -> NotificationId {
        self.notification
    }

    /// Returns the reading user.
    #[must_use]
    pub const fn user(&self) -> UserId {
        self.user
    }

    /// Returns the first-read timestamp.
    #[must_use]
    pub const fn read_at(&self) -> DateTime<Utc> {
        self.read_at
    }
}
