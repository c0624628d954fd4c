//! Direction-tagged automatic notifications.

use super::NotificationId;
use crate::graph::domain::StageId;
use serde::{Deserialize, Serialize};

/// Routing direction an automatic notification fires on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    /// A successor task was created from the trigger stage.
    Forward,
    /// A predecessor task was returned by a ping-pong conditional.
    Backward,
    /// The completion's routing produced no new user-assigned successor.
    LastOne,
}

/// Clones a notification template when a matching transition fires.
///
/// The clone targets the assignee of the recipient-stage task involved in
/// the transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoNotification {
    /// Stage whose completion triggers the notification.
    pub trigger_stage: StageId,
    /// Stage whose task's assignee receives the clone.
    pub recipient_stage: StageId,
    /// Transition direction the notification keys on.
    pub direction: Direction,
    /// Template to clone.
    pub notification: NotificationId,
}

impl AutoNotification {
    /// Creates an automatic notification binding.
    #[must_use]
    pub const fn new(
        trigger_stage: StageId,
        recipient_stage: StageId,
        direction: Direction,
        notification: NotificationId,
    ) -> Self {
        Self {
            trigger_stage,
            recipient_stage,
            direction,
            notification,
        }
    }
}
