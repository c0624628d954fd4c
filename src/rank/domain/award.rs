//! Completion-threshold rank awards.

use super::RankId;
use crate::graph::domain::StageId;
use crate::notification::domain::NotificationId;
use serde::{Deserialize, Serialize};

/// Grants a rank when enough verified completions accumulate.
///
/// On every non-forced completion at `verified_stage`, the award counts
/// distinct cases in which the same user completed (non-forced) at
/// `completion_stage`; reaching `count` grants `rank` once and clones the
/// configured notification once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskAward {
    /// Stage whose completions are counted.
    pub completion_stage: StageId,
    /// Stage whose completion triggers the threshold check.
    pub verified_stage: StageId,
    /// Rank granted when the threshold is reached.
    pub rank: RankId,
    /// Number of distinct verified cases required.
    pub count: u32,
    /// Suppress further routing from the verified task on grant.
    pub stop_chain: bool,
    /// Notification template cloned to the awarded user.
    pub notification: Option<NotificationId>,
}

impl TaskAward {
    /// Creates an award watching a completion/verified stage pair.
    #[must_use]
    pub const fn new(
        completion_stage: StageId,
        verified_stage: StageId,
        rank: RankId,
        count: u32,
    ) -> Self {
        Self {
            completion_stage,
            verified_stage,
            rank,
            count,
            stop_chain: false,
            notification: None,
        }
    }

    /// Suppresses routing from the verified task when the award fires.
    #[must_use]
    pub const fn with_stop_chain(mut self, stop_chain: bool) -> Self {
        self.stop_chain = stop_chain;
        self
    }

    /// Attaches the notification template cloned on grant.
    #[must_use]
    pub const fn with_notification(mut self, notification: NotificationId) -> Self {
        self.notification = Some(notification);
        self
    }
}
