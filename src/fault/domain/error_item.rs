//! Fault records appended to the internal error campaign.

use crate::graph::domain::CampaignId;
use crate::task::domain::TaskId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a recorded fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaultId(Uuid);

impl FaultId {
    /// Creates a new random fault identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a fault identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for FaultId {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<Uuid> for FaultId {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for FaultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Classifies what failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FaultKind {
    /// An outbound webhook returned a non-success status or a
    /// non-JSON body.
    WebhookFailure,
    /// A graph reference no longer resolves during routing.
    DependencyMissing,
    /// Auto-complete routing exceeded the recursion cap.
    RoutingDepthExceeded,
    /// A post-commit side effect failed for another reason.
    SideEffectFailure,
}

/// One recorded fault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorItem {
    id: FaultId,
    campaign: CampaignId,
    trigger_task: Option<TaskId>,
    kind: FaultKind,
    detail: String,
    payload: Option<Value>,
    created_at: DateTime<Utc>,
}

impl ErrorItem {
    /// Creates a fault record under a campaign.
    pub fn new(
        campaign: CampaignId,
        kind: FaultKind,
        detail: impl Into<String>,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: FaultId::new(),
            campaign,
            trigger_task: None,
            kind,
            detail: detail.into(),
            payload: None,
            created_at: clock.utc(),
        }
    }

    /// Links the task whose side effect failed.
    #[must_use]
    pub const fn with_trigger_task(mut self, task: TaskId) -> Self {
        self.trigger_task = Some(task);
        self
    }

    /// Attaches the offending payload or response body.
    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Returns the fault identifier.
    #[must_use]
    pub const fn id(&self) -> FaultId {
        self.id
    }

    /// Returns the campaign the fault is filed under.
    #[must_use]
    pub const fn campaign(&self) -> CampaignId {
        self.campaign
    }

    /// Returns the triggering task, when known.
    #[must_use]
    pub const fn trigger_task(&self) -> Option<TaskId> {
        self.trigger_task
    }

    /// Returns the fault classification.
    #[must_use]
    pub const fn kind(&self) -> FaultKind {
        self.kind
    }

    /// Returns the human-readable detail line.
    #[must_use]
    pub fn detail(&self) -> &str {
        &self.detail
    }

    /// Returns the attached payload, when any.
    #[must_use]
    pub const fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    /// Returns the recording instant.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
