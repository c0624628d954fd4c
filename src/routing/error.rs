//! Engine-level error taxonomy shared by routing, assignment, and
//! completion.
//!
//! Repository and service errors bubble through transparently; the
//! domain-visible failures carry enough context to build an
//! [`ErrorEnvelope`] for an outer API surface.

use crate::fault::services::FaultRecorderError;
use crate::graph::domain::StageId;
use crate::graph::ports::GraphRepositoryError;
use crate::notification::ports::NotificationRepositoryError;
use crate::notification::services::NotificationDispatchError;
use crate::pipeline::services::FieldCopyError;
use crate::rank::ports::RankRepositoryError;
use crate::pipeline::services::SchemaProjectionError;
use crate::rank::services::{AwardError, LimitGateError, LimitRefusal, RankGrantError};
use crate::task::domain::{TaskDomainError, TaskId, UserId};
use crate::task::ports::TaskRepositoryError;
use crate::translation::services::TranslationServiceError;
use crate::webhook::services::WebhookError;
use serde::Serialize;
use thiserror::Error;

/// Why assignment could not resolve a user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssignmentFailure {
    /// The handle read from the source task resolves to no user.
    #[error("no user exists for handle {0:?}")]
    UserDoesNotExist(String),

    /// The resolved user holds no rank on any campaign track.
    #[error("user {0} holds no rank in the campaign")]
    UserNotInCampaign(UserId),

    /// No completed task exists at the assignment source stage.
    #[error("no completed source task at stage {0}")]
    NoSourceTask(StageId),
}

/// Failures surfaced by the task lifecycle engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Submitted responses violate the stage schema.
    #[error("{message}")]
    ValidationFailure {
        /// Human-readable description of the first violation.
        message: String,
        /// JSON pointer to the offending response field, when known.
        pass: Option<String>,
    },

    /// A rank limit denied the attempted action.
    #[error("limit exceeded: {0:?}")]
    LimitExceeded(LimitRefusal),

    /// Assignment could not resolve a user.
    #[error(transparent)]
    Assignment(#[from] AssignmentFailure),

    /// Another completion holds the task row lock.
    #[error("completion already in progress for task {0}")]
    CompletionConflict(TaskId),

    /// The task was already completed by an earlier submission.
    #[error("task {0} is already complete")]
    AlreadyCompleted(TaskId),

    /// A webhook delivery failed.
    #[error("webhook failed{}: {reason}", .status.map(|code| format!(" with status {code}")).unwrap_or_default())]
    WebhookFailure {
        /// HTTP status of the failed delivery, when one was received.
        status: Option<u16>,
        /// Failure description.
        reason: String,
    },

    /// Referenced configuration or upstream data is missing.
    #[error("missing dependency: {0}")]
    DependencyMissing(String),

    /// The referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The acting user may not perform the operation.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Task aggregate rejected a state transition.
    #[error(transparent)]
    TaskState(#[from] TaskDomainError),

    /// Task repository operation failed.
    #[error(transparent)]
    Task(#[from] TaskRepositoryError),

    /// Graph repository operation failed.
    #[error(transparent)]
    Graph(#[from] GraphRepositoryError),

    /// Rank repository operation failed.
    #[error(transparent)]
    Rank(#[from] RankRepositoryError),

    /// Notification dispatch failed.
    #[error(transparent)]
    Notification(#[from] NotificationDispatchError),

    /// Notification repository operation failed.
    #[error(transparent)]
    NotificationStore(#[from] NotificationRepositoryError),

    /// Copy-field resolution failed.
    #[error(transparent)]
    Copy(#[from] FieldCopyError),

    /// Webhook execution failed before delivery.
    #[error(transparent)]
    Webhook(#[from] WebhookError),

    /// Fault recording failed.
    #[error(transparent)]
    Fault(#[from] FaultRecorderError),

    /// Award evaluation failed.
    #[error(transparent)]
    Award(#[from] AwardError),

    /// Limit check failed.
    #[error(transparent)]
    Limits(#[from] LimitGateError),

    /// Rank granting failed.
    #[error(transparent)]
    Grant(#[from] RankGrantError),

    /// Schema projection failed.
    #[error(transparent)]
    Projection(#[from] SchemaProjectionError),

    /// Translation orchestration failed.
    #[error(transparent)]
    Translation(#[from] TranslationServiceError),
}

impl EngineError {
    /// Suggests an HTTP status for an outer API surface.
    ///
    /// Infrastructure failures map to 500.
    #[must_use]
    pub const fn status_hint(&self) -> u16 {
        match self {
            Self::ValidationFailure { .. }
            | Self::Assignment(_)
            | Self::WebhookFailure { .. }
            | Self::DependencyMissing(_)
            | Self::TaskState(_) => 400,
            Self::LimitExceeded(_) | Self::PermissionDenied(_) => 403,
            Self::NotFound(_) => 404,
            Self::CompletionConflict(_) | Self::AlreadyCompleted(_) => 409,
            Self::Task(_)
            | Self::Graph(_)
            | Self::Rank(_)
            | Self::Notification(_)
            | Self::NotificationStore(_)
            | Self::Copy(_)
            | Self::Webhook(_)
            | Self::Fault(_)
            | Self::Award(_)
            | Self::Limits(_)
            | Self::Grant(_)
            | Self::Projection(_)
            | Self::Translation(_) => 500,
        }
    }

    /// Projects the error into its wire envelope.
    #[must_use]
    pub fn envelope(&self) -> ErrorEnvelope {
        let pass = match self {
            Self::ValidationFailure { pass, .. } => pass.clone(),
            _ => None,
        };
        ErrorEnvelope {
            message: self.to_string(),
            pass,
        }
    }
}

/// Serializable projection of an [`EngineError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEnvelope {
    /// Human-readable failure description.
    pub message: String,
    /// JSON pointer to the offending field, for validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pass: Option<String>,
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
