//! Repository and directory ports for the rank context.

use crate::graph::domain::StageId;
use crate::rank::domain::{Rank, RankId, RankLimit, RankRecord, TaskAward};
use crate::task::domain::UserId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for rank repository operations.
pub type RankRepositoryResult<T> = Result<T, RankRepositoryError>;

/// Persistence contract for ranks, limits, memberships, and awards.
#[async_trait]
pub trait RankRepository: Send + Sync {
    /// Stores a rank definition.
    async fn store_rank(&self, rank: &Rank) -> RankRepositoryResult<()>;

    /// Stores a rank limit.
    async fn store_limit(&self, limit: &RankLimit) -> RankRepositoryResult<()>;

    /// Stores a task award.
    async fn store_award(&self, award: &TaskAward) -> RankRepositoryResult<()>;

    /// Finds a rank by identifier.
    async fn rank(&self, id: RankId) -> RankRepositoryResult<Option<Rank>>;

    /// Lists every rank definition.
    async fn ranks(&self) -> RankRepositoryResult<Vec<Rank>>;

    /// Lists the ranks a user holds.
    async fn ranks_of_user(&self, user: UserId) -> RankRepositoryResult<Vec<Rank>>;

    /// Returns whether the user holds the rank.
    async fn has_rank(&self, user: UserId, rank: RankId) -> RankRepositoryResult<bool>;

    /// Lists users holding a rank.
    async fn holders_of_rank(&self, rank: RankId) -> RankRepositoryResult<Vec<UserId>>;

    /// Records a membership; idempotent per `(user, rank)`.
    ///
    /// Returns `true` when the record was created by this call.
    async fn grant(&self, record: RankRecord) -> RankRepositoryResult<bool>;

    /// Lists the limits configured for a stage.
    async fn limits_for_stage(&self, stage: StageId) -> RankRepositoryResult<Vec<RankLimit>>;

    /// Lists every limit configured for a rank.
    async fn limits_for_rank(&self, rank: RankId) -> RankRepositoryResult<Vec<RankLimit>>;

    /// Lists the awards watching a verified stage.
    async fn awards_for_verified_stage(
        &self,
        stage: StageId,
    ) -> RankRepositoryResult<Vec<TaskAward>>;
}

/// Bridge to the external identity service.
///
/// The engine never stores user profiles; it only needs to resolve the
/// email-or-identifier handles that `PREVIOUS_MANUAL` assignment reads out
/// of task responses.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Resolves a handle (email or identifier text) to a user.
    async fn resolve(&self, handle: &str) -> RankRepositoryResult<Option<UserId>>;
}

/// Errors returned by rank repository implementations.
#[derive(Debug, Clone, Error)]
pub enum RankRepositoryError {
    /// A referenced rank does not exist.
    #[error("rank not found: {0}")]
    RankNotFound(RankId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl RankRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
