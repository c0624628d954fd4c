//! Repository port for fault records.

use crate::fault::domain::ErrorItem;
use crate::graph::domain::CampaignId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for fault repository operations.
pub type FaultRepositoryResult<T> = Result<T, FaultRepositoryError>;

/// Fault persistence contract. Records are append-only.
#[async_trait]
pub trait FaultRepository: Send + Sync {
    /// Appends a fault record.
    async fn append(&self, item: &ErrorItem) -> FaultRepositoryResult<()>;

    /// Lists the faults filed under a campaign in recording order.
    async fn faults_for_campaign(
        &self,
        campaign: CampaignId,
    ) -> FaultRepositoryResult<Vec<ErrorItem>>;
}

/// Errors returned by fault repository implementations.
#[derive(Debug, Clone, Error)]
pub enum FaultRepositoryError {
    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl FaultRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
