//! Repository port for campaign graph lookup.

use crate::graph::domain::{Campaign, CampaignId, Chain, ChainId, Stage, StageId, Track, TrackId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for graph repository operations.
pub type GraphRepositoryResult<T> = Result<T, GraphRepositoryError>;

/// Read-side contract for the campaign graph.
///
/// The graph is configuration: it is loaded from storage and treated as
/// immutable for the duration of a routing hop. Adjacency is asymmetric;
/// `out_stages` follows the edges the router walks while `in_stages`
/// answers predecessor queries.
#[async_trait]
pub trait GraphRepository: Send + Sync {
    /// Finds a campaign by identifier.
    async fn campaign(&self, id: CampaignId) -> GraphRepositoryResult<Option<Campaign>>;

    /// Lists every campaign.
    async fn campaigns(&self) -> GraphRepositoryResult<Vec<Campaign>>;

    /// Returns the reserved internal error campaign, when configured.
    async fn error_campaign(&self) -> GraphRepositoryResult<Option<Campaign>>;

    /// Finds a chain by identifier.
    async fn chain(&self, id: ChainId) -> GraphRepositoryResult<Option<Chain>>;

    /// Lists the chains of a campaign.
    async fn chains_in_campaign(&self, campaign: CampaignId) -> GraphRepositoryResult<Vec<Chain>>;

    /// Finds a stage by identifier.
    async fn stage(&self, id: StageId) -> GraphRepositoryResult<Option<Stage>>;

    /// Lists the stages of a chain in `order` then insertion order.
    async fn stages_in_chain(&self, chain: ChainId) -> GraphRepositoryResult<Vec<Stage>>;

    /// Returns the successor stages of a stage in edge insertion order.
    async fn out_stages(&self, stage: StageId) -> GraphRepositoryResult<Vec<Stage>>;

    /// Returns the predecessor stages of a stage in edge insertion order.
    async fn in_stages(&self, stage: StageId) -> GraphRepositoryResult<Vec<Stage>>;

    /// Finds a track by identifier.
    async fn track(&self, id: TrackId) -> GraphRepositoryResult<Option<Track>>;

    /// Lists the tracks of a campaign.
    async fn tracks_in_campaign(&self, campaign: CampaignId) -> GraphRepositoryResult<Vec<Track>>;

    /// Returns the campaign owning a stage, resolved through its chain.
    async fn campaign_of_stage(&self, stage: StageId) -> GraphRepositoryResult<Option<Campaign>> {
        let Some(found) = self.stage(stage).await? else {
            return Ok(None);
        };
        let Some(chain) = self.chain(found.chain()).await? else {
            return Ok(None);
        };
        self.campaign(chain.campaign()).await
    }
}

/// Errors returned by graph repository implementations.
#[derive(Debug, Clone, Error)]
pub enum GraphRepositoryError {
    /// A stored edge references a stage that no longer exists.
    #[error("dangling edge to stage {0}")]
    DanglingEdge(StageId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl GraphRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
