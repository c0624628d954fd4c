//! In-memory graph repository and the builder used to assemble test
//! campaigns.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::graph::{
    domain::{
        Campaign, CampaignId, Chain, ChainId, ConditionalStageConfig, GraphDomainError, Stage,
        StageId, StageKind, TaskStageConfig, Track, TrackId,
    },
    ports::{GraphRepository, GraphRepositoryError, GraphRepositoryResult},
};

#[derive(Debug, Default)]
struct GraphState {
    campaigns: Vec<Campaign>,
    tracks: Vec<Track>,
    chains: Vec<Chain>,
    stages: Vec<Stage>,
    stage_index: HashMap<StageId, usize>,
    out_edges: HashMap<StageId, Vec<StageId>>,
    in_edges: HashMap<StageId, Vec<StageId>>,
}

impl GraphState {
    fn stage(&self, id: StageId) -> Option<&Stage> {
        self.stage_index.get(&id).and_then(|at| self.stages.get(*at))
    }

    fn resolve_edges(&self, ids: &[StageId]) -> GraphRepositoryResult<Vec<Stage>> {
        ids.iter()
            .map(|id| {
                self.stage(*id)
                    .cloned()
                    .ok_or(GraphRepositoryError::DanglingEdge(*id))
            })
            .collect()
    }
}

/// Thread-safe in-memory graph repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGraphRepository {
    state: Arc<RwLock<GraphState>>,
}

fn lock_poisoned(err: impl std::fmt::Display) -> GraphRepositoryError {
    GraphRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl GraphRepository for InMemoryGraphRepository {
    async fn campaign(&self, id: CampaignId) -> GraphRepositoryResult<Option<Campaign>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state
            .campaigns
            .iter()
            .find(|campaign| campaign.id() == id)
            .cloned())
    }

    async fn campaigns(&self) -> GraphRepositoryResult<Vec<Campaign>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state.campaigns.clone())
    }

    async fn error_campaign(&self) -> GraphRepositoryResult<Option<Campaign>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state
            .campaigns
            .iter()
            .find(|campaign| campaign.is_error_campaign())
            .cloned())
    }

    async fn chain(&self, id: ChainId) -> GraphRepositoryResult<Option<Chain>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state.chains.iter().find(|chain| chain.id() == id).cloned())
    }

    async fn chains_in_campaign(&self, campaign: CampaignId) -> GraphRepositoryResult<Vec<Chain>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state
            .chains
            .iter()
            .filter(|chain| chain.campaign() == campaign)
            .cloned()
            .collect())
    }

    async fn stage(&self, id: StageId) -> GraphRepositoryResult<Option<Stage>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state.stage(id).cloned())
    }

    async fn stages_in_chain(&self, chain: ChainId) -> GraphRepositoryResult<Vec<Stage>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        let mut stages: Vec<Stage> = state
            .stages
            .iter()
            .filter(|stage| stage.chain() == chain)
            .cloned()
            .collect();
        // Insertion order is already positional; sort_by_key is stable so
        // equal orders keep it.
        stages.sort_by_key(Stage::order);
        Ok(stages)
    }

    async fn out_stages(&self, stage: StageId) -> GraphRepositoryResult<Vec<Stage>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        let ids = state.out_edges.get(&stage).cloned().unwrap_or_default();
        state.resolve_edges(&ids)
    }

    async fn in_stages(&self, stage: StageId) -> GraphRepositoryResult<Vec<Stage>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        let ids = state.in_edges.get(&stage).cloned().unwrap_or_default();
        state.resolve_edges(&ids)
    }

    async fn track(&self, id: TrackId) -> GraphRepositoryResult<Option<Track>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state.tracks.iter().find(|track| track.id() == id).cloned())
    }

    async fn tracks_in_campaign(&self, campaign: CampaignId) -> GraphRepositoryResult<Vec<Track>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state
            .tracks
            .iter()
            .filter(|track| track.campaign() == campaign)
            .cloned()
            .collect())
    }
}

/// Assembles campaigns, chains, stages, and edges into an
/// [`InMemoryGraphRepository`].
///
/// Stage `order` values are allocated per chain in insertion order unless
/// overridden through the explicit-order variants.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    state: GraphState,
    next_order: HashMap<ChainId, u32>,
}

impl GraphBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a campaign together with its default track.
    ///
    /// # Errors
    ///
    /// Returns [`GraphDomainError::EmptyName`] when the name is blank.
    pub fn campaign(
        &mut self,
        name: &str,
    ) -> Result<(CampaignId, TrackId), GraphDomainError> {
        let track_id = TrackId::new();
        let campaign = Campaign::new(name, track_id)?;
        let campaign_id = campaign.id();
        self.state
            .tracks
            .push(Track::new(track_id, campaign_id, format!("{name} track")));
        self.state.campaigns.push(campaign);
        Ok((campaign_id, track_id))
    }

    /// Adds an open (self-join) campaign with its default track.
    ///
    /// # Errors
    ///
    /// Returns [`GraphDomainError::EmptyName`] when the name is blank.
    pub fn open_campaign(
        &mut self,
        name: &str,
    ) -> Result<(CampaignId, TrackId), GraphDomainError> {
        let track_id = TrackId::new();
        let campaign = Campaign::new(name, track_id)?.with_open(true);
        let campaign_id = campaign.id();
        self.state
            .tracks
            .push(Track::new(track_id, campaign_id, format!("{name} track")));
        self.state.campaigns.push(campaign);
        Ok((campaign_id, track_id))
    }

    /// Adds the reserved internal error campaign with a single chain, and
    /// returns the chain faults are filed under.
    ///
    /// # Errors
    ///
    /// Returns [`GraphDomainError::EmptyName`] on blank constants, which
    /// cannot happen with the built-in names.
    pub fn error_campaign(&mut self) -> Result<(CampaignId, ChainId), GraphDomainError> {
        let track_id = TrackId::new();
        let campaign = Campaign::new("errors", track_id)?.with_error_campaign(true);
        let campaign_id = campaign.id();
        self.state
            .tracks
            .push(Track::new(track_id, campaign_id, "errors track"));
        self.state.campaigns.push(campaign);
        let chain = self.chain(campaign_id, "error items")?;
        Ok((campaign_id, chain))
    }

    /// Adds a chain to a campaign.
    ///
    /// # Errors
    ///
    /// Returns [`GraphDomainError::EmptyName`] when the name is blank.
    pub fn chain(&mut self, campaign: CampaignId, name: &str) -> Result<ChainId, GraphDomainError> {
        let chain = Chain::new(campaign, name)?;
        let id = chain.id();
        self.state.chains.push(chain);
        Ok(id)
    }

    /// Adds a per-user (individual) chain to a campaign.
    ///
    /// # Errors
    ///
    /// Returns [`GraphDomainError::EmptyName`] when the name is blank.
    pub fn individual_chain(
        &mut self,
        campaign: CampaignId,
        name: &str,
    ) -> Result<ChainId, GraphDomainError> {
        let chain = Chain::new(campaign, name)?.with_individual(true);
        let id = chain.id();
        self.state.chains.push(chain);
        Ok(id)
    }

    /// Adds a task stage to a chain.
    ///
    /// # Errors
    ///
    /// Returns [`GraphDomainError::EmptyName`] when the name is blank.
    pub fn task_stage(
        &mut self,
        chain: ChainId,
        name: &str,
        config: TaskStageConfig,
    ) -> Result<StageId, GraphDomainError> {
        self.push_stage(chain, name, StageKind::Task(config))
    }

    /// Adds a conditional stage to a chain.
    ///
    /// # Errors
    ///
    /// Returns [`GraphDomainError::EmptyName`] when the name is blank.
    pub fn conditional_stage(
        &mut self,
        chain: ChainId,
        name: &str,
        config: ConditionalStageConfig,
    ) -> Result<StageId, GraphDomainError> {
        self.push_stage(chain, name, StageKind::Conditional(config))
    }

    /// Adds a directed edge between two stages.
    ///
    /// # Errors
    ///
    /// Returns [`GraphDomainError::UnknownStage`] when either endpoint has
    /// not been added.
    pub fn edge(&mut self, from: StageId, to: StageId) -> Result<(), GraphDomainError> {
        for endpoint in [from, to] {
            if self.state.stage(endpoint).is_none() {
                return Err(GraphDomainError::UnknownStage(endpoint.to_string()));
            }
        }
        self.state.out_edges.entry(from).or_default().push(to);
        self.state.in_edges.entry(to).or_default().push(from);
        Ok(())
    }

    /// Finalises the graph into a repository.
    #[must_use]
    pub fn build(self) -> InMemoryGraphRepository {
        InMemoryGraphRepository {
            state: Arc::new(RwLock::new(self.state)),
        }
    }

    fn push_stage(
        &mut self,
        chain: ChainId,
        name: &str,
        kind: StageKind,
    ) -> Result<StageId, GraphDomainError> {
        let order = self.next_order.entry(chain).or_default();
        let stage = Stage::new(chain, name, *order, kind)?;
        *order += 1;
        let id = stage.id();
        self.state.stage_index.insert(id, self.state.stages.len());
        self.state.stages.push(stage);
        Ok(id)
    }
}
