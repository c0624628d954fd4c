//! Campaign membership, stage visibility, and individual-chain roll-ups.

use crate::graph::domain::{Campaign, CampaignId, Chain, StageId};
use crate::graph::ports::GraphRepository;
use crate::rank::{
    domain::{Rank, RankId},
    ports::RankRepository,
    services::RankGrantService,
};
use crate::routing::error::{EngineError, EngineResult};
use crate::task::{
    domain::{Task, UserId},
    ports::TaskRepository,
};
use mockable::Clock;
use std::collections::HashSet;
use std::sync::Arc;

/// A user's progress through an individual chain.
#[derive(Debug, Clone)]
pub struct IndividualChainView {
    /// The chain itself.
    pub chain: Chain,
    /// The user's tasks at the chain's stages, in stage order.
    pub tasks: Vec<Task>,
    /// Whether the user finished the chain.
    pub complete: bool,
}

/// Campaign- and rank-facing operations of the query surface.
#[derive(Clone)]
pub struct CampaignGateway<G, R, T, C>
where
    G: GraphRepository,
    R: RankRepository,
    T: TaskRepository,
    C: Clock + Send + Sync,
{
    graph: Arc<G>,
    ranks: Arc<R>,
    tasks: Arc<T>,
    grants: RankGrantService<R, C>,
}

impl<G, R, T, C> CampaignGateway<G, R, T, C>
where
    G: GraphRepository,
    R: RankRepository,
    T: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates a campaign gateway.
    #[must_use]
    pub const fn new(
        graph: Arc<G>,
        ranks: Arc<R>,
        tasks: Arc<T>,
        grants: RankGrantService<R, C>,
    ) -> Self {
        Self {
            graph,
            ranks,
            tasks,
            grants,
        }
    }

    /// Lists the campaigns the user is a member of.
    ///
    /// Membership means holding a rank on one of the campaign's tracks.
    ///
    /// # Errors
    ///
    /// Returns repository errors transparently.
    pub async fn list_user_campaigns(&self, user: UserId) -> EngineResult<Vec<Campaign>> {
        let held_tracks: HashSet<_> = self
            .ranks
            .ranks_of_user(user)
            .await?
            .iter()
            .map(Rank::track)
            .collect();
        let mut joined = Vec::new();
        for campaign in self.graph.campaigns().await? {
            let tracks = self.graph.tracks_in_campaign(campaign.id()).await?;
            if tracks.iter().any(|track| held_tracks.contains(&track.id())) {
                joined.push(campaign);
            }
        }
        Ok(joined)
    }

    /// Lists the open campaigns a user may join directly.
    ///
    /// # Errors
    ///
    /// Returns repository errors transparently.
    pub async fn open_campaigns(&self) -> EngineResult<Vec<Campaign>> {
        let campaigns = self.graph.campaigns().await?;
        Ok(campaigns
            .into_iter()
            .filter(Campaign::is_open)
            .collect())
    }

    /// Joins a user to an open campaign by granting the base rank of
    /// its default track.
    ///
    /// The base rank is the lowest-priority rank on the default track.
    /// Returns the ranks granted by the join; an empty vector means the
    /// user was already a member.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] for unknown campaigns,
    /// [`EngineError::PermissionDenied`] for closed ones, and
    /// [`EngineError::DependencyMissing`] when the default track
    /// carries no rank.
    pub async fn join_campaign(
        &self,
        user: UserId,
        campaign_id: CampaignId,
    ) -> EngineResult<Vec<RankId>> {
        let campaign = self
            .graph
            .campaign(campaign_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("campaign {campaign_id}")))?;
        if !campaign.is_open() {
            return Err(EngineError::PermissionDenied(format!(
                "campaign {campaign_id} is not open for joining"
            )));
        }
        let base = self
            .ranks
            .ranks()
            .await?
            .into_iter()
            .filter(|rank| rank.track() == campaign.default_track())
            .min_by_key(Rank::priority)
            .ok_or_else(|| {
                EngineError::DependencyMissing(format!(
                    "campaign {campaign_id} has no rank on its default track"
                ))
            })?;
        let granted = self.grants.grant(user, base.id()).await?;
        if !granted.is_empty() {
            tracing::info!(%user, campaign = %campaign_id, "user joined campaign");
        }
        Ok(granted)
    }

    /// Lists the stages whose tasks the user may see in listings.
    ///
    /// With `by_highest_ranks` only the user's highest-priority rank per
    /// track contributes stages.
    ///
    /// # Errors
    ///
    /// Returns repository errors transparently.
    pub async fn list_visible_stages(
        &self,
        user: UserId,
        by_highest_ranks: bool,
    ) -> EngineResult<Vec<StageId>> {
        let held = self.ranks.ranks_of_user(user).await?;
        let kept: Vec<&Rank> = if by_highest_ranks {
            held.iter()
                .filter(|rank| {
                    held.iter()
                        .filter(|other| other.track() == rank.track())
                        .all(|other| other.priority() <= rank.priority())
                })
                .collect()
        } else {
            held.iter().collect()
        };

        let mut visible = Vec::new();
        for rank in kept {
            for limit in self.ranks.limits_for_rank(rank.id()).await? {
                if limit.is_listing_open && !visible.contains(&limit.stage) {
                    visible.push(limit.stage);
                }
            }
        }
        Ok(visible)
    }

    /// Rolls up the user's progress through individual chains.
    ///
    /// `completed` filters the result: `Some(true)` keeps finished
    /// chains, `Some(false)` unfinished ones.
    ///
    /// # Errors
    ///
    /// Returns repository errors transparently.
    pub async fn individual_chains(
        &self,
        user: UserId,
        completed: Option<bool>,
    ) -> EngineResult<Vec<IndividualChainView>> {
        let mine = self.tasks.tasks_by_assignee(user).await?;
        let mut views = Vec::new();
        for campaign in self.graph.campaigns().await? {
            for chain in self.graph.chains_in_campaign(campaign.id()).await? {
                if !chain.is_individual() {
                    continue;
                }
                let view = self.chain_view(chain, &mine).await?;
                if completed.is_none_or(|wanted| view.complete == wanted) {
                    views.push(view);
                }
            }
        }
        Ok(views)
    }

    async fn chain_view(&self, chain: Chain, mine: &[Task]) -> EngineResult<IndividualChainView> {
        let stages = self.graph.stages_in_chain(chain.id()).await?;
        let mut tasks = Vec::new();
        let mut finished = false;
        let mut task_stage_count = 0_usize;
        let mut stages_done = 0_usize;
        for stage in &stages {
            let Some(config) = stage.task_config() else {
                continue;
            };
            task_stage_count += 1;
            let mut at_stage: Vec<&Task> = mine
                .iter()
                .filter(|task| task.stage() == stage.id())
                .collect();
            if config.skip_empty_individual_tasks {
                at_stage.retain(|task| {
                    task.responses().is_some_and(|responses| !responses.is_empty())
                });
            }
            if at_stage.iter().any(|task| task.is_complete()) {
                stages_done += 1;
                if config.complete_individual_chain {
                    finished = true;
                }
            }
            tasks.extend(at_stage.into_iter().cloned());
        }
        let complete =
            finished || (task_stage_count > 0 && stages_done == task_stage_count);
        Ok(IndividualChainView {
            chain,
            tasks,
            complete,
        })
    }
}
