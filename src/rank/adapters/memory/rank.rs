//! In-memory rank repository and user directory.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::graph::domain::StageId;
use crate::rank::{
    domain::{Rank, RankId, RankLimit, RankRecord, TaskAward},
    ports::{RankRepository, RankRepositoryError, RankRepositoryResult, UserDirectory},
};
use crate::task::domain::UserId;

#[derive(Debug, Default)]
struct InMemoryRankState {
    ranks: Vec<Rank>,
    limits: Vec<RankLimit>,
    awards: Vec<TaskAward>,
    records: Vec<RankRecord>,
    membership: HashSet<(UserId, RankId)>,
}

/// Thread-safe in-memory rank repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRankRepository {
    state: Arc<RwLock<InMemoryRankState>>,
}

impl InMemoryRankRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_poisoned(err: impl std::fmt::Display) -> RankRepositoryError {
    RankRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl RankRepository for InMemoryRankRepository {
    async fn store_rank(&self, rank: &Rank) -> RankRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_poisoned)?;
        state.ranks.push(rank.clone());
        Ok(())
    }

    async fn store_limit(&self, limit: &RankLimit) -> RankRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_poisoned)?;
        state.limits.push(limit.clone());
        Ok(())
    }

    async fn store_award(&self, award: &TaskAward) -> RankRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_poisoned)?;
        state.awards.push(award.clone());
        Ok(())
    }

    async fn rank(&self, id: RankId) -> RankRepositoryResult<Option<Rank>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state.ranks.iter().find(|rank| rank.id() == id).cloned())
    }

    async fn ranks(&self) -> RankRepositoryResult<Vec<Rank>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state.ranks.clone())
    }

    async fn ranks_of_user(&self, user: UserId) -> RankRepositoryResult<Vec<Rank>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state
            .ranks
            .iter()
            .filter(|rank| state.membership.contains(&(user, rank.id())))
            .cloned()
            .collect())
    }

    async fn has_rank(&self, user: UserId, rank: RankId) -> RankRepositoryResult<bool> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state.membership.contains(&(user, rank)))
    }

    async fn holders_of_rank(&self, rank: RankId) -> RankRepositoryResult<Vec<UserId>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state
            .records
            .iter()
            .filter(|record| record.rank() == rank)
            .map(RankRecord::user)
            .collect())
    }

    async fn grant(&self, record: RankRecord) -> RankRepositoryResult<bool> {
        let mut state = self.state.write().map_err(lock_poisoned)?;
        // Uniqueness per (user, rank) mirrors the relational constraint.
        if !state.membership.insert((record.user(), record.rank())) {
            return Ok(false);
        }
        state.records.push(record);
        Ok(true)
    }

    async fn limits_for_stage(&self, stage: StageId) -> RankRepositoryResult<Vec<RankLimit>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state
            .limits
            .iter()
            .filter(|limit| limit.stage == stage)
            .cloned()
            .collect())
    }

    async fn limits_for_rank(&self, rank: RankId) -> RankRepositoryResult<Vec<RankLimit>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state
            .limits
            .iter()
            .filter(|limit| limit.rank == rank)
            .cloned()
            .collect())
    }

    async fn awards_for_verified_stage(
        &self,
        stage: StageId,
    ) -> RankRepositoryResult<Vec<TaskAward>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state
            .awards
            .iter()
            .filter(|award| award.verified_stage == stage)
            .cloned()
            .collect())
    }
}

/// In-memory user directory keyed by handle text.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserDirectory {
    handles: Arc<RwLock<HashMap<String, UserId>>>,
}

impl InMemoryUserDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handle (email or identifier text) for a user.
    ///
    /// # Errors
    ///
    /// Returns a persistence error when the directory lock is poisoned.
    pub fn register(&self, handle: impl Into<String>, user: UserId) -> RankRepositoryResult<()> {
        let mut handles = self.handles.write().map_err(lock_poisoned)?;
        handles.insert(handle.into(), user);
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn resolve(&self, handle: &str) -> RankRepositoryResult<Option<UserId>> {
        let handles = self.handles.read().map_err(lock_poisoned)?;
        Ok(handles.get(handle).copied())
    }
}
