//! In-memory fault repository.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::fault::{
    domain::ErrorItem,
    ports::{FaultRepository, FaultRepositoryError, FaultRepositoryResult},
};
use crate::graph::domain::CampaignId;

/// Thread-safe in-memory fault repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFaultRepository {
    state: Arc<RwLock<Vec<ErrorItem>>>,
}

impl InMemoryFaultRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_poisoned(err: impl std::fmt::Display) -> FaultRepositoryError {
    FaultRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl FaultRepository for InMemoryFaultRepository {
    async fn append(&self, item: &ErrorItem) -> FaultRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_poisoned)?;
        state.push(item.clone());
        Ok(())
    }

    async fn faults_for_campaign(
        &self,
        campaign: CampaignId,
    ) -> FaultRepositoryResult<Vec<ErrorItem>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state
            .iter()
            .filter(|item| item.campaign() == campaign)
            .cloned()
            .collect())
    }
}
