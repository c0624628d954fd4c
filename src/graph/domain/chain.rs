//! Chains: ordered collections of stages within a campaign.

use super::{CampaignId, ChainId, GraphDomainError};
use serde::{Deserialize, Serialize};

/// An ordered collection of stages inside a campaign.
///
/// Chains carry no edges themselves; the stage adjacency lives on the
/// stages. `is_individual` switches the chain to per-user completion
/// semantics: each user works the chain in isolation and the roll-up
/// queries report per-user progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chain {
    id: ChainId,
    campaign: CampaignId,
    name: String,
    is_individual: bool,
}

impl Chain {
    /// Creates a chain with a validated name.
    ///
    /// # Errors
    ///
    /// Returns [`GraphDomainError::EmptyName`] when the name is blank after
    /// trimming.
    pub fn new(campaign: CampaignId, name: impl Into<String>) -> Result<Self, GraphDomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(GraphDomainError::EmptyName("chain"));
        }
        Ok(Self {
            id: ChainId::new(),
            campaign,
            name,
            is_individual: false,
        })
    }

    /// Switches the chain to per-user completion semantics.
    #[must_use]
    pub const fn with_individual(mut self, is_individual: bool) -> Self {
        self.is_individual = is_individual;
        self
    }

    /// Returns the chain identifier.
    #[must_use]
    pub const fn id(&self) -> ChainId {
        self.id
    }

    /// Returns the owning campaign.
    #[must_use]
    pub const fn campaign(&self) -> CampaignId {
        self.campaign
    }

    /// Returns the chain name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether the chain completes per user.
    #[must_use]
    pub const fn is_individual(&self) -> bool {
        self.is_individual
    }
}
