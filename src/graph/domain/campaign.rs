//! Campaign and track containers for stage chains.

use super::{CampaignId, GraphDomainError, TrackId};
use serde::{Deserialize, Serialize};

/// Top-level workspace owning chains, tracks, and access policies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    id: CampaignId,
    name: String,
    default_track: TrackId,
    open: bool,
    is_error_campaign: bool,
}

impl Campaign {
    /// Creates a campaign with a validated name.
    ///
    /// # Errors
    ///
    /// Returns [`GraphDomainError::EmptyName`] when the name is blank after
    /// trimming.
    pub fn new(name: impl Into<String>, default_track: TrackId) -> Result<Self, GraphDomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(GraphDomainError::EmptyName("campaign"));
        }
        Ok(Self {
            id: CampaignId::new(),
            name,
            default_track,
            open: false,
            is_error_campaign: false,
        })
    }

    /// Marks the campaign as open for self-service joining.
    #[must_use]
    pub const fn with_open(mut self, open: bool) -> Self {
        self.open = open;
        self
    }

    /// Marks the campaign as the reserved internal error campaign.
    ///
    /// Fault items recorded during routing land under this campaign.
    #[must_use]
    pub const fn with_error_campaign(mut self, is_error_campaign: bool) -> Self {
        self.is_error_campaign = is_error_campaign;
        self
    }

    /// Returns the campaign identifier.
    #[must_use]
    pub const fn id(&self) -> CampaignId {
        self.id
    }

    /// Returns the campaign name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the default track users join through.
    #[must_use]
    pub const fn default_track(&self) -> TrackId {
        self.default_track
    }

    /// Returns whether users may join without an invitation.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open
    }

    /// Returns whether this is the reserved internal error campaign.
    #[must_use]
    pub const fn is_error_campaign(&self) -> bool {
        self.is_error_campaign
    }
}

/// Rank grouping within a campaign.
///
/// Users hold ranks on tracks; holding any rank on a campaign track makes
/// the user a member of that campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    id: TrackId,
    campaign: CampaignId,
    name: String,
}

impl Track {
    /// Creates a track with a preallocated identifier.
    ///
    /// The identifier is allocated up front so the owning campaign can
    /// reference its default track before the track row exists.
    #[must_use]
    pub fn new(id: TrackId, campaign: CampaignId, name: impl Into<String>) -> Self {
        Self {
            id,
            campaign,
            name: name.into(),
        }
    }

    /// Returns the track identifier.
    #[must_use]
    pub const fn id(&self) -> TrackId {
        self.id
    }

    /// Returns the owning campaign.
    #[must_use]
    pub const fn campaign(&self) -> CampaignId {
        self.campaign
    }

    /// Returns the track name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}
