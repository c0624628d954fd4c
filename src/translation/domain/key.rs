//! Content-addressed translation keys.

use crate::graph::domain::{CampaignId, StageId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a translate key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TranslateKeyId(Uuid);

impl TranslateKeyId {
    /// Creates a new random translate-key identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a translate-key identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for TranslateKeyId {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<Uuid> for TranslateKeyId {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for TranslateKeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Returns the lowercase hex SHA-256 digest of a text.
#[must_use]
pub fn content_hash(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    digest.iter().map(|byte| format!("{byte:02x}")).collect()
}

/// One harvested schema title, addressed by its content hash within a
/// campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslateKey {
    id: TranslateKeyId,
    campaign: CampaignId,
    origin_stage: StageId,
    text: String,
    hash: String,
    created_at: DateTime<Utc>,
}

impl TranslateKey {
    /// Creates a key for a harvested title.
    pub fn new(
        campaign: CampaignId,
        origin_stage: StageId,
        text: impl Into<String>,
        clock: &impl Clock,
    ) -> Self {
        let text = text.into();
        let hash = content_hash(&text);
        Self {
            id: TranslateKeyId::new(),
            campaign,
            origin_stage,
            text,
            hash,
            created_at: clock.utc(),
        }
    }

    /// Returns the key identifier.
    #[must_use]
    pub const fn id(&self) -> TranslateKeyId {
        self.id
    }

    /// Returns the owning campaign.
    #[must_use]
    pub const fn campaign(&self) -> CampaignId {
        self.campaign
    }

    /// Returns the stage whose schema the title came from.
    #[must_use]
    pub const fn origin_stage(&self) -> StageId {
        self.origin_stage
    }

    /// Returns the source-language text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the content hash.
    #[must_use]
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Returns the harvesting instant.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
