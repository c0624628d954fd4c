//! Repository port for translate keys and translations.

use crate::graph::domain::CampaignId;
use crate::translation::domain::{TranslateKey, TranslateKeyId, Translation};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for translation repository operations.
pub type TranslationRepositoryResult<T> = Result<T, TranslationRepositoryError>;

/// Translation persistence contract.
///
/// Keys are unique per `(campaign, hash)`; translations are unique per
/// `(key, language)` with last-writer-wins upserts.
#[async_trait]
pub trait TranslationRepository: Send + Sync {
    /// Stores a key unless its `(campaign, hash)` pair already exists.
    ///
    /// Returns whether the key was inserted by this call.
    async fn store_key(&self, key: &TranslateKey) -> TranslationRepositoryResult<bool>;

    /// Finds a key by campaign and content hash.
    async fn find_key(
        &self,
        campaign: CampaignId,
        hash: &str,
    ) -> TranslationRepositoryResult<Option<TranslateKey>>;

    /// Lists a campaign's keys in harvesting order.
    async fn keys_for_campaign(
        &self,
        campaign: CampaignId,
    ) -> TranslationRepositoryResult<Vec<TranslateKey>>;

    /// Lists a campaign's keys that have no translation in a language,
    /// in harvesting order.
    async fn untranslated_keys(
        &self,
        campaign: CampaignId,
        language: &str,
    ) -> TranslationRepositoryResult<Vec<TranslateKey>>;

    /// Stores a translation, replacing an earlier one for the same
    /// `(key, language)`.
    async fn store_translation(
        &self,
        translation: &Translation,
    ) -> TranslationRepositoryResult<()>;

    /// Finds a key's translation in a language.
    async fn translation(
        &self,
        key: TranslateKeyId,
        language: &str,
    ) -> TranslationRepositoryResult<Option<Translation>>;
}

/// Errors returned by translation repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TranslationRepositoryError {
    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TranslationRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
