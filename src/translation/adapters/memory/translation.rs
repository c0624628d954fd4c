//! In-memory translation repository.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use crate::graph::domain::CampaignId;
use crate::translation::{
    domain::{TranslateKey, TranslateKeyId, Translation},
    ports::{TranslationRepository, TranslationRepositoryError, TranslationRepositoryResult},
};

#[derive(Debug, Default)]
struct InMemoryTranslationState {
    keys: Vec<TranslateKey>,
    key_index: HashSet<(CampaignId, String)>,
    translations: Vec<Translation>,
}

/// Thread-safe in-memory translation repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTranslationRepository {
    state: Arc<RwLock<InMemoryTranslationState>>,
}

impl InMemoryTranslationRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_poisoned(err: impl std::fmt::Display) -> TranslationRepositoryError {
    TranslationRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl TranslationRepository for InMemoryTranslationRepository {
    async fn store_key(&self, key: &TranslateKey) -> TranslationRepositoryResult<bool> {
        let mut state = self.state.write().map_err(lock_poisoned)?;
        if !state
            .key_index
            .insert((key.campaign(), key.hash().to_owned()))
        {
            return Ok(false);
        }
        state.keys.push(key.clone());
        Ok(true)
    }

    async fn find_key(
        &self,
        campaign: CampaignId,
        hash: &str,
    ) -> TranslationRepositoryResult<Option<TranslateKey>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state
            .keys
            .iter()
            .find(|key| key.campaign() == campaign && key.hash() == hash)
            .cloned())
    }

    async fn keys_for_campaign(
        &self,
        campaign: CampaignId,
    ) -> TranslationRepositoryResult<Vec<TranslateKey>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state
            .keys
            .iter()
            .filter(|key| key.campaign() == campaign)
            .cloned()
            .collect())
    }

    async fn untranslated_keys(
        &self,
        campaign: CampaignId,
        language: &str,
    ) -> TranslationRepositoryResult<Vec<TranslateKey>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        let translated: HashSet<TranslateKeyId> = state
            .translations
            .iter()
            .filter(|translation| translation.language() == language)
            .map(Translation::key)
            .collect();
        Ok(state
            .keys
            .iter()
            .filter(|key| key.campaign() == campaign && !translated.contains(&key.id()))
            .cloned()
            .collect())
    }

    async fn store_translation(
        &self,
        translation: &Translation,
    ) -> TranslationRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_poisoned)?;
        state.translations.retain(|existing| {
            existing.key() != translation.key() || existing.language() != translation.language()
        });
        state.translations.push(translation.clone());
        Ok(())
    }

    async fn translation(
        &self,
        key: TranslateKeyId,
        language: &str,
    ) -> TranslationRepositoryResult<Option<Translation>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state
            .translations
            .iter()
            .find(|translation| translation.key() == key && translation.language() == language)
            .cloned())
    }
}
