//! Title harvesting, translator fan-out, and schema rewriting.

use crate::graph::domain::{CampaignId, StageId};
use crate::task::{
    domain::{CaseId, Task},
    ports::{TaskRepository, TaskRepositoryError},
};
use crate::translation::{
    domain::{TranslateKey, TranslationAdapter, Translation},
    ports::{TranslationRepository, TranslationRepositoryError},
};
use mockable::Clock;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Internal-metadata key carrying a translator task's target language.
const LANGUAGE_META: &str = "translation_language";
/// Internal-metadata key carrying a translator task's campaign.
const CAMPAIGN_META: &str = "translation_campaign";

/// Service-level errors for translation orchestration.
#[derive(Debug, Error)]
pub enum TranslationServiceError {
    /// Translation repository operation failed.
    #[error(transparent)]
    Repository(#[from] TranslationRepositoryError),
    /// Task repository operation failed.
    #[error(transparent)]
    Task(#[from] TaskRepositoryError),
}

/// Result type for translation orchestration.
pub type TranslationServiceResult<T> = Result<T, TranslationServiceError>;

/// Harvests schema titles, fans out translator tasks, and rewrites
/// schemas per language.
#[derive(Clone)]
pub struct TranslationService<R, T, C>
where
    R: TranslationRepository,
    T: TaskRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    tasks: Arc<T>,
    clock: Arc<C>,
}

impl<R, T, C> TranslationService<R, T, C>
where
    R: TranslationRepository,
    T: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates a translation service.
    #[must_use]
    pub const fn new(repository: Arc<R>, tasks: Arc<T>, clock: Arc<C>) -> Self {
        Self {
            repository,
            tasks,
            clock,
        }
    }

    /// Harvests the `title` strings of a stage schema into keys.
    ///
    /// Returns the keys inserted by this call; titles already harvested
    /// for the campaign are skipped through the `(campaign, hash)`
    /// uniqueness of the repository.
    ///
    /// # Errors
    ///
    /// Returns [`TranslationServiceError::Repository`] when persistence
    /// fails.
    pub async fn harvest(
        &self,
        campaign: CampaignId,
        origin_stage: StageId,
        schema: &Value,
    ) -> TranslationServiceResult<Vec<TranslateKey>> {
        let mut titles = Vec::new();
        collect_titles(schema, &mut titles);
        let mut created = Vec::new();
        for title in titles {
            let key = TranslateKey::new(campaign, origin_stage, title, &*self.clock);
            if self.repository.store_key(&key).await? {
                created.push(key);
            }
        }
        Ok(created)
    }

    /// Creates translator tasks for every untranslated key batch.
    ///
    /// One task is created per (target language, origin stage) batch;
    /// its schema override enumerates the batch keyed by content hash,
    /// and its internal metadata records the language and campaign for
    /// [`Self::store_translations`].
    ///
    /// # Errors
    ///
    /// Returns [`TranslationServiceError`] when a lookup or the task
    /// store fails.
    pub async fn spawn_translator_tasks(
        &self,
        adapter: &TranslationAdapter,
        campaign: CampaignId,
        case: CaseId,
    ) -> TranslationServiceResult<Vec<Task>> {
        let mut spawned = Vec::new();
        for language in &adapter.target_languages {
            let keys = self.repository.untranslated_keys(campaign, language).await?;
            for (origin, batch) in batch_by_origin(&keys) {
                let schema = translator_schema(&batch, &adapter.source_language, language);
                let mut task = Task::new(adapter.translator_stage, case, &*self.clock);
                task.set_schema_override(schema, &*self.clock);
                let mut meta = Map::new();
                meta.insert(LANGUAGE_META.to_owned(), json!(language));
                meta.insert(CAMPAIGN_META.to_owned(), json!(campaign.to_string()));
                meta.insert("translation_origin_stage".to_owned(), json!(origin.to_string()));
                task.merge_internal_metadata(meta, &*self.clock);
                self.tasks.store(&task).await?;
                tracing::debug!(task = %task.id(), %language, "translator task spawned");
                spawned.push(task);
            }
        }
        Ok(spawned)
    }

    /// Returns whether the task was spawned by the translator fan-out.
    #[must_use]
    pub fn is_translator_task(&self, task: &Task) -> bool {
        translator_metadata(task).is_some()
    }

    /// Stores the translations entered on a completed translator task.
    ///
    /// Response keys are content hashes; string values become
    /// translations. Tasks without translator metadata store nothing.
    ///
    /// # Errors
    ///
    /// Returns [`TranslationServiceError::Repository`] when persistence
    /// fails.
    pub async fn store_translations(&self, task: &Task) -> TranslationServiceResult<usize> {
        let Some((campaign, language)) = translator_metadata(task) else {
            tracing::warn!(task = %task.id(), "task carries no translator metadata");
            return Ok(0);
        };
        let mut stored = 0_usize;
        for (hash, value) in task.responses_or_empty() {
            let Some(text) = value.as_str() else {
                continue;
            };
            if text.trim().is_empty() {
                continue;
            }
            if let Some(key) = self.repository.find_key(campaign, &hash).await? {
                let translation = Translation::new(key.id(), &language, text, &*self.clock);
                self.repository.store_translation(&translation).await?;
                stored += 1;
            }
        }
        Ok(stored)
    }

    /// Returns the schema with every translated title rewritten into
    /// the requested language. Untranslated titles stay in the source
    /// language.
    ///
    /// # Errors
    ///
    /// Returns [`TranslationServiceError::Repository`] when a lookup
    /// fails.
    pub async fn rewrite_schema(
        &self,
        schema: &Value,
        campaign: CampaignId,
        language: &str,
    ) -> TranslationServiceResult<Value> {
        let mut replacements = BTreeMap::new();
        for key in self.repository.keys_for_campaign(campaign).await? {
            if let Some(translation) = self.repository.translation(key.id(), language).await? {
                replacements.insert(key.text().to_owned(), translation.text().to_owned());
            }
        }
        let mut rewritten = schema.clone();
        rewrite_titles(&mut rewritten, &replacements);
        Ok(rewritten)
    }
}

fn translator_metadata(task: &Task) -> Option<(CampaignId, String)> {
    let meta = task.internal_metadata()?;
    let language = meta.get(LANGUAGE_META)?.as_str()?.to_owned();
    let campaign = meta
        .get(CAMPAIGN_META)?
        .as_str()
        .and_then(|raw| Uuid::parse_str(raw).ok())
        .map(CampaignId::from_uuid)?;
    Some((campaign, language))
}

/// Groups keys by origin stage, preserving first-seen stage order.
fn batch_by_origin(keys: &[TranslateKey]) -> Vec<(StageId, Vec<TranslateKey>)> {
    let mut batches: Vec<(StageId, Vec<TranslateKey>)> = Vec::new();
    for key in keys {
        match batches
            .iter_mut()
            .find(|(origin, _)| *origin == key.origin_stage())
        {
            Some((_, batch)) => batch.push(key.clone()),
            None => batches.push((key.origin_stage(), vec![key.clone()])),
        }
    }
    batches
}

fn translator_schema(keys: &[TranslateKey], source: &str, target: &str) -> Value {
    let mut properties = Map::new();
    for key in keys {
        properties.insert(
            key.hash().to_owned(),
            json!({"type": "string", "title": key.text()}),
        );
    }
    json!({
        "type": "object",
        "title": format!("{source} -> {target}"),
        "properties": properties
    })
}

fn collect_titles(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            if let Some(title) = map.get("title").and_then(Value::as_str)
                && !title.trim().is_empty()
                && !out.iter().any(|seen| seen == title)
            {
                out.push(title.to_owned());
            }
            for nested in map.values() {
                collect_titles(nested, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_titles(item, out);
            }
        }
        _ => {}
    }
}

fn rewrite_titles(value: &mut Value, replacements: &BTreeMap<String, String>) {
    match value {
        Value::Object(map) => {
            if let Some(slot) = map.get_mut("title")
                && let Some(current) = slot.as_str()
                && let Some(translated) = replacements.get(current)
            {
                *slot = Value::String(translated.clone());
            }
            for nested in map.values_mut() {
                rewrite_titles(nested, replacements);
            }
        }
        Value::Array(items) => {
            for item in items {
                rewrite_titles(item, replacements);
            }
        }
        _ => {}
    }
}
